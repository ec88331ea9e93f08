//! The verification pipeline state machine.
//!
//! One run walks a module from materialization to a terminal outcome:
//!
//! ```text
//! materialize binary -> print-build-info -> parse 4-line provenance
//!   -> fetch source archive -> unpack (single top-level dir)
//!   -> verify-build -> classify final diagnostic line
//! ```
//!
//! Every failure along the way is converted into a `verified_failed` terminal
//! result with an explanation. Each terminal writes exactly one result
//! through the store adapter and sends exactly one notification. The only
//! error a run can surface is the store precondition violation (attaching a
//! verification to a module that was never observed).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use modver_chain::{ChainClient, ChainError, InvocationRunner};
use modver_notify::Notifier;
use modver_store::{ModuleStoreAdapter, StoreError};
use modver_types::{BuildProvenance, Network, VerificationResult};
use tracing::{info, warn};

use crate::archive::{fetch_archive, source_snapshot, unpack_archive};
use crate::build_info::{final_diagnostic_line, parse_build_info, parse_verify_output, BuildInfoError};
use crate::toolchain::BuildToolchain;

/// Materializes a module's binary into a local directory, removing any stale
/// artifact for the same module_ref first.
#[async_trait]
pub trait ModuleMaterializer: Send + Sync {
    async fn materialize_module(
        &self,
        network: Network,
        module_ref: &str,
        dir: &Path,
    ) -> Result<PathBuf, ChainError>;
}

#[async_trait]
impl<R: InvocationRunner> ModuleMaterializer for ChainClient<R> {
    async fn materialize_module(
        &self,
        network: Network,
        module_ref: &str,
        dir: &Path,
    ) -> Result<PathBuf, ChainError> {
        ChainClient::materialize_module(self, network, module_ref, dir).await
    }
}

/// Filesystem layout for pipeline runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root under which module binaries and extracted sources are staged.
    pub workdir_root: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workdir_root: PathBuf::from("tmp"),
        }
    }
}

impl PipelineConfig {
    fn artifact_dir(&self) -> PathBuf {
        self.workdir_root.join("artifacts")
    }

    /// Working directory for a module's extracted source. Scoped per
    /// module_ref so runs for different modules never share a tree.
    fn source_dir(&self, module_ref: &str) -> PathBuf {
        self.workdir_root.join("sources").join(module_ref)
    }
}

/// Drives verification runs to a terminal, persisted outcome.
pub struct VerificationPipeline {
    materializer: Arc<dyn ModuleMaterializer>,
    toolchain: Arc<dyn BuildToolchain>,
    store: ModuleStoreAdapter,
    notifier: Arc<dyn Notifier>,
    http: reqwest::Client,
    config: PipelineConfig,
}

impl VerificationPipeline {
    pub fn new(
        materializer: Arc<dyn ModuleMaterializer>,
        toolchain: Arc<dyn BuildToolchain>,
        store: ModuleStoreAdapter,
        notifier: Arc<dyn Notifier>,
        http: reqwest::Client,
        config: PipelineConfig,
    ) -> Self {
        Self {
            materializer,
            toolchain,
            store,
            notifier,
            http,
            config,
        }
    }

    /// Run the full pipeline for one module and persist the outcome.
    ///
    /// Always restarts from the beginning; no state is carried across runs.
    pub async fn verify_module(
        &self,
        network: Network,
        module_ref: &str,
    ) -> Result<VerificationResult, StoreError> {
        info!(%network, module_ref, "starting verification run");
        let result = self.run_to_terminal(network, module_ref).await;

        self.store
            .attach_verification(network, module_ref, result.clone())
            .await?;
        self.notifier
            .notify(&format!(
                "{network}: Module {module_ref} verification: {}",
                result.explanation
            ))
            .await;

        info!(%network, module_ref, status = ?result.status, verified = result.verified,
            "verification run finished");
        Ok(result)
    }

    /// The state machine proper. Infallible by construction: every failure
    /// is classified into a terminal result here.
    async fn run_to_terminal(&self, network: Network, module_ref: &str) -> VerificationResult {
        let none = BuildProvenance::default();

        let module_path = match self
            .materializer
            .materialize_module(network, module_ref, &self.config.artifact_dir())
            .await
        {
            Ok(path) => path,
            Err(err) => {
                warn!(%network, module_ref, %err, "module materialization failed");
                return VerificationResult::failed(
                    format!("Could not materialize module: {err}"),
                    none,
                );
            }
        };

        // verify-build runs with a different working directory, so the
        // module path it receives must be absolute.
        let module_path = match tokio::fs::canonicalize(&module_path).await {
            Ok(path) => path,
            Err(err) => {
                return VerificationResult::failed(
                    format!("Could not materialize module: {err}"),
                    none,
                )
            }
        };

        let diagnostics = match self.toolchain.print_build_info(&module_path).await {
            Ok(diagnostics) => diagnostics,
            Err(err) => {
                return VerificationResult::failed(
                    format!("Could not read build information: {err}"),
                    none,
                )
            }
        };

        let info = match parse_build_info(&diagnostics) {
            Ok(info) => info,
            Err(BuildInfoError::NoBuildInfo { .. }) => {
                return VerificationResult::failed("No embedded build information found", none)
            }
            Err(BuildInfoError::NoSourceLink { partial }) => {
                return VerificationResult::failed("No source code found.", partial)
            }
        };
        let provenance = info.provenance();

        let archive = match fetch_archive(&self.http, &info.link_to_source_code).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%network, module_ref, %err, "source archive fetch failed");
                return VerificationResult::failed(err.to_string(), provenance);
            }
        };

        let source_dir = match unpack_archive(&archive, &self.config.source_dir(module_ref)) {
            Ok(dir) => dir,
            Err(err) => return VerificationResult::failed(err.to_string(), provenance),
        };

        let run = match self.toolchain.verify_build(&module_path, &source_dir).await {
            Ok(run) => run,
            Err(err) => {
                return VerificationResult::failed(
                    format!("Could not run build verification: {err}"),
                    provenance,
                )
            }
        };
        if !run.succeeded {
            return VerificationResult::failed(
                "The source does not correspond to the module.",
                provenance,
            );
        }

        let last_line = final_diagnostic_line(&run.diagnostics);
        let verified = parse_verify_output(&run.diagnostics);
        let snapshot = source_snapshot(&source_dir);
        VerificationResult::completed(verified, last_line, provenance, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::targz;
    use crate::toolchain::{ToolchainError, VerifyRun};
    use modver_notify::MemoryNotifier;
    use modver_store::InMemoryModuleStore;
    use modver_types::{ModuleSummary, VerificationStatus};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    struct FakeMaterializer;

    #[async_trait]
    impl ModuleMaterializer for FakeMaterializer {
        async fn materialize_module(
            &self,
            _network: Network,
            module_ref: &str,
            dir: &Path,
        ) -> Result<PathBuf, ChainError> {
            tokio::fs::create_dir_all(dir).await?;
            let path = dir.join(format!("{module_ref}.out"));
            tokio::fs::write(&path, b"\0wasm-module").await?;
            Ok(path)
        }
    }

    struct FakeToolchain {
        build_info: String,
        verify: VerifyRun,
    }

    #[async_trait]
    impl BuildToolchain for FakeToolchain {
        async fn print_build_info(&self, _module_path: &Path) -> Result<String, ToolchainError> {
            Ok(self.build_info.clone())
        }

        async fn verify_build(
            &self,
            module_path: &Path,
            _source_dir: &Path,
        ) -> Result<VerifyRun, ToolchainError> {
            assert!(module_path.is_absolute());
            Ok(self.verify.clone())
        }
    }

    /// Serve `bytes` once over a local socket, returning the archive URL.
    async fn serve_archive(bytes: Vec<u8>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = sock.read(&mut buf).await;
                let header = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    bytes.len()
                );
                let _ = sock.write_all(header.as_bytes()).await;
                let _ = sock.write_all(&bytes).await;
                let _ = sock.shutdown().await;
            }
        });
        format!("http://{addr}/source.tar.gz")
    }

    fn build_info_with_link(link: &str) -> String {
        format!("docker.io/builder:1.0\ncargo build\n0011aabb\nsource code: {link}")
    }

    struct Harness {
        pipeline: VerificationPipeline,
        store: ModuleStoreAdapter,
        notifier: Arc<MemoryNotifier>,
        _workdir: tempfile::TempDir,
    }

    async fn harness(toolchain: FakeToolchain, seed_record: bool) -> Harness {
        let store = ModuleStoreAdapter::new(Arc::new(InMemoryModuleStore::new()));
        if seed_record {
            store
                .upsert_metadata(Network::Mainnet, ModuleSummary::empty("abc123"))
                .await
                .unwrap();
        }
        let notifier = Arc::new(MemoryNotifier::new());
        let workdir = tempfile::tempdir().unwrap();
        let pipeline = VerificationPipeline::new(
            Arc::new(FakeMaterializer),
            Arc::new(toolchain),
            store.clone(),
            notifier.clone(),
            reqwest::Client::new(),
            PipelineConfig {
                workdir_root: workdir.path().to_path_buf(),
            },
        );
        Harness {
            pipeline,
            store,
            notifier,
            _workdir: workdir,
        }
    }

    fn matching_verify() -> VerifyRun {
        VerifyRun {
            succeeded: true,
            diagnostics: "building...\nSource and module match.\n".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_rebuild_is_verified_success() {
        let archive = targz(&[("project/src/lib.rs", "pub fn init_counter() {}")]);
        let url = serve_archive(archive).await;
        let h = harness(
            FakeToolchain {
                build_info: build_info_with_link(&url),
                verify: matching_verify(),
            },
            true,
        )
        .await;

        let result = h
            .pipeline
            .verify_module(Network::Mainnet, "abc123")
            .await
            .unwrap();

        assert_eq!(result.status, VerificationStatus::VerifiedSuccess);
        assert!(result.verified);
        assert_eq!(result.explanation, "Source and module match.");
        assert_eq!(
            result.source_code_snapshot.as_deref(),
            Some("pub fn init_counter() {}")
        );
        assert_eq!(result.link_to_source_code.as_deref(), Some(url.as_str()));

        // Persisted and notified exactly once.
        let record = h.store.get(Network::Mainnet, "abc123").await.unwrap().unwrap();
        assert_eq!(record.verification.unwrap(), result);
        assert_eq!(h.notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn mismatching_final_line_completes_unverified() {
        let archive = targz(&[("project/src/lib.rs", "pub fn init() {}")]);
        let url = serve_archive(archive).await;
        let h = harness(
            FakeToolchain {
                build_info: build_info_with_link(&url),
                verify: VerifyRun {
                    succeeded: true,
                    diagnostics: "building...\nSource and module differ in 3 bytes.\n".into(),
                },
            },
            true,
        )
        .await;

        let result = h
            .pipeline
            .verify_module(Network::Mainnet, "abc123")
            .await
            .unwrap();
        assert_eq!(result.status, VerificationStatus::VerifiedSuccess);
        assert!(!result.verified);
        assert_eq!(result.explanation, "Source and module differ in 3 bytes.");
    }

    #[tokio::test]
    async fn short_build_info_means_no_embedded_metadata() {
        let h = harness(
            FakeToolchain {
                build_info: "no build info\n".to_string(),
                verify: matching_verify(),
            },
            true,
        )
        .await;

        let result = h
            .pipeline
            .verify_module(Network::Mainnet, "abc123")
            .await
            .unwrap();
        assert_eq!(result.status, VerificationStatus::VerifiedFailed);
        assert!(!result.verified);
        assert_eq!(result.explanation, "No embedded build information found");
        assert!(result.build_image_used.is_none());
    }

    #[tokio::test]
    async fn missing_source_marker_keeps_parsed_fields() {
        let h = harness(
            FakeToolchain {
                build_info: "image\ncommand\nhash\nfourth line without marker".to_string(),
                verify: matching_verify(),
            },
            true,
        )
        .await;

        let result = h
            .pipeline
            .verify_module(Network::Mainnet, "abc123")
            .await
            .unwrap();
        assert_eq!(result.explanation, "No source code found.");
        assert_eq!(result.build_image_used.as_deref(), Some("image"));
        assert!(result.link_to_source_code.is_none());
    }

    #[tokio::test]
    async fn unreachable_archive_fails_with_http_detail() {
        let h = harness(
            FakeToolchain {
                build_info: build_info_with_link("http://127.0.0.1:1/src.tar.gz"),
                verify: matching_verify(),
            },
            true,
        )
        .await;

        let result = h
            .pipeline
            .verify_module(Network::Mainnet, "abc123")
            .await
            .unwrap();
        assert_eq!(result.status, VerificationStatus::VerifiedFailed);
        assert!(result.explanation.contains("Fetching the source archive failed"));
        // Provenance parsed before the fetch is retained.
        assert_eq!(result.build_image_used.as_deref(), Some("docker.io/builder:1.0"));
        assert_eq!(
            result.link_to_source_code.as_deref(),
            Some("http://127.0.0.1:1/src.tar.gz")
        );
    }

    #[tokio::test]
    async fn bad_archive_layout_is_an_extraction_failure() {
        let archive = targz(&[("a/x.rs", "1"), ("b/y.rs", "2")]);
        let url = serve_archive(archive).await;
        let h = harness(
            FakeToolchain {
                build_info: build_info_with_link(&url),
                verify: matching_verify(),
            },
            true,
        )
        .await;

        let result = h
            .pipeline
            .verify_module(Network::Mainnet, "abc123")
            .await
            .unwrap();
        assert_eq!(result.status, VerificationStatus::VerifiedFailed);
        assert!(result
            .explanation
            .contains("exactly one top-level directory"));
    }

    #[tokio::test]
    async fn failing_verify_exit_means_source_mismatch() {
        let archive = targz(&[("project/src/lib.rs", "x")]);
        let url = serve_archive(archive).await;
        let h = harness(
            FakeToolchain {
                build_info: build_info_with_link(&url),
                verify: VerifyRun {
                    succeeded: false,
                    diagnostics: "error: rebuild differs".to_string(),
                },
            },
            true,
        )
        .await;

        let result = h
            .pipeline
            .verify_module(Network::Mainnet, "abc123")
            .await
            .unwrap();
        assert_eq!(
            result.explanation,
            "The source does not correspond to the module."
        );
        assert_eq!(result.archive_hash.as_deref(), Some("0011aabb"));
    }

    #[tokio::test]
    async fn unobserved_module_is_a_precondition_violation() {
        let h = harness(
            FakeToolchain {
                build_info: "no build info\n".to_string(),
                verify: matching_verify(),
            },
            false,
        )
        .await;

        let err = h
            .pipeline
            .verify_module(Network::Mainnet, "abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingRecord { .. }));
    }
}
