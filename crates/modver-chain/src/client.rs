//! Chain client: module materialization and module source fetch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use modver_types::Network;
use tracing::{debug, info};

use crate::error::ChainError;
use crate::requestor::FailoverRequestor;
use crate::runner::{InvocationRunner, ProcessRunner};

/// A module's on-chain source payload. Exactly one version field is
/// populated, hex-encoded.
#[derive(Debug, Clone, Default)]
pub struct ModuleSource {
    pub v0: Option<String>,
    pub v1: Option<String>,
}

impl ModuleSource {
    /// The populated payload, whichever version carries it.
    pub fn hex_payload(&self) -> Option<&str> {
        self.v0.as_deref().or(self.v1.as_deref())
    }

    /// Decode the populated payload to raw module bytes.
    pub fn to_bytes(&self) -> Result<Option<Vec<u8>>, hex::FromHexError> {
        match self.hex_payload() {
            Some(payload) => hex::decode(payload.trim()).map(Some),
            None => Ok(None),
        }
    }
}

/// Collaborator interface for fetching a module's binary source from the
/// chain at a logical block reference such as `last_final`.
#[async_trait]
pub trait ModuleSourceProvider: Send + Sync {
    async fn get_module_source(
        &self,
        module_ref: &str,
        block: &str,
        network: Network,
    ) -> Result<ModuleSource, ChainError>;
}

/// High-level chain operations on top of the failover requestor.
pub struct ChainClient<R = ProcessRunner> {
    requestor: FailoverRequestor<R>,
}

impl<R: InvocationRunner> ChainClient<R> {
    pub fn new(requestor: FailoverRequestor<R>) -> Self {
        Self { requestor }
    }

    pub fn requestor(&self) -> &FailoverRequestor<R> {
        &self.requestor
    }

    /// Write the module's binary to `dir/<module_ref>.out`.
    ///
    /// Any artifact left over from a previous run for the same module_ref is
    /// removed first, so downstream tooling never reads a stale file.
    pub async fn materialize_module(
        &self,
        network: Network,
        module_ref: &str,
        dir: &Path,
    ) -> Result<PathBuf, ChainError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{module_ref}.out"));
        if tokio::fs::try_exists(&path).await? {
            debug!(?path, "removing stale module artifact");
            tokio::fs::remove_file(&path).await?;
        }

        self.requestor
            .execute(
                network,
                &[
                    "module".to_string(),
                    "show".to_string(),
                    module_ref.to_string(),
                    "--out".to_string(),
                    path.to_string_lossy().into_owned(),
                ],
            )
            .await?;

        info!(%network, module_ref, ?path, "module binary materialized");
        Ok(path)
    }
}

#[async_trait]
impl<R: InvocationRunner> ModuleSourceProvider for ChainClient<R> {
    async fn get_module_source(
        &self,
        module_ref: &str,
        block: &str,
        network: Network,
    ) -> Result<ModuleSource, ChainError> {
        let output = self
            .requestor
            .execute(
                network,
                &[
                    "raw".to_string(),
                    "GetModuleSource".to_string(),
                    module_ref.to_string(),
                    "--block".to_string(),
                    block.to_string(),
                ],
            )
            .await?;

        let payload = output.stdout.trim().to_string();
        if payload.is_empty() {
            return Err(ChainError::MissingSource {
                module_ref: module_ref.to_string(),
            });
        }
        Ok(ModuleSource {
            v0: None,
            v1: Some(payload),
        })
    }
}
