//! External build toolchain port.
//!
//! The platform's reproducible-build tooling is opaque to this service: one
//! command prints the build provenance embedded in a binary, another rebuilds
//! from source and compares. Both speak through their diagnostic stream.
//! Neither carries an enforced deadline; that risk is inherited from the
//! wrapped tooling.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// The toolchain process could not be run at all. A completed process with a
/// non-zero exit is not an error; it is a classified outcome.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to run build toolchain: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Outcome of one `verify-build` invocation.
#[derive(Debug, Clone)]
pub struct VerifyRun {
    /// Whether the process exited zero.
    pub succeeded: bool,
    /// Captured diagnostic stream.
    pub diagnostics: String,
}

/// Invocations of the external build/compare tooling.
#[async_trait]
pub trait BuildToolchain: Send + Sync {
    /// Print the build provenance embedded in the binary at `module_path`,
    /// returning the raw diagnostic stream.
    async fn print_build_info(&self, module_path: &Path) -> Result<String, ToolchainError>;

    /// Rebuild the source tree at `source_dir` and compare against the
    /// binary at `module_path` (absolute).
    async fn verify_build(
        &self,
        module_path: &Path,
        source_dir: &Path,
    ) -> Result<VerifyRun, ToolchainError>;
}

/// Production toolchain shelling out to the platform build tool.
pub struct ProcessToolchain {
    program: String,
}

impl ProcessToolchain {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ProcessToolchain {
    fn default() -> Self {
        Self::new("cargo")
    }
}

#[async_trait]
impl BuildToolchain for ProcessToolchain {
    async fn print_build_info(&self, module_path: &Path) -> Result<String, ToolchainError> {
        debug!(?module_path, "running print-build-info");
        let output = Command::new(&self.program)
            .args(["concordium", "print-build-info", "--module"])
            .arg(module_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }

    async fn verify_build(
        &self,
        module_path: &Path,
        source_dir: &Path,
    ) -> Result<VerifyRun, ToolchainError> {
        debug!(?module_path, ?source_dir, "running verify-build");
        let output = Command::new(&self.program)
            .args(["concordium", "verify-build", "--module"])
            .arg(module_path)
            .current_dir(source_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(VerifyRun {
            succeeded: output.status.success(),
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
