//! Structural decoder port.
//!
//! The binary-format decoding itself is an external collaborator; the
//! extractor only needs the flat list of exported names.

use thiserror::Error;

/// The decoder rejected the module bytes.
#[derive(Debug, Clone, Error)]
#[error("module decode failed: {0}")]
pub struct DecodeError(pub String);

/// Yields the exported-name declarations of a binary module.
pub trait ModuleDecoder: Send + Sync {
    fn exported_names(&self, module_bytes: &[u8]) -> Result<Vec<String>, DecodeError>;
}
