//! Extractor error types.

use thiserror::Error;

/// Errors from metadata extraction.
///
/// Decode failures are not represented here: they yield an empty summary and
/// a notification instead of an error.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Fetching the module source from the chain failed.
    #[error(transparent)]
    Chain(#[from] modver_chain::ChainError),

    /// The source payload was not valid hex.
    #[error("module source is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The source response carried no payload in either version field.
    #[error("module source for {module_ref} carried no payload")]
    EmptySource { module_ref: String },
}
