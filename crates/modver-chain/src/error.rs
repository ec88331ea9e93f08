//! Error types for the chain layer.

use modver_types::Network;
use thiserror::Error;

/// Failure of a single invocation attempt. These are retried by the
/// requestor and only surface indirectly through [`ChainError::PoolExhausted`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The external process could not be spawned.
    #[error("failed to spawn client process: {0}")]
    Spawn(#[from] std::io::Error),

    /// The attempt exceeded its deadline.
    #[error("client invocation timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },
}

/// Errors surfaced by the chain layer.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Every endpoint failed for the configured number of pool sweeps.
    #[error("all {pool_size} {network} endpoints failed after {cycles} full cycles")]
    PoolExhausted {
        network: Network,
        pool_size: usize,
        cycles: u32,
    },

    /// Local artifact bookkeeping failed.
    #[error("module artifact io error: {0}")]
    Io(#[from] std::io::Error),

    /// The chain returned a module source that is not valid hex.
    #[error("module source is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Neither the v0 nor the v1 source field was populated.
    #[error("module source response carried no payload for {module_ref}")]
    MissingSource { module_ref: String },
}
