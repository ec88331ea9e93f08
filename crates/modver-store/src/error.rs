//! Store error types.

use modver_types::Network;
use thiserror::Error;

/// Errors surfaced by the store port and adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A verification was attached to a module that was never observed.
    /// This is a precondition violation and aborts the run.
    #[error("no record for module {module_ref} on {network}")]
    MissingRecord {
        network: Network,
        module_ref: String,
    },

    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}
