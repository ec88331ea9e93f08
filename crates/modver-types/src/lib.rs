//! Shared data model for the module verification service.
//!
//! Everything persisted or passed between the chain layer, the verification
//! pipeline, and the result store lives here: networks and their endpoints,
//! extracted module metadata, and verification outcomes.

mod module;
mod network;
mod verification;

pub use module::{ModuleRecord, ModuleSummary};
pub use network::{Endpoint, Network, NetworkParseError};
pub use verification::{BuildProvenance, VerificationResult, VerificationStatus};
