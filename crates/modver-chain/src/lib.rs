//! Node-failover request layer and chain client.
//!
//! Chain queries go through an external client binary. Individual nodes fail
//! routinely, so every query runs through [`FailoverRequestor`], which cycles
//! through a per-network endpoint pool until an attempt succeeds or the
//! configured number of full pool sweeps is exhausted.

mod client;
mod config;
mod error;
mod requestor;
mod runner;

pub use client::{ChainClient, ModuleSource, ModuleSourceProvider};
pub use config::ChainConfig;
pub use error::{ChainError, RunError};
pub use requestor::FailoverRequestor;
pub use runner::{InvocationRunner, ProcessRunner, RawOutput};
