//! Module record persistence.
//!
//! The durable document store is a deployment concern; this crate defines the
//! narrow [`ModuleStore`] port the pipeline needs, the idempotent upsert
//! adapter built on top of it, and an in-memory implementation used by tests
//! and local runs.

mod adapter;
mod error;
mod memory;
mod store;

pub use adapter::ModuleStoreAdapter;
pub use error::StoreError;
pub use memory::InMemoryModuleStore;
pub use store::ModuleStore;
