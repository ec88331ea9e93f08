//! Store port.

use async_trait::async_trait;
use modver_types::{ModuleRecord, Network};

use crate::error::StoreError;

/// Document-store operations the service needs, partitioned by network.
///
/// Implementations replace the whole record on upsert; field-level merging is
/// the adapter's job.
#[async_trait]
pub trait ModuleStore: Send + Sync {
    /// Fetch the record for a module, if it was ever observed.
    async fn get(
        &self,
        network: Network,
        module_ref: &str,
    ) -> Result<Option<ModuleRecord>, StoreError>;

    /// Insert or fully replace the record for `record.module_ref`.
    async fn upsert(&self, network: Network, record: ModuleRecord) -> Result<(), StoreError>;
}
