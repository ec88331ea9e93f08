//! In-memory module store for tests and local runs.

use async_trait::async_trait;
use dashmap::DashMap;
use modver_types::{ModuleRecord, Network};

use crate::error::StoreError;
use crate::store::ModuleStore;

/// Map-backed [`ModuleStore`]. Not durable; production deployments put a
/// document store behind the same port.
#[derive(Default)]
pub struct InMemoryModuleStore {
    records: DashMap<(Network, String), ModuleRecord>,
}

impl InMemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all networks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ModuleStore for InMemoryModuleStore {
    async fn get(
        &self,
        network: Network,
        module_ref: &str,
    ) -> Result<Option<ModuleRecord>, StoreError> {
        Ok(self
            .records
            .get(&(network, module_ref.to_string()))
            .map(|r| r.clone()))
    }

    async fn upsert(&self, network: Network, record: ModuleRecord) -> Result<(), StoreError> {
        self.records
            .insert((network, record.module_ref.clone()), record);
        Ok(())
    }
}
