//! Idempotent upsert adapter over the store port.

use std::sync::Arc;

use modver_types::{ModuleRecord, ModuleSummary, Network, VerificationResult};
use tracing::info;

use crate::error::StoreError;
use crate::store::ModuleStore;

/// Read-modify-write operations the extractor and pipeline use.
///
/// The read-modify-write cycle is not transactionally isolated: concurrent
/// runs for the same module_ref are last-writer-wins. The trigger source is
/// expected to serialize runs per module.
#[derive(Clone)]
pub struct ModuleStoreAdapter {
    store: Arc<dyn ModuleStore>,
}

impl ModuleStoreAdapter {
    pub fn new(store: Arc<dyn ModuleStore>) -> Self {
        Self { store }
    }

    /// Create or refresh a module's extracted metadata.
    ///
    /// An existing verification result is carried over into the replacement
    /// record. This is a deliberate departure from a whole-document replace,
    /// which would silently drop the outcome of a completed run whenever the
    /// module is re-observed.
    pub async fn upsert_metadata(
        &self,
        network: Network,
        summary: ModuleSummary,
    ) -> Result<(), StoreError> {
        let existing = self.store.get(network, &summary.module_ref).await?;
        let verification = existing.and_then(|r| r.verification);

        let mut record = ModuleRecord::from_summary(summary);
        record.verification = verification;

        info!(%network, module_ref = %record.module_ref, "upserting module metadata");
        self.store.upsert(network, record).await
    }

    /// Replace the module's verification result with `result`.
    ///
    /// A module that was never observed cannot carry a verification; that is
    /// a fatal precondition violation for the calling run.
    pub async fn attach_verification(
        &self,
        network: Network,
        module_ref: &str,
        result: VerificationResult,
    ) -> Result<(), StoreError> {
        let mut record = self.store.get(network, module_ref).await?.ok_or_else(|| {
            StoreError::MissingRecord {
                network,
                module_ref: module_ref.to_string(),
            }
        })?;

        record.verification = Some(result);
        info!(%network, module_ref, "attaching verification result");
        self.store.upsert(network, record).await
    }

    /// Current record, if any.
    pub async fn get(
        &self,
        network: Network,
        module_ref: &str,
    ) -> Result<Option<ModuleRecord>, StoreError> {
        self.store.get(network, module_ref).await
    }
}
