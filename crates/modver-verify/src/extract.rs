//! Module metadata extraction.
//!
//! Pulls a module's binary from the chain, asks the structural decoder for
//! its exported names, and classifies them into a display name plus an
//! ordered method list.

use std::sync::Arc;

use modver_chain::ModuleSourceProvider;
use modver_notify::Notifier;
use modver_store::{ModuleStoreAdapter, StoreError};
use modver_types::{ModuleSummary, Network};
use tracing::{info, warn};

use crate::decoder::ModuleDecoder;
use crate::error::ExtractError;

/// Exported-name prefix that declares the module's display name.
pub const INIT_PREFIX: &str = "init_";

/// Block reference used when none is given: the latest finalized block.
const DEFAULT_BLOCK: &str = "last_final";

/// Classify exported names into a module summary.
///
/// Names with the init prefix assign the display name (prefix stripped, last
/// one wins). Every other name contributes one method entry, in encounter
/// order: the single segment right after the first namespace separator when
/// present, otherwise the whole name. Duplicates are kept.
pub fn classify_exports(module_ref: &str, names: &[String]) -> ModuleSummary {
    let mut summary = ModuleSummary::empty(module_ref);

    for name in names {
        if let Some(module_name) = name.strip_prefix(INIT_PREFIX) {
            summary.module_name = Some(module_name.to_string());
        } else {
            let method = name.split('.').nth(1).unwrap_or(name.as_str());
            summary.methods.push(method.to_string());
        }
    }
    summary
}

/// Extracts and persists module metadata.
pub struct MetadataExtractor {
    source: Arc<dyn ModuleSourceProvider>,
    decoder: Arc<dyn ModuleDecoder>,
    notifier: Arc<dyn Notifier>,
}

impl MetadataExtractor {
    pub fn new(
        source: Arc<dyn ModuleSourceProvider>,
        decoder: Arc<dyn ModuleDecoder>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            decoder,
            notifier,
        }
    }

    /// Fetch and summarize a module's exports at `block`.
    ///
    /// A decode failure is reported through the notifier and yields an empty
    /// summary rather than an error; only source-fetch failures propagate.
    pub async fn extract(
        &self,
        network: Network,
        block: &str,
        module_ref: &str,
    ) -> Result<ModuleSummary, ExtractError> {
        let source = self
            .source
            .get_module_source(module_ref, block, network)
            .await?;
        let bytes = source.to_bytes()?.ok_or_else(|| ExtractError::EmptySource {
            module_ref: module_ref.to_string(),
        })?;

        let names = match self.decoder.exported_names(&bytes) {
            Ok(names) => names,
            Err(err) => {
                warn!(%network, module_ref, %err, "module decode failed");
                self.notifier
                    .notify(&format!(
                        "{network}: New module get_module_metadata failed with error {err}."
                    ))
                    .await;
                return Ok(ModuleSummary::empty(module_ref));
            }
        };

        Ok(classify_exports(module_ref, &names))
    }

    /// Process a newly observed module: extract at the latest finalized
    /// block, persist the base record, and report.
    ///
    /// On extraction failure the error is reported and propagated; nothing is
    /// persisted. A decode failure still persists an empty-but-present
    /// record.
    pub async fn process_new_module(
        &self,
        store: &ModuleStoreAdapter,
        network: Network,
        module_ref: &str,
    ) -> Result<ModuleSummary, ProcessError> {
        let summary = match self.extract(network, DEFAULT_BLOCK, module_ref).await {
            Ok(summary) => summary,
            Err(err) => {
                self.notifier
                    .notify(&format!("{network}: New module failed with error {err}."))
                    .await;
                return Err(err.into());
            }
        };

        store.upsert_metadata(network, summary.clone()).await?;

        let name = summary.module_name.as_deref().unwrap_or("None");
        info!(%network, module_ref, name, "new module processed");
        self.notifier
            .notify(&format!(
                "{network}: New module processed {module_ref} with name {name}."
            ))
            .await;
        Ok(summary)
    }
}

/// Failure of the observe-and-persist flow.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
