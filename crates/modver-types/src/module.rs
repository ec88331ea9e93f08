//! Module metadata records.

use serde::{Deserialize, Serialize};

use crate::verification::VerificationResult;

/// Metadata extracted from a module's binary encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    /// Content-addressed module reference.
    pub module_ref: String,
    /// Display name declared via the module's init export, if any.
    pub module_name: Option<String>,
    /// Exported method names, in encounter order. Duplicates are kept.
    pub methods: Vec<String>,
}

impl ModuleSummary {
    /// Summary with no decoded metadata, used when structural decoding fails.
    pub fn empty(module_ref: impl Into<String>) -> Self {
        Self {
            module_ref: module_ref.into(),
            module_name: None,
            methods: Vec::new(),
        }
    }
}

/// The persisted record for an observed module, keyed by `module_ref` within
/// a network partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub module_ref: String,
    pub module_name: Option<String>,
    pub methods: Vec<String>,
    /// Outcome of the most recent verification run. New runs replace this
    /// field, they never append.
    pub verification: Option<VerificationResult>,
}

impl ModuleRecord {
    pub fn from_summary(summary: ModuleSummary) -> Self {
        Self {
            module_ref: summary.module_ref,
            module_name: summary.module_name,
            methods: summary.methods,
            verification: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary_has_no_metadata() {
        let summary = ModuleSummary::empty("deadbeef");
        assert_eq!(summary.module_ref, "deadbeef");
        assert!(summary.module_name.is_none());
        assert!(summary.methods.is_empty());
    }

    #[test]
    fn record_from_summary_starts_unverified() {
        let record = ModuleRecord::from_summary(ModuleSummary {
            module_ref: "abc".into(),
            module_name: Some("counter".into()),
            methods: vec!["increment".into()],
        });
        assert!(record.verification.is_none());
        assert_eq!(record.module_name.as_deref(), Some("counter"));
    }
}
