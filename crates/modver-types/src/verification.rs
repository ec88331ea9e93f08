//! Verification outcomes attached to module records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a verification run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// No run has completed for this module yet.
    #[default]
    NotStarted,

    /// The run terminated before a rebuild comparison could succeed.
    VerifiedFailed,

    /// The rebuild comparison ran to completion.
    VerifiedSuccess,
}

/// Build provenance claimed by a module's embedded metadata.
///
/// Populated incrementally as the pipeline advances; terminal failures after
/// provenance parsing retain whatever was learned up to that point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProvenance {
    pub build_image_used: Option<String>,
    pub build_command_used: Option<String>,
    pub archive_hash: Option<String>,
    pub link_to_source_code: Option<String>,
}

/// The persisted outcome of one verification run.
///
/// Exactly one of these is attached to a module record at a time; a new run
/// replaces the previous result wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether the rebuilt artifact matched the on-chain binary. Only
    /// meaningful when `status` is not `NotStarted`.
    pub verified: bool,
    pub status: VerificationStatus,
    pub timestamp: DateTime<Utc>,
    /// Human-readable explanation of how the run ended.
    pub explanation: String,
    pub build_image_used: Option<String>,
    pub build_command_used: Option<String>,
    pub archive_hash: Option<String>,
    pub link_to_source_code: Option<String>,
    pub source_code_snapshot: Option<String>,
}

impl VerificationResult {
    /// Placeholder result for a module whose verification has not run.
    pub fn not_started() -> Self {
        Self {
            verified: false,
            status: VerificationStatus::NotStarted,
            timestamp: Utc::now(),
            explanation: String::new(),
            build_image_used: None,
            build_command_used: None,
            archive_hash: None,
            link_to_source_code: None,
            source_code_snapshot: None,
        }
    }

    /// Terminal failure with whatever provenance was recovered before the
    /// failing step.
    pub fn failed(explanation: impl Into<String>, provenance: BuildProvenance) -> Self {
        Self {
            verified: false,
            status: VerificationStatus::VerifiedFailed,
            timestamp: Utc::now(),
            explanation: explanation.into(),
            build_image_used: provenance.build_image_used,
            build_command_used: provenance.build_command_used,
            archive_hash: provenance.archive_hash,
            link_to_source_code: provenance.link_to_source_code,
            source_code_snapshot: None,
        }
    }

    /// Completed rebuild comparison. `verified` carries the match outcome.
    pub fn completed(
        verified: bool,
        explanation: impl Into<String>,
        provenance: BuildProvenance,
        source_code_snapshot: Option<String>,
    ) -> Self {
        Self {
            verified,
            status: VerificationStatus::VerifiedSuccess,
            timestamp: Utc::now(),
            explanation: explanation.into(),
            build_image_used: provenance.build_image_used,
            build_command_used: provenance.build_command_used,
            archive_hash: provenance.archive_hash,
            link_to_source_code: provenance.link_to_source_code,
            source_code_snapshot,
        }
    }
}
