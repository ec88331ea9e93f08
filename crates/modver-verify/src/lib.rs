//! Build-verification pipeline.
//!
//! Determines whether a module's on-chain binary can be reproduced from the
//! source archive its embedded build provenance points at. The pipeline is a
//! straight-line state machine: materialize the binary, read its build
//! metadata, fetch and unpack the claimed source archive, rebuild under the
//! external toolchain, and classify the comparison. Every failure mode is
//! caught where it occurs and becomes a terminal `verified_failed` result
//! with an explanation; nothing escapes a run except a store precondition
//! violation.

mod archive;
mod build_info;
mod decoder;
mod error;
mod extract;
mod pipeline;
mod toolchain;

pub use archive::{fetch_archive, source_snapshot, unpack_archive, ArchiveError};
pub use build_info::{
    final_diagnostic_line, parse_build_info, parse_verify_output, strip_ansi, BuildInfo,
    BuildInfoError, MODULE_MATCH_LINE,
};
pub use decoder::{DecodeError, ModuleDecoder};
pub use error::ExtractError;
pub use extract::{classify_exports, MetadataExtractor, ProcessError, INIT_PREFIX};
pub use pipeline::{ModuleMaterializer, PipelineConfig, VerificationPipeline};
pub use toolchain::{BuildToolchain, ProcessToolchain, ToolchainError, VerifyRun};
