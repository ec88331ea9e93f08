//! Parsing boundary for toolchain diagnostic output.
//!
//! The external toolchain speaks through free-form terminal text. That string
//! contract is fragile, so it is isolated here behind small pure functions
//! the rest of the pipeline calls.

use modver_types::BuildProvenance;
use thiserror::Error;

/// Marker introducing the source link on the final build-info line.
const SOURCE_LINK_MARKER: &str = "source code:";

/// Literal sentence the verifier emits as its last line on a byte-identical
/// rebuild.
pub const MODULE_MATCH_LINE: &str = "Source and module match.";

/// Build provenance parsed from `print-build-info` diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub build_image_used: String,
    pub build_command_used: String,
    pub archive_hash: String,
    pub link_to_source_code: String,
}

impl BuildInfo {
    /// Full provenance for result records.
    pub fn provenance(&self) -> BuildProvenance {
        BuildProvenance {
            build_image_used: Some(self.build_image_used.clone()),
            build_command_used: Some(self.build_command_used.clone()),
            archive_hash: Some(self.archive_hash.clone()),
            link_to_source_code: Some(self.link_to_source_code.clone()),
        }
    }
}

/// Why build-info diagnostics could not be parsed.
#[derive(Debug, Clone, Error)]
pub enum BuildInfoError {
    /// The output did not have the expected 4-line shape.
    #[error("no embedded build information found ({lines} lines)")]
    NoBuildInfo { lines: usize },

    /// The 4th line lacked the source-link marker. The first three fields
    /// were still parseable and are retained.
    #[error("no source code link in build information")]
    NoSourceLink { partial: BuildProvenance },
}

/// Remove terminal control sequences (CSI and two-byte escapes) from `text`.
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            // CSI sequence: consume through the final byte (0x40..=0x7e)
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        break;
                    }
                }
            }
            // Two-byte escape
            Some(_) => {
                chars.next();
            }
            None => {}
        }
    }
    out
}

/// Parse `print-build-info` diagnostics into [`BuildInfo`].
///
/// The contract is exactly 4 stripped lines: image, command, archive hash,
/// and a line carrying `source code: <link>`.
pub fn parse_build_info(text: &str) -> Result<BuildInfo, BuildInfoError> {
    let stripped = strip_ansi(text);
    let lines: Vec<&str> = stripped.lines().collect();

    if lines.len() != 4 {
        return Err(BuildInfoError::NoBuildInfo { lines: lines.len() });
    }

    let build_image_used = lines[0].trim().to_string();
    let build_command_used = lines[1].trim().to_string();
    let archive_hash = lines[2].trim().to_string();

    let link = match lines[3].split_once(SOURCE_LINK_MARKER) {
        Some((_, link)) => link.trim().to_string(),
        None => {
            return Err(BuildInfoError::NoSourceLink {
                partial: BuildProvenance {
                    build_image_used: Some(build_image_used),
                    build_command_used: Some(build_command_used),
                    archive_hash: Some(archive_hash),
                    link_to_source_code: None,
                },
            })
        }
    };

    Ok(BuildInfo {
        build_image_used,
        build_command_used,
        archive_hash,
        link_to_source_code: link,
    })
}

/// Last stripped line of verifier diagnostics, used as the run explanation.
pub fn final_diagnostic_line(text: &str) -> String {
    strip_ansi(text)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Whether verifier diagnostics report a byte-identical rebuild.
pub fn parse_verify_output(text: &str) -> bool {
    final_diagnostic_line(text) == MODULE_MATCH_LINE
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR_LINES: &str = "\
docker.io/builder:1.2.3
cargo build --release
0011aabb
source code: https://example.com/archive.tar.gz";

    #[test]
    fn parses_four_line_build_info() {
        let info = parse_build_info(FOUR_LINES).unwrap();
        assert_eq!(info.build_image_used, "docker.io/builder:1.2.3");
        assert_eq!(info.build_command_used, "cargo build --release");
        assert_eq!(info.archive_hash, "0011aabb");
        assert_eq!(
            info.link_to_source_code,
            "https://example.com/archive.tar.gz"
        );
    }

    #[test]
    fn wrong_line_count_means_no_build_info() {
        let err = parse_build_info("only\nthree\nlines").unwrap_err();
        assert!(matches!(err, BuildInfoError::NoBuildInfo { lines: 3 }));
    }

    #[test]
    fn missing_marker_keeps_partial_provenance() {
        let text = "image\ncommand\nhash\nno link here";
        match parse_build_info(text).unwrap_err() {
            BuildInfoError::NoSourceLink { partial } => {
                assert_eq!(partial.build_image_used.as_deref(), Some("image"));
                assert_eq!(partial.archive_hash.as_deref(), Some("hash"));
                assert!(partial.link_to_source_code.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strips_csi_sequences() {
        let colored = "\u{1b}[32mimage\u{1b}[0m\ncommand\nhash\nsource code: x";
        let info = parse_build_info(colored).unwrap();
        assert_eq!(info.build_image_used, "image");
    }

    #[test]
    fn verify_output_matches_only_the_exact_sentence() {
        assert!(parse_verify_output(
            "building...\ncomparing...\nSource and module match.\n"
        ));
        assert!(!parse_verify_output("Source and module differ."));
        assert!(!parse_verify_output(""));
    }

    #[test]
    fn final_line_skips_trailing_blanks() {
        assert_eq!(
            final_diagnostic_line("a\nb\n\n  \n"),
            "b".to_string()
        );
    }
}
