//! Source archive fetch and extraction.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use thiserror::Error;
use tracing::debug;

/// Relative path of the primary source file inside the extracted tree.
const PRIMARY_SOURCE_FILE: &str = "src/lib.rs";

/// Archive handling failures. The `Display` text doubles as the run
/// explanation, so each variant spells out what went wrong.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Fetching the source archive failed: {0}")]
    Fetch(String),

    #[error("Fetching the source archive from {url} returned HTTP status {status}")]
    HttpStatus { status: u16, url: String },

    #[error("Extracting the source archive failed: {0}")]
    Extract(#[from] std::io::Error),

    #[error("Source archive did not contain exactly one top-level directory ({found} entries)")]
    Layout { found: usize },
}

/// Download the archive at `url`, following redirects.
pub async fn fetch_archive(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ArchiveError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ArchiveError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ArchiveError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ArchiveError::Fetch(e.to_string()))?;
    debug!(url, size = bytes.len(), "source archive fetched");
    Ok(bytes.to_vec())
}

/// Extract a gzipped tar archive into `dest` and return the single top-level
/// directory it unpacked to.
///
/// `dest` is wiped and recreated first so no previous run's tree survives
/// into this one.
pub fn unpack_archive(bytes: &[u8], dest: &Path) -> Result<PathBuf, ArchiveError> {
    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    fs::create_dir_all(dest)?;

    Archive::new(GzDecoder::new(bytes)).unpack(dest)?;

    let entries: Vec<_> = fs::read_dir(dest)?.collect::<Result<_, _>>()?;
    if entries.len() != 1 || !entries[0].file_type()?.is_dir() {
        return Err(ArchiveError::Layout {
            found: entries.len(),
        });
    }
    Ok(entries[0].path())
}

/// Contents of the primary source file, if the tree carries one at the
/// conventional location.
pub fn source_snapshot(source_dir: &Path) -> Option<String> {
    fs::read_to_string(source_dir.join(PRIMARY_SOURCE_FILE)).ok()
}


#[cfg(test)]
mod tests {
    use super::test_support::targz;
    use super::*;

    #[test]
    fn unpacks_single_top_level_directory() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = targz(&[
            ("project-1.0/Cargo.toml", "[package]"),
            ("project-1.0/src/lib.rs", "pub fn init() {}"),
        ]);

        let top = unpack_archive(&bytes, &dir.path().join("work")).unwrap();
        assert!(top.ends_with("project-1.0"));
        assert_eq!(
            source_snapshot(&top).unwrap(),
            "pub fn init() {}".to_string()
        );
    }

    #[test]
    fn multiple_top_level_entries_violate_layout() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = targz(&[("a/x.txt", "1"), ("b/y.txt", "2")]);

        let err = unpack_archive(&bytes, &dir.path().join("work")).unwrap_err();
        assert!(matches!(err, ArchiveError::Layout { found: 2 }));
    }

    #[test]
    fn previous_contents_are_wiped() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work");
        std::fs::create_dir_all(work.join("stale-dir")).unwrap();
        std::fs::write(work.join("stale-dir/old.rs"), "old").unwrap();

        let bytes = targz(&[("fresh/src/lib.rs", "new")]);
        let top = unpack_archive(&bytes, &work).unwrap();

        assert!(top.ends_with("fresh"));
        assert!(!work.join("stale-dir").exists());
    }

    #[test]
    fn missing_primary_source_yields_no_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = targz(&[("project/README.md", "docs only")]);
        let top = unpack_archive(&bytes, &dir.path().join("work")).unwrap();
        assert!(source_snapshot(&top).is_none());
    }

    #[tokio::test]
    async fn unreachable_url_is_a_fetch_error() {
        let client = reqwest::Client::new();
        let err = fetch_archive(&client, "http://127.0.0.1:1/archive.tar.gz")
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Fetch(_)));
    }
}
