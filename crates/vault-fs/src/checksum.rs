//! SHA-256 checksum utilities
//!
//! Provides the single canonical checksum format (`sha256:<hex>`) used for
//! every content-equality decision in the sync engine: destination drift
//! detection, render comparison, and conflict classification.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::{Error, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<String> {
    let content = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}

/// Short hex digest of an arbitrary string, without the canonical prefix.
///
/// Used to derive stable per-destination directory names (conflict snapshot
/// directories) from absolute paths.
pub fn short_digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_checksum_has_prefix() {
        let checksum = hash_content("hello world");
        assert!(checksum.starts_with("sha256:"));
    }

    #[test]
    fn content_checksum_known_value() {
        let checksum = hash_content("hello world");
        assert_eq!(
            checksum,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn file_checksum_matches_content_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.env");
        std::fs::write(&path, "PORT=8080\n").unwrap();

        let file_cs = hash_file(&path).unwrap();
        let content_cs = hash_content("PORT=8080\n");
        assert_eq!(file_cs, content_cs);
    }

    #[test]
    fn short_digest_is_stable_and_short() {
        let a = short_digest("/home/dev/app/.env");
        let b = short_digest("/home/dev/app/.env");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(a, short_digest("/home/dev/app/.env.production"));
    }
}
