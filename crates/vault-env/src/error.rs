//! Error types for vault-env
//!
//! Parsing itself is total (unrecognized lines fall back to verbatim
//! passthrough), so errors here only cover mapping (de)serialization.

use std::path::PathBuf;

/// Result type for vault-env operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vault-env operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid file mapping at {path}: {source}")]
    MappingParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize file mapping: {0}")]
    MappingSerialize(#[from] serde_json::Error),
}
