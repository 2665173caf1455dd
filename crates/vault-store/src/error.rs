//! Error types for vault-store

use std::path::PathBuf;

/// Result type for metadata-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in metadata-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] vault_fs::Error),

    #[error("State file corrupt at {path}: {source}")]
    StateParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize state: {0}")]
    StateSerialize(#[from] serde_json::Error),

    #[error("Destination not found: {id}")]
    DestinationNotFound { id: String },

    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("Conflict not found: {id}")]
    ConflictNotFound { id: String },
}

/// Errors that can occur in secret-store operations
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret blob not found: {id}")]
    NotFound { id: String },

    #[error("Secret store I/O failure for {id}: {message}")]
    Io { id: String, message: String },

    #[error("Secret blob {id} is not a flat string map: {message}")]
    InvalidBlob { id: String, message: String },
}
