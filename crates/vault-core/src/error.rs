//! Error types for vault-core

use std::path::PathBuf;

/// Result type for vault-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vault-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path is not tracked: {path}")]
    NotTracked { path: PathBuf },

    #[error("File does not exist or is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    #[error("Unsupported file type: {path}. Only .env files are supported.")]
    UnsupportedFile { path: PathBuf },

    #[error("No enclosing git work tree for {path}")]
    GitRootNotFound { path: PathBuf },

    #[error("Mapping file missing at {path}")]
    MappingMissing { path: PathBuf },

    #[error("Template missing at {path}")]
    TemplateMissing { path: PathBuf },

    #[error("Conflict not found: {id}")]
    ConflictNotFound { id: String },

    #[error("Conflict {id} is not open")]
    ConflictNotOpen { id: String },

    #[error("Destination context unavailable for conflict {id}")]
    ContextUnavailable { id: String },

    #[error("Local copy not found for conflict {id}")]
    LocalCopyMissing { id: String },

    #[error("Secret store configuration missing for project {project_id}")]
    SecretConfigMissing { project_id: String },

    // Transparent wrappers for underlying crate errors
    #[error(transparent)]
    Fs(#[from] vault_fs::Error),

    #[error(transparent)]
    Env(#[from] vault_env::Error),

    #[error(transparent)]
    Git(#[from] vault_git::Error),

    #[error(transparent)]
    Store(#[from] vault_store::Error),

    #[error(transparent)]
    Secret(#[from] vault_store::SecretError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
