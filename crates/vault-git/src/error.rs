//! Error types for vault-git

use std::path::PathBuf;

/// Result type for vault-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vault-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Clone failed for {url}: {message}")]
    CloneFailed { url: String, message: String },

    #[error("Pull failed at {path}: {message}")]
    PullFailed { path: PathBuf, message: String },

    #[error("Push failed at {path}: {message}")]
    PushFailed { path: PathBuf, message: String },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Cannot fast-forward: {message}")]
    CannotFastForward { message: String },
}
