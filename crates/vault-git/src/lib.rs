//! Git operations for SyncVault project clones.
//!
//! Thin wrapper over `git2` exposing exactly the operations the sync engine
//! needs: ensure a clone exists, fast-forward pull, commit everything, push.
//! Credentials come from the ambient git credential helpers; credential and
//! profile management is outside this crate.

pub mod error;
pub mod repo;

pub use error::{Error, Result};
pub use repo::{commit_all, current_branch, ensure_clone, pull, push};
