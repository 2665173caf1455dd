//! The SyncVault synchronization engine
//!
//! Keeps a secret-bearing dotenv file in step across its three
//! representations: the destination file on disk, the secret-free template
//! in the project clone, and the secret blob in the remote store. Two
//! drivers feed the same decision logic — the local filesystem watcher and
//! the remote poller — and both terminate in writes to the destination
//! records. Conflicts are surfaced as persisted rows and only ever closed
//! by an explicit operator action.
//!
//! # Architecture
//!
//! ```text
//!            CLI / host application
//!                      |
//!                  vault-core
//!                      |
//!       +---------+----+-----+----------+
//!       |         |          |          |
//!   vault-fs  vault-env  vault-git  vault-store
//! ```

pub mod conflict;
pub mod context;
pub mod error;
pub mod layout;
pub mod locks;
pub mod pull;
pub mod state;
pub mod sync;
pub mod track;

pub use conflict::{resolve_keep_local, resolve_keep_remote};
pub use context::EngineContext;
pub use error::{Error, Result};
pub use layout::{ProjectMetadata, ProjectSecretsMetadata};
pub use pull::{PullFileResult, RemoteSource, pull_file};
pub use state::{SyncDecision, classify};
pub use sync::engine::SyncEngine;
pub use sync::settings::SyncSettings;
pub use track::{AddFileOptions, AddFileResult, add_file};
