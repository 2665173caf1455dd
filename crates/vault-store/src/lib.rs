//! Persistence contracts for SyncVault.
//!
//! The sync engine never talks SQL or a cloud SDK directly; it consumes the
//! [`MetadataStore`] record-access contract and the [`SecretStore`] blob
//! contract. This crate ships file-backed implementations of both: a JSON
//! state file for metadata and a directory of JSON blobs for secrets. The
//! original relational store and the remote secret service plug in behind
//! the same traits.

pub mod error;
pub mod json_store;
pub mod records;
pub mod secret_store;
pub mod store;

pub use error::{Error, Result, SecretError};
pub use json_store::JsonStore;
pub use records::{
    ConflictRecord, ConflictStatus, DestinationContext, DestinationRecord, DestinationUpdate,
    FileRecord, ProjectRecord, ProjectUpdate, new_id, now_millis, now_rfc3339,
};
pub use secret_store::{FileSecretStore, SecretBlob, SecretStore};
pub use store::MetadataStore;
