//! Filesystem primitives for SyncVault.
//!
//! Content hashing and atomic writes shared by every crate that touches a
//! tracked file. Sync decisions compare content hashes, never timestamps, so
//! the checksum format here is the single canonical one.

pub mod checksum;
pub mod error;
pub mod io;

pub use checksum::{hash_content, hash_file};
pub use error::{Error, Result};
pub use io::{ensure_dir, read_text, remove_if_exists, write_atomic};
