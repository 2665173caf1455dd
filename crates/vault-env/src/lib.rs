//! Lossless dotenv parsing and secret templating for SyncVault.
//!
//! The document model separates a `KEY=VALUE` file into physical lines that
//! re-serialize byte-for-byte when untouched. On top of it sit the secret
//! classifier (name heuristics plus the explicit `!SYNCVAULT` marker), the
//! template renderer that swaps secret values for `{{SYNCVAULT:KEY}}`
//! placeholders, and the inverse hydration step used on the remote side.

pub mod document;
pub mod error;
pub mod mapping;
pub mod secrets;
pub mod template;

pub use document::{EnvDocument, EnvLine};
pub use error::{Error, Result};
pub use mapping::{FileMapping, SecretBinding};
pub use secrets::{
    SECRET_MARKER, collect_all_keys, collect_heuristic_keys, collect_marker_keys,
    collect_secret_keys, has_secret_marker, is_likely_secret_key, strip_secret_marker,
};
pub use template::{hydrate, make_placeholder, render, RenderOutput, SecretMap};
