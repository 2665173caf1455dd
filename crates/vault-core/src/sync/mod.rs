//! The two sync drivers and their shared plumbing
//!
//! - [`watch`]: reacts to filesystem events on tracked destinations and
//!   pushes local edits upstream.
//! - [`poll`]: periodically re-renders every tracked file from the pulled
//!   template and the secret blob, and applies the destination decision
//!   logic.
//! - [`local`]: the local-change propagation routine both drivers share.
//! - [`engine`]: the `SyncEngine` lifecycle owning both drivers.

pub mod engine;
pub mod local;
pub mod poll;
pub mod settings;
pub mod watch;
