//! Per-destination advisory locks
//!
//! Two operations must never concurrently decide-and-write for the same
//! destination. The watcher, the poller and the resolver all acquire the
//! destination's lock for the duration of their read-decide-act-write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Lock table keyed by destination path.
#[derive(Default)]
pub struct DestinationLocks {
    inner: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl DestinationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (creating on first use) the lock for a destination path.
    ///
    /// The returned handle outlives the table entry; callers lock it for the
    /// span of one operation:
    ///
    /// ```ignore
    /// let lock = locks.for_path(&path);
    /// let _guard = lock.lock().expect("destination lock poisoned");
    /// ```
    pub fn for_path(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut table = self.inner.lock().expect("lock table poisoned");
        table
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
