//! Local change watcher
//!
//! Watches the parent directory of every tracked destination and filters
//! events down to the tracked paths. Watching the files themselves would
//! not survive the engine's own writes: renders go through a
//! temp-then-rename, which replaces the inode an OS-level file watch is
//! bound to. A directory watch keeps reporting the path no matter how the
//! entry is rewritten.
//!
//! Events are debounced per path and handled only after quiet time. Before
//! doing any work the handler re-reads the destination record and drops
//! events that arrive inside the loop-suppression window after the
//! engine's own write, which keeps renders from re-triggering themselves.
//! The tracked path set is re-registered periodically so destinations
//! added while the engine runs are picked up without restart.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use notify::{EventKind, RecursiveMode, Watcher};
use tracing::{debug, warn};

use vault_store::now_millis;

use crate::context::EngineContext;
use crate::sync::local::propagate_local;
use crate::{Error, Result};

enum Msg {
    Event(notify::Result<notify::Event>),
    Shutdown,
}

/// Handle to the running watcher; dropping without [`stop`](Self::stop)
/// detaches the thread.
pub struct LocalWatcher {
    control: Sender<Msg>,
    handle: Option<JoinHandle<()>>,
}

impl LocalWatcher {
    /// Register the current tracked paths and start the dispatch thread.
    pub fn start(ctx: Arc<EngineContext>) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Msg>();

        let event_tx = tx.clone();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = event_tx.send(Msg::Event(res));
        })
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let handle = std::thread::Builder::new()
            .name("syncvault-watcher".to_string())
            .spawn(move || dispatch_loop(ctx, watcher, rx))
            .map_err(Error::Io)?;

        Ok(Self {
            control: tx,
            handle: Some(handle),
        })
    }

    /// Stop scheduling and join the dispatch thread. Pending debounce
    /// timers are discarded; an in-flight handler finishes first.
    pub fn stop(mut self) {
        let _ = self.control.send(Msg::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn dispatch_loop(ctx: Arc<EngineContext>, mut watcher: impl Watcher, rx: mpsc::Receiver<Msg>) {
    let debounce = ctx.settings.debounce();
    let refresh_interval = ctx.settings.refresh_interval();

    let mut watched_dirs: HashSet<PathBuf> = HashSet::new();
    let mut tracked: HashSet<PathBuf> = HashSet::new();
    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();

    register_paths(&ctx, &mut watcher, &mut watched_dirs, &mut tracked);
    let mut next_refresh = Instant::now() + refresh_interval;

    loop {
        let timeout = wakeup_timeout(&pending, next_refresh);
        match rx.recv_timeout(timeout) {
            Ok(Msg::Shutdown) => break,
            Ok(Msg::Event(Ok(event))) => {
                if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    let now = Instant::now();
                    for path in event.paths {
                        if tracked.contains(&path) {
                            // (Re)start this path's debounce timer
                            pending.insert(path, now + debounce);
                        }
                    }
                }
            }
            Ok(Msg::Event(Err(e))) => {
                warn!(error = %e, "filesystem watch error");
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        let due: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in due {
            pending.remove(&path);
            if let Err(e) = handle_local_change(&ctx, &path) {
                warn!(path = %path.display(), error = %e, "local change handling failed");
            }
        }

        if Instant::now() >= next_refresh {
            register_paths(&ctx, &mut watcher, &mut watched_dirs, &mut tracked);
            next_refresh = Instant::now() + refresh_interval;
        }
    }
}

fn wakeup_timeout(pending: &HashMap<PathBuf, Instant>, next_refresh: Instant) -> Duration {
    let mut next = next_refresh;
    for deadline in pending.values() {
        if *deadline < next {
            next = *deadline;
        }
    }
    next.saturating_duration_since(Instant::now()).max(Duration::from_millis(10))
}

/// Rebuild the tracked path set and watch each path's parent directory.
/// Directory registration is add-only; a disabled destination's events stop
/// matching `tracked` on the next refresh, and are dropped by the handler
/// before that.
fn register_paths(
    ctx: &EngineContext,
    watcher: &mut impl Watcher,
    watched_dirs: &mut HashSet<PathBuf>,
    tracked: &mut HashSet<PathBuf>,
) {
    let paths = match ctx.store.list_destination_paths() {
        Ok(paths) => paths,
        Err(e) => {
            warn!(error = %e, "could not list destination paths");
            return;
        }
    };
    tracked.clear();
    for path in paths {
        let Some(dir) = path.parent().map(Path::to_path_buf) else {
            continue;
        };
        if !watched_dirs.contains(&dir) {
            match watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    debug!(dir = %dir.display(), "watching destination directory");
                    watched_dirs.insert(dir);
                }
                // The directory may not exist yet (tracked remotely, not
                // rendered); the poller creates it and a later refresh
                // picks it up.
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "could not watch directory");
                }
            }
        }
        tracked.insert(path);
    }
}

/// Handle one debounced change to a tracked destination.
pub fn handle_local_change(ctx: &EngineContext, path: &Path) -> Result<()> {
    let lock = ctx.locks.for_path(path);
    let _guard = lock.lock().expect("destination lock poisoned");

    // Re-read the record under the lock; the deciding state is whatever is
    // persisted now, not what was true when the event fired.
    let Some(context) = ctx.store.destination_context(path)? else {
        debug!(path = %path.display(), "event for untracked or disabled path");
        return Ok(());
    };

    if let Some(written_at) = context.last_tool_write_at {
        let elapsed = now_millis() - written_at;
        if elapsed >= 0 && (elapsed as u128) < ctx.settings.loop_window().as_millis() {
            debug!(path = %path.display(), elapsed_ms = elapsed, "suppressing self-triggered event");
            return Ok(());
        }
    }

    propagate_local(ctx, &context)
}
