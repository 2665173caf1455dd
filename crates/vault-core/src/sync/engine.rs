//! Engine lifecycle
//!
//! The `SyncEngine` owns the watcher and the poller. Host applications
//! construct it once, start it, and drive on-demand work (an immediate poll
//! pass, an immediate local sync) through it; stopping joins both worker
//! threads.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::context::EngineContext;
use crate::sync::local;
use crate::sync::poll::{self, RemotePoller};
use crate::sync::watch::LocalWatcher;
use crate::Result;

pub struct SyncEngine {
    ctx: Arc<EngineContext>,
    watcher: Option<LocalWatcher>,
    poller: Option<RemotePoller>,
}

impl SyncEngine {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            watcher: None,
            poller: None,
        }
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    /// Start both drivers. Idempotent; already-running drivers are kept.
    pub fn start(&mut self) -> Result<()> {
        if self.watcher.is_none() {
            self.watcher = Some(LocalWatcher::start(Arc::clone(&self.ctx))?);
        }
        if self.poller.is_none() {
            self.poller = Some(RemotePoller::start(Arc::clone(&self.ctx))?);
        }
        info!("sync engine started");
        Ok(())
    }

    /// Stop both drivers and wait for their threads.
    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
        info!("sync engine stopped");
    }

    /// Run one poll pass now, on the calling thread.
    pub fn poll_now(&self) -> Result<()> {
        poll::run_pass(&self.ctx)
    }

    /// Propagate one destination's local content now, bypassing debounce and
    /// loop suppression.
    pub fn sync_local_now(&self, path: &Path) -> Result<()> {
        local::sync_local_now(&self.ctx, path)
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
