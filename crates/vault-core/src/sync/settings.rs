//! Engine timing settings
//!
//! Persisted as `settings.toml` under the data root; every field has a
//! default so a missing or partial file works.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

const SETTINGS_FILE: &str = "settings.toml";

/// Timing knobs for the watcher and the poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Remote poller interval.
    pub poll_interval_ms: u64,
    /// Quiet time after the last filesystem event before the local handler
    /// runs.
    pub debounce_ms: u64,
    /// Events within this window after the engine's own write are treated
    /// as self-triggered and ignored.
    pub loop_window_ms: u64,
    /// How often the watcher re-registers the tracked path set.
    pub refresh_interval_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20_000,
            debounce_ms: 300,
            loop_window_ms: 800,
            refresh_interval_ms: 10_000,
        }
    }
}

impl SyncSettings {
    /// Load from `<data-root>/settings.toml`; defaults when the file is
    /// missing, defaults with a warning when it is corrupt.
    pub fn load(data_root: &Path) -> Self {
        let path = data_root.join(SETTINGS_FILE);
        let Ok(raw) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
                Self::default()
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn loop_window(&self) -> Duration {
        Duration::from_millis(self.loop_window_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
