//! Development hot reload.
//!
//! # Data Flow
//! ```text
//! file change under watch.root
//!     → watcher.rs (notify callback, access events dropped)
//!     → ReloadCoordinator::reload
//!         → LogReloads only logs (configurator default)
//!         → cache.rs evicts entries under the `server` segment
//!         → or a channel feeds restart.rs, which triggers shutdown so the
//!           process supervisor restarts the binary
//! ```
//!
//! # Design Decisions
//! - Started only in development, at most once per configurator
//! - No stop path: the watcher lives as long as its handle
//! - Event kinds are not distinguished; any change reloads

pub mod cache;
pub mod restart;
pub mod watcher;

use std::path::PathBuf;

use tokio::sync::mpsc;

pub use cache::{path_has_segment, ModuleCache};
pub use restart::spawn_restart_on_change;
pub use watcher::{SourceWatcher, WatchError};

/// A change observed under the watch root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    pub paths: Vec<PathBuf>,
}

/// Receives reload signals from the source watcher.
///
/// Called from the watcher's own thread.
pub trait ReloadCoordinator: Send + Sync {
    fn reload(&self, event: &ReloadEvent);
}

impl ReloadCoordinator for mpsc::UnboundedSender<ReloadEvent> {
    fn reload(&self, event: &ReloadEvent) {
        if self.send(event.clone()).is_err() {
            tracing::warn!("Reload receiver dropped; change ignored");
        }
    }
}

/// Coordinator that only logs changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReloads;

impl ReloadCoordinator for LogReloads {
    fn reload(&self, event: &ReloadEvent) {
        tracing::info!(paths = ?event.paths, "Source changed; no reload coordinator installed");
    }
}
