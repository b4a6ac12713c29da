//! Source tree watcher for development hot reload.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

use crate::observability::metrics;
use crate::reload::{ReloadCoordinator, ReloadEvent};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch root {0} is not a directory")]
    MissingRoot(PathBuf),

    #[error("failed to watch {path}: {source}")]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// A recursive watcher forwarding every change to a coordinator.
///
/// Watching stops when this handle is dropped.
pub struct SourceWatcher {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl SourceWatcher {
    /// Start watching `root` recursively.
    ///
    /// Only changes made after this returns are reported; existing files
    /// produce no events.
    pub fn start(root: &Path, coordinator: Arc<dyn ReloadCoordinator>) -> Result<Self, WatchError> {
        if !root.is_dir() {
            return Err(WatchError::MissingRoot(root.to_path_buf()));
        }
        let notify_err = |source: notify::Error| WatchError::Notify {
            path: root.to_path_buf(),
            source,
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_access() {
                        return;
                    }
                    tracing::info!(kind = ?event.kind, paths = ?event.paths, "Source change detected");
                    metrics::record_reload_event();
                    coordinator.reload(&ReloadEvent { paths: event.paths });
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default(),
        )
        .map_err(notify_err)?;

        watcher.watch(root, RecursiveMode::Recursive).map_err(notify_err)?;

        tracing::info!(path = ?root, "Source watcher started");
        Ok(Self {
            root: root.to_path_buf(),
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl fmt::Debug for SourceWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceWatcher").field("root", &self.root).finish()
    }
}
