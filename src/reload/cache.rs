//! In-process cache of loaded source files.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::observability::metrics;
use crate::reload::{ReloadCoordinator, ReloadEvent};

/// Whether `segment` appears in `path` as a directory name with a
/// separator on both sides. `/` and `\` are both separators, whatever the
/// platform.
pub fn path_has_segment(path: &Path, segment: &str) -> bool {
    let text = path.to_string_lossy();
    let parts: Vec<&str> = text.split(['/', '\\']).collect();
    parts.len() > 2 && parts[1..parts.len() - 1].iter().any(|part| *part == segment)
}

/// Source contents keyed by path, evicted by path segment on reload.
#[derive(Debug, Clone)]
pub struct ModuleCache {
    inner: Arc<DashMap<PathBuf, Arc<str>>>,
    segment: String,
}

impl ModuleCache {
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            segment: segment.into(),
        }
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Arc<str>>) {
        self.inner.insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &Path) -> Option<Arc<str>> {
        self.inner.get(path).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.contains_key(path)
    }

    /// Return the cached contents, reading and caching the file on a miss.
    pub fn load(&self, path: &Path) -> io::Result<Arc<str>> {
        if let Some(contents) = self.get(path) {
            return Ok(contents);
        }
        let contents: Arc<str> = std::fs::read_to_string(path)?.into();
        self.inner.insert(path.to_path_buf(), contents.clone());
        Ok(contents)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every entry whose path contains `segment`. Returns the count.
    pub fn invalidate_matching(&self, segment: &str) -> usize {
        let mut removed = 0;
        self.inner.retain(|path, _| {
            let keep = !path_has_segment(path, segment);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

impl ReloadCoordinator for ModuleCache {
    fn reload(&self, event: &ReloadEvent) {
        let removed = self.invalidate_matching(&self.segment);
        metrics::record_cache_evictions(removed);
        tracing::info!(
            removed,
            remaining = self.len(),
            changed = ?event.paths,
            "Cleared module cache"
        );
    }
}
