//! File watching on behalf of documents.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::DocumentKey;

/// The external file-system watcher.
pub trait FileWatcher: Send + Sync {
    /// Starts reporting changes to `path`.
    fn watch(&self, path: &Path);

    /// Stops reporting changes to `path`.
    fn unwatch(&self, path: &Path);
}

/// A watcher that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWatcher;

impl FileWatcher for NullWatcher {
    fn watch(&self, _path: &Path) {}

    fn unwatch(&self, _path: &Path) {}
}

/// Tracks which paths each document needs watched.
///
/// A path stays watched while at least one document depends on it. Only
/// registered documents may hold watches; once a document is removed, late
/// results from clones still in flight are ignored.
pub struct WatchRegistry {
    watcher: Box<dyn FileWatcher>,
    registered: HashSet<DocumentKey>,
    by_document: HashMap<DocumentKey, HashSet<PathBuf>>,
    ref_counts: HashMap<PathBuf, usize>,
}

impl WatchRegistry {
    /// Creates a registry forwarding to `watcher`.
    pub fn new(watcher: Box<dyn FileWatcher>) -> Self {
        Self {
            watcher,
            registered: HashSet::new(),
            by_document: HashMap::new(),
            ref_counts: HashMap::new(),
        }
    }

    /// Allows `document` to hold watches.
    pub fn register_document(&mut self, document: &DocumentKey) {
        self.registered.insert(document.clone());
    }

    /// Replaces the watch set of `document` with `paths`.
    ///
    /// Returns `false` and changes nothing if `document` is not registered.
    pub fn set_watched_files(
        &mut self,
        document: &DocumentKey,
        paths: &HashSet<PathBuf>,
    ) -> bool {
        if !self.registered.contains(document) {
            debug!(
                "Ignoring watches of removed document {}",
                document.file_path.display()
            );
            return false;
        }

        let previous = self
            .by_document
            .insert(document.clone(), paths.clone())
            .unwrap_or_default();

        for path in paths.difference(&previous) {
            self.acquire(path);
        }
        for path in previous.difference(paths) {
            self.release(path);
        }
        true
    }

    /// Drops every watch held by `document` and unregisters it.
    pub fn remove_document(&mut self, document: &DocumentKey) {
        self.registered.remove(document);
        if let Some(previous) = self.by_document.remove(document) {
            for path in &previous {
                self.release(path);
            }
        }
    }

    /// Returns whether `path` is currently watched.
    pub fn is_watched(&self, path: &Path) -> bool {
        self.ref_counts.contains_key(path)
    }

    /// All watched paths, sorted.
    pub fn watched_files(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.ref_counts.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn acquire(&mut self, path: &Path) {
        let count = self.ref_counts.entry(path.to_path_buf()).or_insert(0);
        *count += 1;
        if *count == 1 {
            debug!("Watching {}", path.display());
            self.watcher.watch(path);
        }
    }

    fn release(&mut self, path: &Path) {
        let Some(count) = self.ref_counts.get_mut(path) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.ref_counts.remove(path);
            debug!("Unwatching {}", path.display());
            self.watcher.unwatch(path);
        }
    }
}
