//! Editor-resident file content that has not been saved to disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::time_point::TimePoint;

/// Content of one unsaved editor buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsavedFile {
    path: PathBuf,
    content: Arc<str>,
}

impl UnsavedFile {
    /// Creates an unsaved file entry.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Path the buffer belongs to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Buffer content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Store of unsaved buffers.
///
/// Cloning is cheap and yields a read-only snapshot: later writes to the
/// original store are not visible through the clone.
#[derive(Debug, Clone)]
pub struct UnsavedFiles {
    files: Arc<HashMap<PathBuf, UnsavedFile>>,
    last_change_time_point: TimePoint,
}

impl UnsavedFiles {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            files: Arc::new(HashMap::new()),
            last_change_time_point: TimePoint::now(),
        }
    }

    /// Inserts or replaces the buffer for `path`.
    pub fn create_or_update(&mut self, path: impl Into<PathBuf>, content: impl Into<Arc<str>>) {
        let file = UnsavedFile::new(path, content);
        Arc::make_mut(&mut self.files).insert(file.path.clone(), file);
        self.last_change_time_point = TimePoint::now();
    }

    /// Drops the buffer for `path`. Returns whether one was present.
    pub fn remove(&mut self, path: &Path) -> bool {
        if !self.files.contains_key(path) {
            return false;
        }
        Arc::make_mut(&mut self.files).remove(path);
        self.last_change_time_point = TimePoint::now();
        true
    }

    /// Looks up the buffer for `path`.
    pub fn unsaved_file(&self, path: &Path) -> Option<&UnsavedFile> {
        self.files.get(path)
    }

    /// Returns the buffer content for `path`, if any.
    pub fn content(&self, path: &Path) -> Option<&str> {
        self.unsaved_file(path).map(UnsavedFile::content)
    }

    /// Iterates over all buffers.
    pub fn iter(&self) -> impl Iterator<Item = &UnsavedFile> {
        self.files.values()
    }

    /// When the store last changed.
    pub fn last_change_time_point(&self) -> TimePoint {
        self.last_change_time_point
    }

    /// Number of buffers.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Default for UnsavedFiles {
    fn default() -> Self {
        Self::new()
    }
}
