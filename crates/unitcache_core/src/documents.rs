//! The document collection.
//!
//! [`Documents`] owns one [`Document`] per (file, project part) pair, the
//! project part registry, the unsaved-buffer store and the watch registry. It
//! turns editor and file-system events into dirty marks on the affected
//! documents; an external scheduler then parses or reparses them.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::document::{Document, DocumentHost, DocumentKey, FileExistsCheck};
use crate::engine::ParseEngine;
use crate::error::DocumentError;
use crate::file_container::FileContainer;
use crate::paths::normalize_path;
use crate::project_part::{ProjectPart, ProjectParts};
use crate::unsaved_files::UnsavedFiles;
use crate::watcher::{FileWatcher, WatchRegistry};

/// The part of the collection that documents call back into.
struct SharedHost {
    unsaved_files: RwLock<UnsavedFiles>,
    watches: Mutex<WatchRegistry>,
}

impl DocumentHost for SharedHost {
    fn unsaved_files(&self) -> UnsavedFiles {
        self.unsaved_files.read().clone()
    }

    fn add_watched_files(&self, document: &DocumentKey, file_paths: &HashSet<PathBuf>) {
        self.watches.lock().set_watched_files(document, file_paths);
    }
}

/// Registry of documents.
pub struct Documents<E: ParseEngine> {
    engine: Arc<E>,
    host: Arc<SharedHost>,
    project_parts: RwLock<ProjectParts>,
    documents: RwLock<HashMap<DocumentKey, Document<E>>>,
    file_exists_check: FileExistsCheck,
}

impl<E: ParseEngine> Documents<E> {
    /// Creates an empty collection.
    pub fn new(engine: Arc<E>, watcher: Box<dyn FileWatcher>) -> Self {
        Self {
            engine,
            host: Arc::new(SharedHost {
                unsaved_files: RwLock::new(UnsavedFiles::new()),
                watches: Mutex::new(WatchRegistry::new(watcher)),
            }),
            project_parts: RwLock::new(ProjectParts::new()),
            documents: RwLock::new(HashMap::new()),
            file_exists_check: FileExistsCheck::Check,
        }
    }

    /// Sets whether new documents require their file to exist.
    pub fn with_file_exists_check(mut self, check: FileExistsCheck) -> Self {
        self.file_exists_check = check;
        self
    }

    /// The engine shared by all documents.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Creates documents for the given containers.
    ///
    /// Fails without creating anything if a project part is unknown or a
    /// document already exists. Unsaved content carried by a container is
    /// stored and dirties every document depending on that file.
    pub fn create(&self, containers: &[FileContainer]) -> Result<Vec<Document<E>>, DocumentError> {
        self.check_if_project_parts_exist(containers)?;
        self.check_if_documents_do_not_exist(containers)?;

        let mut created = Vec::with_capacity(containers.len());
        for container in containers {
            if let Some(content) = &container.unsaved_content {
                self.store_unsaved_content(container.file_path(), content);
                self.update_documents_with_changed_dependency(container.file_path());
            }
            created.push(self.create_document(container)?);
        }

        Ok(created)
    }

    /// Applies new revisions and unsaved content to existing documents.
    ///
    /// Every document of the container's file gets the new revision,
    /// regardless of project part.
    pub fn update(&self, containers: &[FileContainer]) -> Result<Vec<Document<E>>, DocumentError> {
        for container in containers {
            if self.documents_with_file_path(container.file_path()).is_empty() {
                return Err(DocumentError::DocumentDoesNotExist {
                    path: container.file_path.clone(),
                    project_part_id: container.project_part_id.clone(),
                });
            }
        }

        let mut updated = Vec::new();
        for container in containers {
            if let Some(content) = &container.unsaved_content {
                self.store_unsaved_content(container.file_path(), content);
            }

            for document in self.documents_with_file_path(container.file_path()) {
                document.set_document_revision(container.document_revision)?;
                updated.push(document);
            }

            self.update_documents_with_changed_dependency(container.file_path());
        }

        Ok(updated)
    }

    /// Removes documents, their watches and their unsaved content.
    ///
    /// Fails without removing anything if a document does not exist.
    pub fn remove(&self, containers: &[FileContainer]) -> Result<(), DocumentError> {
        {
            let documents = self.documents.read();
            for container in containers {
                let key = Self::key_for(container);
                if !documents.contains_key(&key) {
                    return Err(Self::does_not_exist(&key));
                }
            }
        }

        for container in containers {
            let key = Self::key_for(container);
            self.documents.write().remove(&key);
            self.host.watches.lock().remove_document(&key);
            if self.host.unsaved_files.write().remove(container.file_path()) {
                self.update_documents_with_changed_dependency(container.file_path());
            }
            debug!("Document removed: {}", key.file_path.display());
        }

        Ok(())
    }

    /// Looks up a document.
    pub fn document(
        &self,
        file_path: &Path,
        project_part_id: &str,
    ) -> Result<Document<E>, DocumentError> {
        let key = DocumentKey::new(file_path, project_part_id);
        self.documents
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| Self::does_not_exist(&key))
    }

    /// Looks up the document a container refers to.
    pub fn document_for_container(
        &self,
        container: &FileContainer,
    ) -> Result<Document<E>, DocumentError> {
        self.document(container.file_path(), &container.project_part_id)
    }

    /// Returns whether a document exists.
    pub fn has_document(&self, file_path: &Path, project_part_id: &str) -> bool {
        self.documents
            .read()
            .contains_key(&DocumentKey::new(file_path, project_part_id))
    }

    /// All documents, sorted by key.
    pub fn documents(&self) -> Vec<Document<E>> {
        let documents = self.documents.read();
        let mut keys: Vec<_> = documents.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| documents.get(key).cloned())
            .collect()
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Marks documents of `file_path` as used by the focused editor and all
    /// other documents as not used.
    pub fn set_used_by_current_editor(&self, file_path: &Path) -> Result<(), DocumentError> {
        for document in self.documents() {
            let used = document.file_path()? == file_path;
            document.set_is_used_by_current_editor(used)?;
        }
        Ok(())
    }

    /// Marks documents of the given files as visible and all others as hidden.
    pub fn set_visible_in_editors(&self, file_paths: &[PathBuf]) -> Result<(), DocumentError> {
        for document in self.documents() {
            let path = document.file_path()?;
            let visible = file_paths.iter().any(|p| p == path);
            document.set_is_visible_in_editor(visible)?;
        }
        Ok(())
    }

    /// Entry point for file-system change notifications.
    ///
    /// Marks every document that depends on `file_path` dirty and returns them.
    pub fn update_documents_with_changed_dependency(&self, file_path: &Path) -> Vec<Document<E>> {
        let file_path = &normalize_path(file_path);
        let mut dirtied = Vec::new();
        for document in self.documents() {
            if let Ok(true) = document.set_dirty_if_dependency_is_met(file_path) {
                dirtied.push(document);
            }
        }

        if !dirtied.is_empty() {
            debug!(
                "{} changed, {} documents dirty",
                file_path.display(),
                dirtied.len()
            );
        }
        dirtied
    }

    /// Marks every document whose project part is outdated dirty.
    pub fn set_documents_dirty_if_project_part_changed(&self) -> Vec<Document<E>> {
        self.documents()
            .into_iter()
            .filter(|document| matches!(document.set_dirty_if_project_part_is_outdated(), Ok(true)))
            .collect()
    }

    /// Registers new project parts and updates changed ones.
    ///
    /// Documents under a changed part receive the new configuration and are
    /// marked dirty.
    pub fn create_or_update_project_parts(&self, parts: Vec<ProjectPart>) -> Vec<Document<E>> {
        let (changed, current): (Vec<String>, Vec<ProjectPart>) = {
            let mut project_parts = self.project_parts.write();
            let changed = project_parts.create_or_update(parts);
            let current = changed
                .iter()
                .filter_map(|id| project_parts.project(id).ok().cloned())
                .collect();
            (changed, current)
        };

        if !changed.is_empty() {
            info!("Project parts changed: {}", changed.join(", "));
        }

        for part in current {
            for document in self.documents_with_project_part(part.project_part_id()) {
                if let Err(e) = document.set_project_part(part.clone()) {
                    warn!("Failed to update project part of {}: {}", document, e);
                }
            }
        }

        self.set_documents_dirty_if_project_part_changed()
    }

    /// Removes project parts and evicts their documents.
    pub fn remove_project_parts(&self, ids: &[String]) -> Result<(), DocumentError> {
        self.project_parts.write().remove(ids)?;

        let evicted: Vec<DocumentKey> = self
            .documents
            .read()
            .keys()
            .filter(|key| ids.contains(&key.project_part_id))
            .cloned()
            .collect();

        for key in evicted {
            self.documents.write().remove(&key);
            self.host.watches.lock().remove_document(&key);
            debug!("Document evicted: {}", key.file_path.display());
        }

        Ok(())
    }

    /// Looks up a project part.
    pub fn project_part(&self, id: &str) -> Result<ProjectPart, DocumentError> {
        self.project_parts.read().project(id).cloned()
    }

    /// Snapshot of the unsaved buffers.
    pub fn unsaved_files(&self) -> UnsavedFiles {
        self.host.unsaved_files()
    }

    /// Documents that owe a reparse.
    pub fn dirty_documents(&self) -> Vec<Document<E>> {
        self.documents()
            .into_iter()
            .filter(|document| document.is_needing_reparse().unwrap_or(false))
            .collect()
    }

    /// Dirty documents visible in an editor other than the focused one.
    pub fn dirty_and_visible_but_not_current_documents(&self) -> Vec<Document<E>> {
        self.documents()
            .into_iter()
            .filter(|document| {
                document.is_needing_reparse().unwrap_or(false)
                    && document.is_visible_in_editor().unwrap_or(false)
                    && !document.is_used_by_current_editor().unwrap_or(false)
            })
            .collect()
    }

    /// The document shown in the focused editor, if any.
    pub fn current_editor_document(&self) -> Option<Document<E>> {
        self.documents()
            .into_iter()
            .find(|document| document.is_used_by_current_editor().unwrap_or(false))
    }

    /// All watched paths, sorted.
    pub fn watched_files(&self) -> Vec<PathBuf> {
        self.host.watches.lock().watched_files()
    }

    /// Returns whether `file_path` is watched.
    pub fn is_watched(&self, file_path: &Path) -> bool {
        self.host.watches.lock().is_watched(file_path)
    }

    fn create_document(&self, container: &FileContainer) -> Result<Document<E>, DocumentError> {
        let project_part = self.project_part(&container.project_part_id)?;
        let host: Arc<dyn DocumentHost> = self.host.clone();

        let document = Document::new(
            container.file_path.clone(),
            project_part,
            container.file_arguments.clone(),
            self.engine.clone(),
            host,
            self.file_exists_check,
        )?;
        document.set_document_revision(container.document_revision)?;

        match self.documents.write().entry(Self::key_for(container)) {
            Entry::Occupied(entry) => {
                let key = entry.key();
                return Err(DocumentError::DocumentAlreadyExists {
                    path: key.file_path.clone(),
                    project_part_id: key.project_part_id.clone(),
                });
            }
            Entry::Vacant(entry) => {
                self.host.watches.lock().register_document(entry.key());
                entry.insert(document.clone());
            }
        }
        debug!("Document created: {}", document);

        Ok(document)
    }

    fn store_unsaved_content(&self, file_path: &Path, content: &str) {
        self.host
            .unsaved_files
            .write()
            .create_or_update(file_path, content);
    }

    fn documents_with_file_path(&self, file_path: &Path) -> Vec<Document<E>> {
        self.documents()
            .into_iter()
            .filter(|document| document.file_path().is_ok_and(|p| p == file_path))
            .collect()
    }

    fn documents_with_project_part(&self, id: &str) -> Vec<Document<E>> {
        self.documents()
            .into_iter()
            .filter(|document| document.project_part_id().is_ok_and(|p| p == id))
            .collect()
    }

    fn check_if_project_parts_exist(&self, containers: &[FileContainer]) -> Result<(), DocumentError> {
        let project_parts = self.project_parts.read();
        for container in containers {
            project_parts.project(&container.project_part_id)?;
        }
        Ok(())
    }

    fn check_if_documents_do_not_exist(
        &self,
        containers: &[FileContainer],
    ) -> Result<(), DocumentError> {
        let documents = self.documents.read();
        let mut seen = HashSet::new();
        for container in containers {
            let key = Self::key_for(container);
            if documents.contains_key(&key) || !seen.insert(key.clone()) {
                return Err(DocumentError::DocumentAlreadyExists {
                    path: key.file_path,
                    project_part_id: key.project_part_id,
                });
            }
        }
        Ok(())
    }

    fn key_for(container: &FileContainer) -> DocumentKey {
        DocumentKey::new(container.file_path.clone(), container.project_part_id.clone())
    }

    fn does_not_exist(key: &DocumentKey) -> DocumentError {
        DocumentError::DocumentDoesNotExist {
            path: key.file_path.clone(),
            project_part_id: key.project_part_id.clone(),
        }
    }
}
