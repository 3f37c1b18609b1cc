//! The cache entry for one file parsed under one project part.
//!
//! A [`Document`] is a cheap handle over reference-counted state. Clones share
//! that state, including the engine handles, which are disposed once when the
//! last clone is dropped.
//!
//! Staleness is tracked with two time points:
//!
//! - the project part's change time point against the time of the last full
//!   parse decides whether a parse from scratch is owed;
//! - the dirty time point recorded by [`Document::set_dirty`] is copied into
//!   each update snapshot, and a reparse result only clears the dirty flag if
//!   it was based on the latest dirty event.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::engine::ParseEngine;
use crate::error::DocumentError;
use crate::file_container::FileContainer;
use crate::project_part::ProjectPart;
use crate::time_point::TimePoint;
use crate::translation_unit::{TranslationUnit, UnitHandles};
use crate::unsaved_files::UnsavedFiles;
use crate::updater::{UpdateInput, UpdateMode, UpdateResult};

/// What a document needs from the collection that owns it.
pub trait DocumentHost: Send + Sync {
    /// Snapshot of the unsaved buffers.
    fn unsaved_files(&self) -> UnsavedFiles;

    /// Replaces the set of files watched on behalf of `document`.
    fn add_watched_files(&self, document: &DocumentKey, file_paths: &HashSet<PathBuf>);
}

/// Identity of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    /// Primary file path.
    pub file_path: PathBuf,
    /// Project part id.
    pub project_part_id: String,
}

impl DocumentKey {
    /// Creates a key.
    pub fn new(file_path: impl Into<PathBuf>, project_part_id: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            project_part_id: project_part_id.into(),
        }
    }
}

/// Whether construction verifies that the primary file exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileExistsCheck {
    /// Fail construction with `FileDoesNotExist` if the file is missing.
    #[default]
    Check,
    /// Skip the check.
    DoNotCheck,
}

#[derive(Debug)]
struct DocumentState {
    project_part: ProjectPart,
    last_project_part_change_time_point: TimePoint,
    depended_file_paths: HashSet<PathBuf>,
    document_revision: u32,
    needs_to_be_reparsed_change_time_point: TimePoint,
    has_parse_or_reparse_failed: bool,
    needs_to_be_reparsed: bool,
    is_used_by_current_editor: bool,
    is_visible_in_editor: bool,
}

struct DocumentData<E: ParseEngine> {
    key: DocumentKey,
    file_arguments: Vec<String>,
    engine: Arc<E>,
    host: Arc<dyn DocumentHost>,
    state: Mutex<DocumentState>,
    handles: Mutex<UnitHandles<E>>,
}

/// A cached translation unit and its validity state.
pub struct Document<E: ParseEngine> {
    d: Option<Arc<DocumentData<E>>>,
}

impl<E: ParseEngine> Document<E> {
    /// Creates an unparsed document.
    pub fn new(
        file_path: impl Into<PathBuf>,
        project_part: ProjectPart,
        file_arguments: Vec<String>,
        engine: Arc<E>,
        host: Arc<dyn DocumentHost>,
        file_exists_check: FileExistsCheck,
    ) -> Result<Self, DocumentError> {
        let file_path = file_path.into();
        let now = TimePoint::now();

        let mut depended_file_paths = HashSet::new();
        depended_file_paths.insert(file_path.clone());

        let document = Self {
            d: Some(Arc::new(DocumentData {
                key: DocumentKey::new(file_path, project_part.project_part_id()),
                file_arguments,
                engine,
                host,
                state: Mutex::new(DocumentState {
                    project_part,
                    last_project_part_change_time_point: now,
                    depended_file_paths,
                    document_revision: 0,
                    needs_to_be_reparsed_change_time_point: now,
                    has_parse_or_reparse_failed: false,
                    needs_to_be_reparsed: false,
                    is_used_by_current_editor: false,
                    is_visible_in_editor: false,
                }),
                handles: Mutex::new(UnitHandles::new()),
            })),
        };

        if file_exists_check == FileExistsCheck::Check {
            document.check_if_file_exists()?;
        }

        Ok(document)
    }

    /// Releases this handle's share of the state.
    pub fn reset(&mut self) {
        self.d = None;
    }

    /// Returns whether this handle has been reset.
    pub fn is_null(&self) -> bool {
        self.d.is_none()
    }

    /// Returns whether cached data may be trusted: not null, the file exists,
    /// and the last parse or reparse did not fail.
    pub fn is_intact(&self) -> bool {
        match &self.d {
            Some(d) => d.key.file_path.exists() && !d.state.lock().has_parse_or_reparse_failed,
            None => false,
        }
    }

    /// Checks on disk whether the primary file exists.
    pub fn file_exists(&self) -> bool {
        self.d.as_ref().is_some_and(|d| d.key.file_path.exists())
    }

    /// Identity of this document.
    pub fn key(&self) -> Result<&DocumentKey, DocumentError> {
        Ok(&self.data()?.key)
    }

    /// Primary file path.
    pub fn file_path(&self) -> Result<&Path, DocumentError> {
        Ok(&self.data()?.key.file_path)
    }

    /// Per-file compile arguments.
    pub fn file_arguments(&self) -> Result<&[String], DocumentError> {
        Ok(&self.data()?.file_arguments)
    }

    /// Project part id.
    pub fn project_part_id(&self) -> Result<&str, DocumentError> {
        Ok(&self.data()?.key.project_part_id)
    }

    /// Current project part.
    pub fn project_part(&self) -> Result<ProjectPart, DocumentError> {
        Ok(self.state()?.project_part.clone())
    }

    /// Replaces the project part. The id must match the document's.
    pub fn set_project_part(&self, project_part: ProjectPart) -> Result<(), DocumentError> {
        let d = self.data()?;
        if project_part.project_part_id() != d.key.project_part_id {
            warn!(
                "Ignoring project part {} for document {}",
                project_part.project_part_id(),
                self
            );
            return Ok(());
        }
        d.state.lock().project_part = project_part;
        Ok(())
    }

    /// Request payload describing this document.
    pub fn file_container(&self) -> Result<FileContainer, DocumentError> {
        let d = self.data()?;
        Ok(
            FileContainer::new(d.key.file_path.clone(), d.key.project_part_id.clone())
                .with_file_arguments(d.file_arguments.clone())
                .with_revision(d.state.lock().document_revision),
        )
    }

    /// Time of the last full parse, or creation time before the first parse.
    pub fn last_project_part_change_time_point(&self) -> Result<TimePoint, DocumentError> {
        Ok(self.state()?.last_project_part_change_time_point)
    }

    /// Returns whether the project part changed at or after the last full parse.
    pub fn is_project_part_outdated(&self) -> Result<bool, DocumentError> {
        let state = self.state()?;
        Ok(state.project_part.last_change_time_point()
            >= state.last_project_part_change_time_point)
    }

    /// Editor buffer revision.
    pub fn document_revision(&self) -> Result<u32, DocumentError> {
        Ok(self.state()?.document_revision)
    }

    /// Sets the editor buffer revision.
    pub fn set_document_revision(&self, revision: u32) -> Result<(), DocumentError> {
        self.state()?.document_revision = revision;
        Ok(())
    }

    /// Whether the document is shown in the focused editor.
    pub fn is_used_by_current_editor(&self) -> Result<bool, DocumentError> {
        Ok(self.state()?.is_used_by_current_editor)
    }

    /// Marks the document as shown in the focused editor.
    pub fn set_is_used_by_current_editor(&self, used: bool) -> Result<(), DocumentError> {
        self.state()?.is_used_by_current_editor = used;
        Ok(())
    }

    /// Whether the document is visible in any editor.
    pub fn is_visible_in_editor(&self) -> Result<bool, DocumentError> {
        Ok(self.state()?.is_visible_in_editor)
    }

    /// Marks the document as visible in an editor.
    pub fn set_is_visible_in_editor(&self, visible: bool) -> Result<(), DocumentError> {
        self.state()?.is_visible_in_editor = visible;
        Ok(())
    }

    /// Time of the latest dirty event.
    pub fn needs_to_be_reparsed_change_time_point(&self) -> Result<TimePoint, DocumentError> {
        Ok(self.state()?.needs_to_be_reparsed_change_time_point)
    }

    /// Returns whether a reparse is owed.
    pub fn is_needing_reparse(&self) -> Result<bool, DocumentError> {
        Ok(self.state()?.needs_to_be_reparsed)
    }

    /// Returns whether the last parse or reparse failed.
    pub fn has_parse_or_reparse_failed(&self) -> Result<bool, DocumentError> {
        Ok(self.state()?.has_parse_or_reparse_failed)
    }

    /// Marks the document dirty if its project part is outdated.
    ///
    /// Returns whether the document was marked.
    pub fn set_dirty_if_project_part_is_outdated(&self) -> Result<bool, DocumentError> {
        if self.is_project_part_outdated()? {
            self.set_dirty()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Marks the document dirty if it depends on `file_path`.
    ///
    /// A change to the document's own file is ignored once that file is gone
    /// from disk. Returns whether the document was marked.
    pub fn set_dirty_if_dependency_is_met(&self, file_path: &Path) -> Result<bool, DocumentError> {
        let d = self.data()?;
        let depends = d.state.lock().depended_file_paths.contains(file_path);

        if depends && self.is_main_file_and_exists_or_is_other_file(file_path)? {
            self.set_dirty()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Marks the document dirty with a fresh time point.
    pub fn set_dirty(&self) -> Result<(), DocumentError> {
        let mut state = self.state()?;
        state.needs_to_be_reparsed_change_time_point = TimePoint::now();
        state.needs_to_be_reparsed = true;
        drop(state);

        debug!("Document dirty: {}", self);
        Ok(())
    }

    /// Snapshot consumed by the updater.
    ///
    /// The dirty time point, the needs flags and the project part are read
    /// under one lock, so a concurrent [`set_dirty`](Self::set_dirty) lands
    /// either entirely before or entirely after the snapshot.
    pub fn create_update_input(&self) -> Result<UpdateInput, DocumentError> {
        let d = self.data()?;
        let state = d.state.lock();

        Ok(UpdateInput {
            parse_needed: state.project_part.last_change_time_point()
                >= state.last_project_part_change_time_point,
            reparse_needed: state.needs_to_be_reparsed,
            needs_to_be_reparsed_change_time_point: state.needs_to_be_reparsed_change_time_point,
            file_path: d.key.file_path.clone(),
            file_arguments: d.file_arguments.clone(),
            unsaved_files: d.host.unsaved_files(),
            project_id: state.project_part.project_part_id().to_string(),
            project_arguments: state.project_part.arguments().to_vec(),
        })
    }

    /// Parses the document if it has no translation unit or its project part
    /// is outdated, then incorporates the result.
    pub fn parse(&self) -> Result<(), DocumentError> {
        self.run_update(|unit, input| unit.parse(input))
    }

    /// Reparses the existing translation unit, then incorporates the result.
    pub fn reparse(&self) -> Result<(), DocumentError> {
        self.run_update(|unit, input| unit.reparse(input))
    }

    /// Parses if needed and reparses if dirty, then incorporates the result.
    pub fn update(&self) -> Result<(), DocumentError> {
        self.run_update(|unit, input| unit.update(input, UpdateMode::AsNeeded))
    }

    fn run_update(
        &self,
        run: impl FnOnce(&mut TranslationUnit<'_, E>, UpdateInput) -> UpdateResult,
    ) -> Result<(), DocumentError> {
        let d = self.data()?;
        let mut handles = d.handles.lock();

        let input = self.create_update_input()?;
        let result = {
            let mut unit = TranslationUnit::new(&*d.engine, &d.key.file_path, &mut handles);
            run(&mut unit, input)
        };

        self.incorporate_updater_result(&result)
    }

    /// Applies an update result to the document state.
    ///
    /// This is the only place that changes the dependency set, the failure
    /// latch and the configuration baseline, and the only place that clears
    /// the dirty flag.
    pub fn incorporate_updater_result(&self, result: &UpdateResult) -> Result<(), DocumentError> {
        let d = self.data()?;

        let watched = {
            let mut state = d.state.lock();

            state.has_parse_or_reparse_failed = result.has_parse_or_reparse_failed;
            if state.has_parse_or_reparse_failed {
                state.needs_to_be_reparsed = false;
                drop(state);
                debug!("Update failed: {}", self);
                return Ok(());
            }

            if let Some(parse_time_point) = result.parse_time_point {
                state.last_project_part_change_time_point = parse_time_point;
            }

            let mut watched = None;
            if result.parse_time_point_is_set() || result.reparsed {
                let mut paths = result.depended_on_file_paths.clone();
                paths.insert(d.key.file_path.clone());
                state.depended_file_paths = paths;
                watched = Some(state.depended_file_paths.clone());
            }

            if result.reparsed
                && result.needs_to_be_reparsed_change_time_point
                    == Some(state.needs_to_be_reparsed_change_time_point)
            {
                state.needs_to_be_reparsed = false;
            }

            watched
        };

        if let Some(paths) = watched {
            debug!("Document {} depends on {} files", self, paths.len());
            d.host.add_watched_files(&d.key, &paths);
        }

        Ok(())
    }

    /// Files the last successful parse depended on.
    ///
    /// Fails with `FileDoesNotExist` if the primary file is gone.
    pub fn depended_file_paths(&self) -> Result<HashSet<PathBuf>, DocumentError> {
        let d = self.data()?;
        self.check_if_file_exists()?;
        Ok(d.state.lock().depended_file_paths.clone())
    }

    /// Runs `f` with read access to the translation unit.
    ///
    /// Blocks while an update of this document is in flight.
    pub fn with_translation_unit<R>(
        &self,
        f: impl FnOnce(&TranslationUnit<'_, E>) -> R,
    ) -> Result<R, DocumentError> {
        let d = self.data()?;
        let mut handles = d.handles.lock();
        let unit = TranslationUnit::new(&*d.engine, &d.key.file_path, &mut handles);
        Ok(f(&unit))
    }

    fn data(&self) -> Result<&Arc<DocumentData<E>>, DocumentError> {
        self.d.as_ref().ok_or(DocumentError::DocumentIsNull)
    }

    fn state(&self) -> Result<parking_lot::MutexGuard<'_, DocumentState>, DocumentError> {
        Ok(self.data()?.state.lock())
    }

    fn check_if_file_exists(&self) -> Result<(), DocumentError> {
        let d = self.data()?;
        if !d.key.file_path.exists() {
            return Err(DocumentError::file_does_not_exist(&d.key.file_path));
        }
        Ok(())
    }

    fn is_main_file_and_exists_or_is_other_file(
        &self,
        file_path: &Path,
    ) -> Result<bool, DocumentError> {
        let d = self.data()?;
        if file_path == d.key.file_path {
            return Ok(d.key.file_path.exists());
        }
        Ok(true)
    }
}

impl<E: ParseEngine> Clone for Document<E> {
    fn clone(&self) -> Self {
        Self { d: self.d.clone() }
    }
}

impl<E: ParseEngine> PartialEq for Document<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key().ok() == other.key().ok()
    }
}

impl<E: ParseEngine> Eq for Document<E> {}

impl<E: ParseEngine> Hash for Document<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().ok().hash(state);
    }
}

impl<E: ParseEngine> fmt::Display for Document<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.d {
            Some(d) => write!(
                f,
                "Document({}, {}, {})",
                d.key.file_path.display(),
                d.key.project_part_id,
                d.state.lock().document_revision
            ),
            None => f.write_str("Document(null)"),
        }
    }
}

impl<E: ParseEngine> fmt::Debug for Document<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.d {
            Some(d) => f
                .debug_struct("Document")
                .field("key", &d.key)
                .field("file_arguments", &d.file_arguments)
                .field("state", &*d.state.lock())
                .finish(),
            None => f.write_str("Document(null)"),
        }
    }
}
