//! Translation unit updates: parse from scratch or reparse incrementally.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::engine::{ParseEngine, ParseRequest};
use crate::error::EngineError;
use crate::handle::NativeHandle;
use crate::time_point::TimePoint;
use crate::unsaved_files::UnsavedFiles;

/// Snapshot of a document taken right before an update.
#[derive(Debug, Clone)]
pub struct UpdateInput {
    /// The project part changed since the last full parse.
    pub parse_needed: bool,
    /// The document is dirty.
    pub reparse_needed: bool,
    /// Dirty time point as of the snapshot.
    pub needs_to_be_reparsed_change_time_point: TimePoint,
    /// Primary file.
    pub file_path: PathBuf,
    /// Per-file arguments.
    pub file_arguments: Vec<String>,
    /// Unsaved buffers as of the snapshot.
    pub unsaved_files: UnsavedFiles,
    /// Project part id.
    pub project_id: String,
    /// Project part arguments.
    pub project_arguments: Vec<String>,
}

impl UpdateInput {
    /// Project arguments followed by file arguments.
    pub fn arguments(&self) -> Vec<String> {
        self.project_arguments
            .iter()
            .chain(&self.file_arguments)
            .cloned()
            .collect()
    }
}

/// Outcome of an update.
#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
    /// The parse or reparse failed.
    pub has_parse_or_reparse_failed: bool,
    /// Set when a full parse succeeded: the time the parse started.
    pub parse_time_point: Option<TimePoint>,
    /// Set when a reparse ran: the time the reparse started.
    pub reparse_time_point: Option<TimePoint>,
    /// An incremental reparse succeeded.
    pub reparsed: bool,
    /// Files the new unit depends on.
    pub depended_on_file_paths: HashSet<PathBuf>,
    /// Dirty time point the reparse was based on.
    pub needs_to_be_reparsed_change_time_point: Option<TimePoint>,
}

impl UpdateResult {
    /// Returns whether a full parse established a new configuration baseline.
    pub fn parse_time_point_is_set(&self) -> bool {
        self.parse_time_point.is_some()
    }

    /// A failed result.
    pub fn failed() -> Self {
        Self {
            has_parse_or_reparse_failed: true,
            ..Self::default()
        }
    }
}

/// Which steps an update performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Parse if needed, then reparse if the document is dirty.
    AsNeeded,
    /// Parse if there is no unit yet or the project part changed.
    ParseIfNeeded,
    /// Reparse the existing unit unconditionally.
    ForceReparse,
}

/// Runs one update against a document's engine handles.
pub struct TranslationUnitUpdater<'a, E: ParseEngine> {
    engine: &'a E,
    index: &'a mut NativeHandle<E::Index>,
    unit: &'a mut NativeHandle<E::Unit>,
    input: UpdateInput,
    arguments: Vec<String>,
    out: UpdateResult,
}

impl<'a, E: ParseEngine> TranslationUnitUpdater<'a, E> {
    /// Creates an updater over the given handles.
    pub fn new(
        engine: &'a E,
        index: &'a mut NativeHandle<E::Index>,
        unit: &'a mut NativeHandle<E::Unit>,
        input: UpdateInput,
    ) -> Self {
        let arguments = input.arguments();
        Self {
            engine,
            index,
            unit,
            input,
            arguments,
            out: UpdateResult::default(),
        }
    }

    /// Performs the update and returns its result.
    pub fn update(mut self, mode: UpdateMode) -> UpdateResult {
        match mode {
            UpdateMode::AsNeeded => {
                self.recreate_and_parse_if_needed();
                if !self.out.has_parse_or_reparse_failed {
                    self.reparse_if_needed();
                }
            }
            UpdateMode::ParseIfNeeded => self.recreate_and_parse_if_needed(),
            UpdateMode::ForceReparse => self.reparse(),
        }

        self.out
    }

    fn recreate_and_parse_if_needed(&mut self) {
        self.remove_translation_unit_if_project_part_was_changed();
        self.create_translation_unit_if_needed();
    }

    fn remove_translation_unit_if_project_part_was_changed(&mut self) {
        if self.input.parse_needed {
            self.unit.dispose();
        }
    }

    fn create_translation_unit_if_needed(&mut self) {
        if !self.unit.is_null() {
            return;
        }

        let engine = self.engine;
        let parse_time_point = TimePoint::now();
        debug!("Parsing {}", self.input.file_path.display());

        self.index.get_or_insert_with(|| engine.create_index());
        let request = ParseRequest {
            file_path: &self.input.file_path,
            arguments: &self.arguments,
            unsaved_files: &self.input.unsaved_files,
        };
        let parsed = match self.index.get_mut() {
            Some(index) => engine.parse(index, &request),
            None => Err(EngineError::Parse("index unavailable".to_string())),
        };

        match parsed {
            Ok(unit) => {
                self.out.depended_on_file_paths = self.collect_dependencies(&unit);
                self.unit.replace(unit);
                self.out.parse_time_point = Some(parse_time_point);
            }
            Err(e) => {
                warn!("Parsing {} failed: {}", self.input.file_path.display(), e);
                self.out.has_parse_or_reparse_failed = true;
            }
        }
    }

    fn reparse_if_needed(&mut self) {
        if self.input.reparse_needed {
            self.reparse();
        }
    }

    fn reparse(&mut self) {
        let reparse_time_point = TimePoint::now();
        debug!("Reparsing {}", self.input.file_path.display());

        self.out.reparse_time_point = Some(reparse_time_point);
        self.out.needs_to_be_reparsed_change_time_point =
            Some(self.input.needs_to_be_reparsed_change_time_point);

        let engine = self.engine;
        let request = ParseRequest {
            file_path: &self.input.file_path,
            arguments: &self.arguments,
            unsaved_files: &self.input.unsaved_files,
        };
        let outcome = match self.unit.get_mut() {
            Some(unit) => engine.reparse(unit, &request),
            None => Err(EngineError::NoTranslationUnit),
        };

        match outcome {
            Ok(()) => {
                if let Some(unit) = self.unit.get() {
                    self.out.depended_on_file_paths = self.collect_dependencies(unit);
                }
                self.out.reparsed = true;
            }
            Err(e) => {
                warn!("Reparsing {} failed: {}", self.input.file_path.display(), e);
                self.out.has_parse_or_reparse_failed = true;
                self.unit.dispose();
            }
        }
    }

    fn collect_dependencies(&self, unit: &E::Unit) -> HashSet<PathBuf> {
        let mut paths = self.engine.dependencies(unit);
        paths.insert(self.input.file_path.clone());
        paths
    }
}
