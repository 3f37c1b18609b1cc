//! Boundary to the parsing engine that produces translation units.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::EngineError;
use crate::unsaved_files::UnsavedFiles;

/// Inputs handed to the engine for one parse or reparse.
#[derive(Debug, Clone, Copy)]
pub struct ParseRequest<'a> {
    /// Primary file.
    pub file_path: &'a Path,
    /// Project part arguments followed by per-file arguments.
    pub arguments: &'a [String],
    /// Unsaved buffers that take precedence over disk content.
    pub unsaved_files: &'a UnsavedFiles,
}

/// A parser engine.
///
/// Engine failures are ordinary outcomes (syntax errors, unreadable files)
/// and are reported through `Err`; they never panic across this boundary.
pub trait ParseEngine: Send + Sync + 'static {
    /// Per-document engine index.
    type Index: Send + 'static;
    /// A parsed translation unit.
    type Unit: Send + 'static;

    /// Creates a fresh index.
    fn create_index(&self) -> Self::Index;

    /// Parses the primary file from scratch.
    fn parse(
        &self,
        index: &mut Self::Index,
        request: &ParseRequest<'_>,
    ) -> Result<Self::Unit, EngineError>;

    /// Incrementally reparses an existing unit against current buffers.
    fn reparse(&self, unit: &mut Self::Unit, request: &ParseRequest<'_>)
    -> Result<(), EngineError>;

    /// Files the unit transitively read, excluding or including the primary file.
    fn dependencies(&self, unit: &Self::Unit) -> HashSet<PathBuf>;
}
