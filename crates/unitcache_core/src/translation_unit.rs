//! View over a document's engine handles.

use std::path::Path;

use crate::engine::ParseEngine;
use crate::handle::NativeHandle;
use crate::updater::{TranslationUnitUpdater, UpdateInput, UpdateMode, UpdateResult};

/// The engine handles owned by one document.
pub(crate) struct UnitHandles<E: ParseEngine> {
    pub(crate) index: NativeHandle<E::Index>,
    pub(crate) unit: NativeHandle<E::Unit>,
}

impl<E: ParseEngine> UnitHandles<E> {
    pub(crate) fn new() -> Self {
        Self {
            index: NativeHandle::null("index"),
            unit: NativeHandle::null("translation unit"),
        }
    }
}

/// A borrowed view of a document's translation unit.
///
/// Queries (completion, diagnostics, symbols) read the parsed unit through
/// this view. Updates go through the owning document so that their results
/// are always incorporated.
pub struct TranslationUnit<'a, E: ParseEngine> {
    engine: &'a E,
    file_path: &'a Path,
    handles: &'a mut UnitHandles<E>,
}

impl<'a, E: ParseEngine> TranslationUnit<'a, E> {
    pub(crate) fn new(engine: &'a E, file_path: &'a Path, handles: &'a mut UnitHandles<E>) -> Self {
        Self {
            engine,
            file_path,
            handles,
        }
    }

    /// Primary file of the unit.
    pub fn file_path(&self) -> &Path {
        self.file_path
    }

    /// Returns whether no unit has been parsed yet (or the last one was discarded).
    pub fn is_null(&self) -> bool {
        self.handles.unit.is_null()
    }

    /// The parsed unit.
    pub fn unit(&self) -> Option<&E::Unit> {
        self.handles.unit.get()
    }

    /// The engine that produced the unit.
    pub fn engine(&self) -> &E {
        self.engine
    }

    pub(crate) fn parse(&mut self, input: UpdateInput) -> UpdateResult {
        self.update(input, UpdateMode::ParseIfNeeded)
    }

    pub(crate) fn reparse(&mut self, input: UpdateInput) -> UpdateResult {
        self.update(input, UpdateMode::ForceReparse)
    }

    pub(crate) fn update(&mut self, input: UpdateInput, mode: UpdateMode) -> UpdateResult {
        let handles = &mut *self.handles;
        TranslationUnitUpdater::new(self.engine, &mut handles.index, &mut handles.unit, input)
            .update(mode)
    }
}
