//! Project parts: named compile configurations.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::DocumentError;
use crate::time_point::TimePoint;

/// A compile configuration (flags, defines, include paths) shared by source files.
///
/// A project part is a value: changing its arguments produces a new value with
/// a fresh change time point, which documents compare against the time of
/// their last full parse.
#[derive(Debug, Clone)]
pub struct ProjectPart {
    id: String,
    arguments: Arc<[String]>,
    last_change_time_point: TimePoint,
}

impl ProjectPart {
    /// Creates a project part, stamped with the current time.
    pub fn new(id: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            id: id.into(),
            arguments: arguments.into(),
            last_change_time_point: TimePoint::now(),
        }
    }

    /// The project part id.
    pub fn project_part_id(&self) -> &str {
        &self.id
    }

    /// Compile arguments.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// When this configuration last changed.
    pub fn last_change_time_point(&self) -> TimePoint {
        self.last_change_time_point
    }

    /// Replaces the arguments and bumps the change time point.
    pub fn set_arguments(&mut self, arguments: Vec<String>) {
        self.arguments = arguments.into();
        self.last_change_time_point = TimePoint::now();
    }

    /// Drops all arguments, bumping the change time point.
    pub fn clear(&mut self) {
        self.set_arguments(Vec::new());
    }
}

impl PartialEq for ProjectPart {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.arguments == other.arguments
    }
}

impl Eq for ProjectPart {}

/// Registry of known project parts, keyed by id.
#[derive(Debug, Default)]
pub struct ProjectParts {
    parts: HashMap<String, ProjectPart>,
}

impl ProjectParts {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts new parts and updates existing ones.
    ///
    /// An existing part only gets a new change time point if its arguments
    /// actually differ. Returns the ids whose configuration changed.
    pub fn create_or_update(&mut self, parts: Vec<ProjectPart>) -> Vec<String> {
        let mut changed = Vec::new();

        for part in parts {
            match self.parts.get_mut(part.project_part_id()) {
                Some(existing) => {
                    if existing.arguments() != part.arguments() {
                        debug!("Project part changed: {}", part.project_part_id());
                        existing.set_arguments(part.arguments().to_vec());
                        changed.push(part.project_part_id().to_string());
                    }
                }
                None => {
                    debug!("Project part added: {}", part.project_part_id());
                    changed.push(part.project_part_id().to_string());
                    self.parts.insert(part.project_part_id().to_string(), part);
                }
            }
        }

        changed
    }

    /// Removes parts by id. Fails on the first unknown id; earlier ids stay removed.
    pub fn remove(&mut self, ids: &[String]) -> Result<(), DocumentError> {
        for id in ids {
            if self.parts.remove(id).is_none() {
                return Err(DocumentError::ProjectPartDoesNotExist { id: id.clone() });
            }
        }
        Ok(())
    }

    /// Looks up a part by id.
    pub fn project(&self, id: &str) -> Result<&ProjectPart, DocumentError> {
        self.parts
            .get(id)
            .ok_or_else(|| DocumentError::ProjectPartDoesNotExist { id: id.to_string() })
    }

    /// Returns whether a part with this id exists.
    pub fn has_project_part(&self, id: &str) -> bool {
        self.parts.contains_key(id)
    }

    /// Iterates over all parts.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectPart> {
        self.parts.values()
    }

    /// Number of registered parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns whether no parts are registered.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
