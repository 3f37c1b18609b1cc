//! Request payload describing one file under one project part.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identifies a document and carries the editor state that came with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContainer {
    /// Primary file path.
    pub file_path: PathBuf,
    /// Project part the file is compiled under.
    pub project_part_id: String,
    /// Extra per-file compile arguments.
    #[serde(default)]
    pub file_arguments: Vec<String>,
    /// Editor buffer content, if the file has unsaved changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsaved_content: Option<String>,
    /// Editor buffer revision.
    #[serde(default)]
    pub document_revision: u32,
}

impl FileContainer {
    /// Creates a container without unsaved content.
    pub fn new(file_path: impl Into<PathBuf>, project_part_id: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            project_part_id: project_part_id.into(),
            file_arguments: Vec::new(),
            unsaved_content: None,
            document_revision: 0,
        }
    }

    /// Sets the per-file arguments.
    pub fn with_file_arguments(mut self, arguments: Vec<String>) -> Self {
        self.file_arguments = arguments;
        self
    }

    /// Attaches unsaved buffer content.
    pub fn with_unsaved_content(mut self, content: impl Into<String>) -> Self {
        self.unsaved_content = Some(content.into());
        self
    }

    /// Sets the document revision.
    pub fn with_revision(mut self, revision: u32) -> Self {
        self.document_revision = revision;
        self
    }

    /// Primary file path.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Returns whether the container carries unsaved content.
    pub fn has_unsaved_content(&self) -> bool {
        self.unsaved_content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let container = FileContainer::new("/src/a.cpp", "app")
            .with_file_arguments(vec!["-DX".to_string()])
            .with_unsaved_content("int a;")
            .with_revision(3);

        assert_eq!(container.file_path(), Path::new("/src/a.cpp"));
        assert_eq!(container.project_part_id, "app");
        assert!(container.has_unsaved_content());
        assert_eq!(container.document_revision, 3);
    }

    #[test]
    fn test_deserialize_defaults() {
        let container: FileContainer =
            serde_json::from_str(r#"{"file_path": "/src/a.cpp", "project_part_id": "app"}"#)
                .unwrap();

        assert!(container.file_arguments.is_empty());
        assert!(!container.has_unsaved_content());
        assert_eq!(container.document_revision, 0);
    }
}
