//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by documents and the document collection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The document handle has been reset and no longer refers to any state.
    #[error("Document is null")]
    DocumentIsNull,

    /// The primary file of a document is missing on disk.
    #[error("File does not exist: {}", path.display())]
    FileDoesNotExist {
        /// Path of the missing file.
        path: PathBuf,
    },

    /// A document for the same file and project part is already registered.
    #[error("Document already exists: {} ({project_part_id})", path.display())]
    DocumentAlreadyExists {
        /// File path.
        path: PathBuf,
        /// Project part id.
        project_part_id: String,
    },

    /// No document is registered for the given file and project part.
    #[error("Document does not exist: {} ({project_part_id})", path.display())]
    DocumentDoesNotExist {
        /// File path.
        path: PathBuf,
        /// Project part id.
        project_part_id: String,
    },

    /// The project part id is unknown.
    #[error("Project part does not exist: {id}")]
    ProjectPartDoesNotExist {
        /// Project part id.
        id: String,
    },
}

impl DocumentError {
    /// Creates a `FileDoesNotExist` error.
    pub fn file_does_not_exist(path: impl Into<PathBuf>) -> Self {
        Self::FileDoesNotExist { path: path.into() }
    }
}

/// Errors reported by a parse engine.
///
/// These never escape an update: the updater records them as a failed result.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not read a source file.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A reparse was requested but no translation unit exists.
    #[error("No translation unit to reparse")]
    NoTranslationUnit,

    /// The engine rejected the input.
    #[error("Parse failed: {0}")]
    Parse(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for the expected schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but is inconsistent.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates an `Invalid` error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
