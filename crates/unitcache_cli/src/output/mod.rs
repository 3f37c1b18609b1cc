//! Output formatting module

mod json;
mod text;

use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use unitcache_core::DocumentError;

use crate::session::ScanDocument;

/// Snapshot of one document for printing.
#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub project_part: String,
    pub revision: u32,
    pub intact: bool,
    pub dirty: bool,
    pub failed: bool,
    pub dependencies: Vec<PathBuf>,
    pub unresolved: Vec<String>,
}

impl DocumentReport {
    pub fn from_document(document: &ScanDocument) -> Result<Self, DocumentError> {
        let mut dependencies: Vec<_> = match document.depended_file_paths() {
            Ok(paths) => paths.into_iter().collect(),
            Err(DocumentError::FileDoesNotExist { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        dependencies.sort();

        let unresolved = document.with_translation_unit(|unit| {
            unit.unit()
                .map(|scanned| scanned.unresolved().iter().cloned().collect::<Vec<_>>())
                .unwrap_or_default()
        })?;

        Ok(Self {
            path: document.file_path()?.to_path_buf(),
            project_part: document.project_part_id()?.to_string(),
            revision: document.document_revision()?,
            intact: document.is_intact(),
            dirty: document.is_needing_reparse()?,
            failed: document.has_parse_or_reparse_failed()?,
            dependencies,
            unresolved,
        })
    }

    pub fn collect(documents: &[ScanDocument]) -> Result<Vec<Self>> {
        documents
            .iter()
            .map(Self::from_document)
            .collect::<Result<Vec<_>, _>>()
            .into_diagnostic()
    }
}

pub fn output_dependencies(reports: &[DocumentReport], format: &str) -> Result<()> {
    match format {
        "json" => json::output_json(reports)?,
        _ => text::output_dependencies(reports),
    }
    Ok(())
}

pub fn output_status(reports: &[DocumentReport], format: &str) -> Result<()> {
    match format {
        "json" => json::output_json(reports)?,
        _ => text::output_status(reports),
    }
    Ok(())
}
