//! Loads the configuration and builds the document collection.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::{IntoDiagnostic, Result, miette};
use rayon::prelude::*;
use tracing::{debug, info};
use unitcache_core::{
    CacheConfig, Document, DocumentError, Documents, FileExistsCheck, IncludeScanEngine,
    NullWatcher, normalize_path,
};

pub type ScanDocument = Document<IncludeScanEngine>;

pub struct Session {
    cwd: PathBuf,
    documents: Documents<IncludeScanEngine>,
}

impl Session {
    /// Loads `config_path`, or the configuration discovered from the working
    /// directory, and registers its project parts and documents.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir().into_diagnostic()?;
        let config = match config_path {
            Some(path) => CacheConfig::from_file(cwd.join(path)).into_diagnostic()?,
            None => find_config(&cwd)?,
        };

        let file_exists_check = if config.check_file_exists {
            FileExistsCheck::Check
        } else {
            FileExistsCheck::DoNotCheck
        };
        let documents = Documents::new(Arc::new(IncludeScanEngine::new()), Box::new(NullWatcher))
            .with_file_exists_check(file_exists_check);

        documents.create_or_update_project_parts(config.project_parts());
        let created = documents
            .create(&config.file_containers())
            .into_diagnostic()?;
        debug!("{} documents registered", created.len());

        Ok(Self { cwd, documents })
    }

    pub fn documents(&self) -> &Documents<IncludeScanEngine> {
        &self.documents
    }

    /// Resolves a command-line path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        normalize_path(&self.cwd.join(path))
    }

    /// Documents of the given files, or every document if `files` is empty.
    pub fn select(&self, files: &[PathBuf]) -> Result<Vec<ScanDocument>> {
        let all = self.documents.documents();
        if files.is_empty() {
            return Ok(all);
        }

        let mut selected = Vec::new();
        for file in files {
            let path = self.resolve(file);
            let matching: Vec<_> = all
                .iter()
                .filter(|document| document.file_path().is_ok_and(|p| p == path.as_path()))
                .cloned()
                .collect();

            if matching.is_empty() {
                return Err(miette!("{} is not a configured document", file.display()));
            }
            selected.extend(matching);
        }

        Ok(selected)
    }

    /// Parses documents in parallel. Returns how many failed.
    pub fn parse(&self, documents: &[ScanDocument]) -> Result<usize> {
        Self::run_parallel(documents, ScanDocument::parse)
    }

    /// Parses or reparses documents as needed, in parallel. Returns how many failed.
    pub fn update(&self, documents: &[ScanDocument]) -> Result<usize> {
        Self::run_parallel(documents, ScanDocument::update)
    }

    fn run_parallel<F>(documents: &[ScanDocument], step: F) -> Result<usize>
    where
        F: Fn(&ScanDocument) -> Result<(), DocumentError> + Sync,
    {
        let outcomes = documents
            .par_iter()
            .map(|document| {
                step(document)?;
                document.has_parse_or_reparse_failed()
            })
            .collect::<Result<Vec<bool>, _>>()
            .into_diagnostic()?;

        Ok(outcomes.into_iter().filter(|failed| *failed).count())
    }
}

fn find_config(cwd: &Path) -> Result<CacheConfig> {
    let Some(path) = CacheConfig::discover(cwd) else {
        return Err(miette!(
            "No configuration file found (looked for {})",
            CacheConfig::CONFIG_FILES.join(", ")
        ));
    };

    info!("Using config: {}", path.display());
    CacheConfig::from_file(&path).into_diagnostic()
}
