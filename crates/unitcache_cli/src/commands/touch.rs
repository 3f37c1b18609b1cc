//! Touch command implementation

use std::path::{Path, PathBuf};

use miette::Result;
use tracing::info;

use crate::cli::Cli;
use crate::output::{DocumentReport, output_status};
use crate::session::Session;

pub fn run_touch(cli: &Cli, path: &Path, files: &[PathBuf], format: &str) -> Result<bool> {
    let session = Session::load(cli.config.as_deref())?;
    let documents = session.select(files)?;
    session.parse(&documents)?;

    let changed = session.resolve(path);
    let dirtied = session
        .documents()
        .update_documents_with_changed_dependency(&changed);
    info!(
        "{} documents dirty after change to {}",
        dirtied.len(),
        changed.display()
    );

    let failed = session.update(&dirtied)?;
    let reports = DocumentReport::collect(&dirtied)?;
    output_status(&reports, format)?;

    Ok(failed > 0)
}
