//! Deps command implementation

use std::path::PathBuf;

use miette::Result;

use crate::cli::Cli;
use crate::output::{DocumentReport, output_dependencies};
use crate::session::Session;

pub fn run_deps(cli: &Cli, files: &[PathBuf], format: &str) -> Result<bool> {
    let session = Session::load(cli.config.as_deref())?;
    let documents = session.select(files)?;

    let failed = session.parse(&documents)?;
    let reports = DocumentReport::collect(&documents)?;
    output_dependencies(&reports, format)?;

    Ok(failed > 0)
}
