//! Status command implementation

use miette::Result;

use crate::cli::Cli;
use crate::output::{DocumentReport, output_status};
use crate::session::Session;

pub fn run_status(cli: &Cli, format: &str) -> Result<bool> {
    let session = Session::load(cli.config.as_deref())?;
    let documents = session.select(&[])?;

    let failed = session.parse(&documents)?;
    let reports = DocumentReport::collect(&documents)?;
    output_status(&reports, format)?;

    Ok(failed > 0)
}
