//! JSON output formatter

use miette::{IntoDiagnostic, Result};

use super::DocumentReport;

pub fn output_json(reports: &[DocumentReport]) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(reports).into_diagnostic()?
    );
    Ok(())
}
