//! ucache CLI
//!
//! Drives the translation-unit cache over a configured set of source files.

mod cli;
mod commands;
mod output;
mod session;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(has_failures) => {
            if has_failures {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Commands::Deps { files, format } => commands::deps::run_deps(cli, files, format),
        Commands::Status { format } => commands::status::run_status(cli, format),
        Commands::Touch {
            path,
            files,
            format,
        } => commands::touch::run_touch(cli, path, files, format),
    }
}
