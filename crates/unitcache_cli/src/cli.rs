//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ucache - Incremental translation-unit cache
#[derive(Parser)]
#[command(name = "ucache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse documents and print the files each one depends on
    Deps {
        /// Configured source files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Parse every configured document and print its cache state
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Report a file change and reparse the documents it dirties
    Touch {
        /// Changed file
        path: PathBuf,

        /// Configured source files to parse first (default: all)
        files: Vec<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}
