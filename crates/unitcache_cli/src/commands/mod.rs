//! Subcommand implementations

pub mod deps;
pub mod status;
pub mod touch;
