//! Subcommand handlers

pub mod format;
pub mod merge;
