//! Cubridor: command-line interface for Cubrir coverage reports.
//!
//! ## Usage
//!
//! ```bash
//! cubridor merge --in run1.json run2.json --output all.json
//! cubridor format --in all.json --format lcov --output lcov.info
//! cubridor format --in all.json --format pretty --check-ignore
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;

pub use commands::{Cli, Commands, FormatArgs, MergeArgs, ReportFormat};
pub use config::{CliConfig, Verbosity};
pub use error::{CliError, CliResult};
