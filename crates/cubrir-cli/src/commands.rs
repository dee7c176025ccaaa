//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cubridor: CLI for Cubrir - coverage merging and report formatting
#[derive(Parser, Debug)]
#[command(name = "cubridor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render coverage JSON as LCOV or an annotated source listing
    Format(FormatArgs),

    /// Merge coverage JSON files across runs
    Merge(MergeArgs),
}

/// Arguments for the format command
#[derive(Parser, Debug)]
pub struct FormatArgs {
    /// Input coverage JSON files
    #[arg(short = 'i', long = "in", required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, default_value = "lcov")]
    pub format: ReportFormat,

    /// Annotate function declaration lines instead of plain lines
    /// (annotated listing only)
    #[arg(long)]
    pub report_funcs: bool,

    /// Keep only files under these path prefixes
    #[arg(long = "report-on", value_name = "PREFIX")]
    pub report_on: Vec<String>,

    /// Emit paths relative to this directory
    #[arg(long)]
    pub base_path: Option<PathBuf>,

    /// Package lib directories as NAME=DIR pairs, for resolving
    /// package: URIs
    #[arg(long = "package-root", value_name = "NAME=DIR")]
    pub package_roots: Vec<String>,

    /// Honor `// coverage:ignore-*` directives found in the sources
    #[arg(long)]
    pub check_ignore: bool,
}

/// Report output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// LCOV trace format
    #[default]
    Lcov,
    /// Annotated source listing
    Pretty,
}

/// Arguments for the merge command
#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Input coverage JSON files
    #[arg(short = 'i', long = "in", required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output file for the merged coverage JSON
    #[arg(short, long)]
    pub output: PathBuf,
}
