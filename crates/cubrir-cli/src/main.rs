//! Cubridor CLI entry point
//!
//! ```bash
//! cubridor format --in coverage.json            # LCOV to stdout
//! cubridor format --in coverage.json --format pretty
//! cubridor merge --in a.json b.json --output all.json
//! ```

use clap::Parser;
use cubridor::{handlers, Cli, CliConfig, CliResult, Commands, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);

    match cli.command {
        Commands::Format(args) => handlers::format::execute_format(&config, &args),
        Commands::Merge(args) => handlers::merge::execute_merge(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };
    CliConfig::new().with_verbosity(verbosity)
}
