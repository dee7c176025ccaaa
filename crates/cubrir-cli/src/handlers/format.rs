//! Format command handler

use std::path::{Path, PathBuf};

use cubrir::formatters::{LcovFormatter, PrettyFormatter};
use cubrir::hitmap::CoverageSet;
use cubrir::resolver::{FileLoader, IdentityResolver, Loader, NullLoader, PackageResolver, Resolver};

use crate::commands::{FormatArgs, ReportFormat};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Execute the format command
pub fn execute_format(config: &CliConfig, args: &FormatArgs) -> CliResult<()> {
    let resolver = build_resolver(&args.package_roots)?;
    let ignore_loader: Box<dyn Loader> = if args.check_ignore {
        Box::new(FileLoader)
    } else {
        Box::new(NullLoader)
    };

    if config.verbosity.is_verbose() {
        println!("Reading {} coverage file(s)...", args.input.len());
    }
    let set = load_and_merge(&args.input, resolver.as_ref(), ignore_loader.as_ref())?;

    let output = match args.format {
        ReportFormat::Lcov => {
            let mut formatter = LcovFormatter::new(&set);
            if !args.report_on.is_empty() {
                formatter = formatter.with_report_on(args.report_on.clone());
            }
            if let Some(base) = &args.base_path {
                formatter = formatter.with_base_path(base);
            }
            formatter.format(resolver.as_ref())
        }
        ReportFormat::Pretty => PrettyFormatter::new(&set)
            .with_report_funcs(args.report_funcs)
            .format(resolver.as_ref(), &FileLoader)?,
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, output)?;
            if !config.verbosity.is_quiet() {
                println!("Report written to {}", path.display());
            }
        }
        None => print!("{output}"),
    }
    Ok(())
}

/// Build a resolver from `NAME=DIR` package-root specs
pub fn build_resolver(package_roots: &[String]) -> CliResult<Box<dyn Resolver>> {
    if package_roots.is_empty() {
        return Ok(Box::new(IdentityResolver));
    }
    let mut resolver = PackageResolver::new();
    for spec in package_roots {
        let Some((name, dir)) = spec.split_once('=') else {
            return Err(CliError::invalid_argument(format!(
                "package root '{spec}' is not NAME=DIR"
            )));
        };
        resolver = resolver.with_root(name, PathBuf::from(dir));
    }
    Ok(Box::new(resolver))
}

/// Parse and merge a list of coverage JSON files
pub fn load_and_merge(
    paths: &[PathBuf],
    resolver: &dyn Resolver,
    loader: &dyn Loader,
) -> CliResult<CoverageSet> {
    let mut merged = CoverageSet::new();
    for path in paths {
        let set = load_coverage_file(path, resolver, loader)?;
        merged.merge(set)?;
    }
    Ok(merged)
}

fn load_coverage_file(
    path: &Path,
    resolver: &dyn Resolver,
    loader: &dyn Loader,
) -> CliResult<CoverageSet> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::report_generation(format!("Failed to read {}: {e}", path.display()))
    })?;
    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        CliError::report_generation(format!("Invalid JSON in {}: {e}", path.display()))
    })?;
    Ok(CoverageSet::from_json_report(&value, resolver, loader)?)
}
