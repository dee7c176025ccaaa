//! LCOV report generation.
//!
//! ## LCOV format
//!
//! ```text
//! SF:<source file>
//! FN:<line>,<function name>
//! FNDA:<execution count>,<function name>
//! FNF:<functions found>
//! FNH:<functions hit>
//! DA:<line>,<execution count>
//! LF:<lines found>
//! LH:<lines hit>
//! end_of_record
//! ```
//!
//! Function records are emitted only for sets that carry function
//! coverage. Every record is sorted by line so output is byte-stable.

use std::path::{Path, PathBuf};

use crate::hitmap::{CoverageSet, HitMap};
use crate::resolver::Resolver;
use crate::result::CovResult;

/// LCOV format generator over a coverage set
#[derive(Debug)]
pub struct LcovFormatter<'a> {
    set: &'a CoverageSet,
    report_on: Option<Vec<String>>,
    base_path: Option<PathBuf>,
}

impl<'a> LcovFormatter<'a> {
    /// Create a formatter over a coverage set
    #[must_use]
    pub fn new(set: &'a CoverageSet) -> Self {
        Self {
            set,
            report_on: None,
            base_path: None,
        }
    }

    /// Keep only files under one of these path prefixes
    #[must_use]
    pub fn with_report_on<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.report_on = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    /// Emit paths relative to a base directory
    #[must_use]
    pub fn with_base_path(mut self, base: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base.into());
        self
    }

    /// Generate the LCOV report.
    ///
    /// Source URIs the resolver cannot map, and files outside the
    /// `report_on` prefixes, are dropped.
    #[must_use]
    pub fn format(&self, resolver: &dyn Resolver) -> String {
        use std::fmt::Write;

        let mut output = String::new();
        for (uri, hit_map) in self.set {
            let Some(path) = resolver.resolve(uri) else {
                continue;
            };
            if !self.reportable(&path) {
                continue;
            }
            let source = self.display_path(&path);
            let _ = writeln!(output, "SF:{source}");
            write_function_records(&mut output, hit_map);

            for (line, count) in &hit_map.line_hits {
                let _ = writeln!(output, "DA:{line},{count}");
            }
            let _ = writeln!(output, "LF:{}", hit_map.line_hits.len());
            let lines_hit = hit_map.line_hits.values().filter(|&&count| count > 0).count();
            let _ = writeln!(output, "LH:{lines_hit}");
            output.push_str("end_of_record\n");
        }
        output
    }

    /// Generate the report and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, resolver: &dyn Resolver, path: &Path) -> CovResult<()> {
        std::fs::write(path, self.format(resolver))?;
        Ok(())
    }

    fn reportable(&self, path: &str) -> bool {
        self.report_on.as_ref().is_none_or(|prefixes| {
            prefixes.iter().any(|prefix| path.starts_with(prefix))
        })
    }

    fn display_path(&self, path: &str) -> String {
        let Some(base) = &self.base_path else {
            return path.to_string();
        };
        Path::new(path)
            .strip_prefix(base)
            .map_or_else(|_| path.to_string(), |rel| rel.display().to_string())
    }
}

fn write_function_records(output: &mut String, hit_map: &HitMap) {
    use std::fmt::Write;

    let (Some(func_hits), Some(func_names)) = (&hit_map.func_hits, &hit_map.func_names) else {
        return;
    };
    for (line, name) in func_names {
        let _ = writeln!(output, "FN:{line},{name}");
    }
    for (line, count) in func_hits.iter().filter(|(_, &count)| count > 0) {
        if let Some(name) = func_names.get(line) {
            let _ = writeln!(output, "FNDA:{count},{name}");
        }
    }
    let _ = writeln!(output, "FNF:{}", func_names.len());
    let functions_hit = func_hits.values().filter(|&&count| count > 0).count();
    let _ = writeln!(output, "FNH:{functions_hit}");
}
