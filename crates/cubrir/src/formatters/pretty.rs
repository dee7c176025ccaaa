//! Annotated source listings.
//!
//! For every resolvable file, prints the path followed by each source line
//! behind a 7-wide gutter: the hit count when the line is tracked, blank
//! otherwise.

use crate::hitmap::CoverageSet;
use crate::resolver::{Loader, Resolver};
use crate::result::{CovError, CovResult};

const GUTTER_WIDTH: usize = 7;

/// Annotated source listing generator over a coverage set
#[derive(Debug)]
pub struct PrettyFormatter<'a> {
    set: &'a CoverageSet,
    report_funcs: bool,
}

impl<'a> PrettyFormatter<'a> {
    /// Create a formatter over a coverage set
    #[must_use]
    pub fn new(set: &'a CoverageSet) -> Self {
        Self {
            set,
            report_funcs: false,
        }
    }

    /// Annotate function declaration lines with call counts instead of
    /// line hit counts
    #[must_use]
    pub const fn with_report_funcs(mut self, enabled: bool) -> Self {
        self.report_funcs = enabled;
        self
    }

    /// Generate the listing.
    ///
    /// Files the resolver or loader cannot produce are skipped.
    ///
    /// # Errors
    ///
    /// [`CovError::MissingFunctionCoverage`] if function annotation is
    /// requested on a set without function coverage.
    pub fn format(&self, resolver: &dyn Resolver, loader: &dyn Loader) -> CovResult<String> {
        use std::fmt::Write;

        let width = GUTTER_WIDTH;
        let mut output = String::new();
        for (uri, hit_map) in self.set {
            let hits = if self.report_funcs {
                hit_map
                    .func_hits
                    .as_ref()
                    .ok_or(CovError::MissingFunctionCoverage)?
            } else {
                &hit_map.line_hits
            };
            let Some(path) = resolver.resolve(uri) else {
                continue;
            };
            let Some(lines) = loader.load(&path) else {
                continue;
            };

            let _ = writeln!(output, "{path}");
            for (index, text) in lines.iter().enumerate() {
                #[allow(clippy::cast_possible_truncation)]
                let line = index as u32 + 1;
                match hits.get(&line) {
                    Some(count) => {
                        let _ = writeln!(output, "{count:>width$}|{text}");
                    }
                    None => {
                        let _ = writeln!(output, "{:width$}|{text}", "");
                    }
                }
            }
        }
        Ok(output)
    }
}
