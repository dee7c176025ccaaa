//! Lowering of browser precise coverage into canonical hit maps.
//!
//! Browsers report coverage as half-open code-unit ranges `[start, end)`
//! over the *compiled* text of each script, grouped by function. Lowering
//! turns those ranges into per-line hit maps in the *original* source
//! coordinates:
//!
//! 1. flatten all ranges, keeping whether each executed;
//! 2. stable-sort by size descending so enclosing ranges paint first and
//!    the tightest nested range wins per offset;
//! 3. paint a coverage flag per UTF-16 code unit of the compiled source;
//! 4. project covered offsets to 1-based compiled `(line, column)`s;
//! 5. walk the decoded source map and mark each original line covered or
//!    not, skipping runtime-SDK sources;
//! 6. promote the flags to 0/1 hit counts.
//!
//! If several map entries land on the same original line, the entry visited
//! last (entries are iterated by compiled line, then column) decides. This
//! is an accepted approximation: precise coverage is expression-grained
//! while hit maps are line-grained.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::hitmap::CoverageSet;
use crate::result::{CovError, CovResult};

/// Default URL prefix marking runtime-SDK sources inside source maps
pub const SDK_URL_PREFIX: &str = "org-dartlang-sdk:";

/// A range of code units in a compiled script with an execution count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRange {
    /// Start offset (inclusive)
    pub start_offset: u32,
    /// End offset (exclusive)
    pub end_offset: u32,
    /// Number of times this range was executed
    pub count: u32,
}

/// Coverage data for a single function of a compiled script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCoverage {
    /// Function name (may be empty for anonymous functions)
    pub function_name: String,
    /// Ranges within this function
    pub ranges: Vec<CoverageRange>,
}

/// Coverage data for a single compiled script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCoverage {
    /// Script identifier assigned by the browser
    pub script_id: String,
    /// Script URL
    pub url: String,
    /// Functions in this script
    pub functions: Vec<FunctionCoverage>,
}

/// One decoded source-map mapping; all coordinates 0-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapEntry {
    /// Line in the compiled script
    pub compiled_line: u32,
    /// Column in the compiled script
    pub compiled_column: u32,
    /// URL of the original source, if the mapping has one
    pub source_url: Option<String>,
    /// Line in the original source
    pub source_line: u32,
    /// Column in the original source
    pub source_column: u32,
}

/// A decoded source map.
///
/// Decoding the VLQ wire format is the caller's concern; this type holds
/// the result. Construction sorts entries by compiled line then column so
/// iteration order (and with it the last-write-wins rule) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: Vec<SourceMapEntry>,
}

impl SourceMap {
    /// Create a source map from decoded entries
    #[must_use]
    pub fn new(mut entries: Vec<SourceMapEntry>) -> Self {
        entries.sort_by_key(|entry| (entry.compiled_line, entry.compiled_column));
        Self { entries }
    }

    /// Entries ordered by compiled line, then column
    #[must_use]
    pub fn entries(&self) -> &[SourceMapEntry] {
        &self.entries
    }
}

/// Sources and maps for the scripts being lowered.
///
/// All three lookups may fail: a script without compiled source or source
/// map simply contributes nothing, and a source URL that cannot be turned
/// into a URI drops that mapping.
pub trait ScriptSourceProvider {
    /// The compiled text of a script
    fn compiled_source(&self, script_id: &str) -> Option<String>;
    /// The decoded source map of a script
    fn source_map(&self, script_id: &str) -> Option<SourceMap>;
    /// Resolve a source URL from the map to an external source URI
    fn source_uri(&self, source_url: &str, script_id: &str) -> Option<String>;
}

/// Options for precise-coverage lowering
#[derive(Debug, Clone)]
pub struct LowerOptions {
    /// Source URLs with this prefix are runtime-SDK internals and skipped
    pub sdk_url_prefix: String,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            sdk_url_prefix: SDK_URL_PREFIX.to_string(),
        }
    }
}

impl LowerOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the runtime-SDK URL prefix
    #[must_use]
    pub fn with_sdk_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sdk_url_prefix = prefix.into();
        self
    }
}

/// A flattened range ready for painting
#[derive(Debug, Clone, Copy)]
struct CoverageInfo {
    start: usize,
    end: usize,
    covered: bool,
}

/// Lower precise coverage for a batch of scripts into a canonical set.
///
/// Scripts with no compiled source or no source map are skipped.
///
/// # Errors
///
/// [`CovError::InvalidCoverageEntry`] if a range is inverted or reaches
/// past the end of the compiled source.
pub fn lower_precise_coverage(
    scripts: &[ScriptCoverage],
    provider: &dyn ScriptSourceProvider,
    options: &LowerOptions,
) -> CovResult<CoverageSet> {
    // uri -> line -> covered; later scripts and later map entries overwrite
    let mut line_flags: BTreeMap<String, BTreeMap<u32, bool>> = BTreeMap::new();

    for script in scripts {
        let Some(source) = provider.compiled_source(&script.script_id) else {
            continue;
        };
        let Some(map) = provider.source_map(&script.script_id) else {
            continue;
        };

        let units: Vec<u16> = source.encode_utf16().collect();
        let offset_coverage = paint_offsets(script, &units)?;
        let covered_positions = project_positions(&units, &offset_coverage);

        for entry in map.entries() {
            let Some(source_url) = &entry.source_url else {
                continue;
            };
            if source_url.starts_with(&options.sdk_url_prefix) {
                continue;
            }
            let Some(uri) = provider.source_uri(source_url, &script.script_id) else {
                continue;
            };
            let compiled = (entry.compiled_line + 1, entry.compiled_column + 1);
            let covered = covered_positions.contains(&compiled);
            let _ = line_flags
                .entry(uri)
                .or_default()
                .insert(entry.source_line + 1, covered);
        }
    }

    let mut set = CoverageSet::new();
    for (uri, flags) in line_flags {
        let hit_map = set.entry(&uri);
        for (line, covered) in flags {
            let _ = hit_map.line_hits.insert(line, u64::from(covered));
        }
    }
    Ok(set)
}

/// Flatten, sort, and paint the per-offset coverage flags for one script
fn paint_offsets(script: &ScriptCoverage, units: &[u16]) -> CovResult<Vec<bool>> {
    let mut infos: Vec<CoverageInfo> = Vec::new();
    for function in &script.functions {
        for range in &function.ranges {
            let start = range.start_offset as usize;
            let end = range.end_offset as usize;
            if end < start || end > units.len() {
                return Err(CovError::invalid_entry(format!(
                    "{}: range [{start}, {end}) out of bounds for a script of \
                     {} code units",
                    script.url,
                    units.len()
                )));
            }
            infos.push(CoverageInfo {
                start,
                end,
                covered: range.count > 0,
            });
        }
    }

    // Stable sort: equal sizes keep input order, larger ranges paint first
    // so the tightest nested range decides each offset.
    infos.sort_by(|a, b| (b.end - b.start).cmp(&(a.end - a.start)));

    let mut offset_coverage = vec![false; units.len()];
    for info in &infos {
        for flag in &mut offset_coverage[info.start..info.end] {
            *flag = info.covered;
        }
    }
    Ok(offset_coverage)
}

/// Collect the 1-based compiled positions whose offsets are covered.
///
/// The column counter starts at 0 and is bumped before each code unit, so
/// the first character of a line sits at column 1.
fn project_positions(units: &[u16], offset_coverage: &[bool]) -> HashSet<(u32, u32)> {
    const NEWLINE: u16 = b'\n' as u16;

    let mut positions = HashSet::new();
    let mut line: u32 = 1;
    let mut column: u32 = 0;
    for (offset, &unit) in units.iter().enumerate() {
        column += 1;
        if offset_coverage[offset] {
            let _ = positions.insert((line, column));
        }
        if unit == NEWLINE {
            line += 1;
            column = 0;
        }
    }
    positions
}
