//! Canonical per-file hit maps and the algebra over them.
//!
//! A [`HitMap`] records, per source file, how often each line executed,
//! plus optional function and branch counters. A [`CoverageSet`] keys hit
//! maps by source URI (each URI appears at most once) and supports merging,
//! ignore-directive masking, and the JSON interchange format used to
//! accumulate coverage across runs.
//!
//! ## Interchange format
//!
//! ```json
//! { "type": "CodeCoverage",
//!   "coverage": [
//!     { "source": "package:app/a.dart",
//!       "script": { "type": "@Script", "fixedId": true,
//!                   "id": "libraries/1/scripts/package:app/a.dart",
//!                   "uri": "package:app/a.dart", "_kind": "library" },
//!       "hits": [1, 3, 2, 0] } ] }
//! ```
//!
//! `hits` (and `funcHits`/`branchHits`) are flat alternating
//! `[line, count, ...]` arrays. Parsers also accept `"a-b"` range keys in
//! place of a line; producers emit single-line keys only.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};

use crate::ignore::ignored_lines;
use crate::resolver::{Loader, Resolver};
use crate::result::{CovError, CovResult};

/// Per-source-file record of line, function, and branch execution counts.
///
/// A line present in `line_hits` with count 0 is known to be coverable but
/// never executed; an absent line is not known to be coverable at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitMap {
    /// Execution count per line
    pub line_hits: BTreeMap<u32, u64>,
    /// Execution count per function declaration line; present iff function
    /// coverage was collected
    pub func_hits: Option<BTreeMap<u32, u64>>,
    /// Qualified function name per declaration line, parallel to
    /// `func_hits`
    pub func_names: Option<BTreeMap<u32, String>>,
    /// Branch execution count per line; present iff branch coverage was
    /// collected
    pub branch_hits: Option<BTreeMap<u32, u64>>,
}

impl HitMap {
    /// Create an empty hit map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the function maps exist (collection with function coverage
    /// produces them even for files without functions)
    pub fn ensure_function_maps(&mut self) {
        let _ = self.func_hits.get_or_insert_with(BTreeMap::new);
        let _ = self.func_names.get_or_insert_with(BTreeMap::new);
    }

    /// Make sure the branch map exists
    pub fn ensure_branch_map(&mut self) {
        let _ = self.branch_hits.get_or_insert_with(BTreeMap::new);
    }

    /// Remove every ignored line from all counters
    pub fn apply_ignores(&mut self, ignored: &BTreeSet<u32>) {
        self.line_hits.retain(|line, _| !ignored.contains(line));
        if let Some(func_hits) = &mut self.func_hits {
            func_hits.retain(|line, _| !ignored.contains(line));
        }
        if let Some(func_names) = &mut self.func_names {
            func_names.retain(|line, _| !ignored.contains(line));
        }
        if let Some(branch_hits) = &mut self.branch_hits {
            branch_hits.retain(|line, _| !ignored.contains(line));
        }
    }

    /// Check whether nothing at all was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_hits.is_empty()
            && self.func_hits.as_ref().is_none_or(BTreeMap::is_empty)
            && self.branch_hits.as_ref().is_none_or(BTreeMap::is_empty)
    }
}

/// URI-keyed collection of hit maps; each source URI appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSet {
    files: BTreeMap<String, HitMap>,
}

impl CoverageSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of source files in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check whether the set has no files
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Look up the hit map for a source URI
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&HitMap> {
        self.files.get(uri)
    }

    /// Get or create the hit map for a source URI
    pub fn entry(&mut self, uri: &str) -> &mut HitMap {
        self.files.entry(uri.to_string()).or_default()
    }

    /// Insert a hit map, replacing any existing record for the URI
    pub fn insert(&mut self, uri: impl Into<String>, hit_map: HitMap) {
        let _ = self.files.insert(uri.into(), hit_map);
    }

    /// Iterate files in URI order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &HitMap)> {
        self.files.iter()
    }

    /// Iterate files mutably in URI order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut HitMap)> {
        self.files.iter_mut()
    }

    /// Merge another set into this one.
    ///
    /// Records for URIs absent here are moved wholesale; otherwise counters
    /// are added line-wise and function names are unioned.
    ///
    /// # Errors
    ///
    /// [`CovError::InconsistentFunctionName`] if both sets name the same
    /// declaration line differently.
    pub fn merge(&mut self, from: CoverageSet) -> CovResult<()> {
        for (uri, incoming) in from.files {
            match self.files.entry(uri) {
                Entry::Vacant(slot) => {
                    let _ = slot.insert(incoming);
                }
                Entry::Occupied(mut slot) => {
                    let uri = slot.key().clone();
                    merge_hit_map(&uri, slot.get_mut(), incoming)?;
                }
            }
        }
        Ok(())
    }

    /// Remove ignored lines from the record for one URI
    pub fn apply_ignores(&mut self, uri: &str, ignored: &BTreeSet<u32>) {
        if let Some(hit_map) = self.files.get_mut(uri) {
            hit_map.apply_ignores(ignored);
        }
    }

    /// Parse the full interchange document (the `"coverage"` envelope).
    ///
    /// # Errors
    ///
    /// [`CovError::InvalidCoverageEntry`] if the envelope or any entry is
    /// malformed.
    pub fn from_json_report(
        report: &Value,
        resolver: &dyn Resolver,
        loader: &dyn Loader,
    ) -> CovResult<Self> {
        let entries = report
            .get("coverage")
            .and_then(Value::as_array)
            .ok_or_else(|| CovError::invalid_entry("missing 'coverage' list"))?;
        Self::from_json(entries, resolver, loader)
    }

    /// Parse a list of interchange entries.
    ///
    /// Entries whose `source` the resolver cannot map are skipped. Lines
    /// excluded by in-source ignore directives (scanned through the loader)
    /// are filtered out before insertion; counts for the same line within
    /// one entry accumulate by addition, as do repeated entries for the same
    /// source.
    ///
    /// # Errors
    ///
    /// [`CovError::InvalidCoverageEntry`] if an entry is malformed.
    pub fn from_json(
        entries: &[Value],
        resolver: &dyn Resolver,
        loader: &dyn Loader,
    ) -> CovResult<Self> {
        let mut set = Self::new();
        for entry in entries {
            let Some(source) = entry.get("source").and_then(Value::as_str) else {
                continue;
            };
            let Some(path) = resolver.resolve(source) else {
                continue;
            };
            let ignored = loader
                .load(&path)
                .map(|lines| ignored_lines(&lines))
                .unwrap_or_default();

            let hits = entry
                .get("hits")
                .ok_or_else(|| CovError::invalid_entry(format!("{source}: missing 'hits'")))?;
            let line_hits = parse_flat_counts(source, hits, &ignored)?;

            let hit_map = set.entry(source);
            add_counts(&mut hit_map.line_hits, &line_hits);

            if let Some(value) = entry.get("funcHits") {
                let counts = parse_flat_counts(source, value, &ignored)?;
                add_counts(
                    hit_map.func_hits.get_or_insert_with(BTreeMap::new),
                    &counts,
                );
            }
            if let Some(value) = entry.get("funcNames") {
                let names = parse_flat_names(source, value, &ignored)?;
                hit_map
                    .func_names
                    .get_or_insert_with(BTreeMap::new)
                    .extend(names);
            }
            if let Some(value) = entry.get("branchHits") {
                let counts = parse_flat_counts(source, value, &ignored)?;
                add_counts(
                    hit_map.branch_hits.get_or_insert_with(BTreeMap::new),
                    &counts,
                );
            }
        }
        Ok(set)
    }

    /// Serialize to the interchange entry list, line keys ascending,
    /// single-line keys only
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.files
                .iter()
                .map(|(uri, hit_map)| script_coverage_json(uri, hit_map))
                .collect(),
        )
    }

    /// Serialize to the full interchange document
    #[must_use]
    pub fn to_json_report(&self) -> Value {
        json!({ "type": "CodeCoverage", "coverage": self.to_json() })
    }
}

impl<'a> IntoIterator for &'a CoverageSet {
    type Item = (&'a String, &'a HitMap);
    type IntoIter = std::collections::btree_map::Iter<'a, String, HitMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Serialize one source's hit map as an interchange entry
#[must_use]
pub fn script_coverage_json(uri: &str, hit_map: &HitMap) -> Value {
    let mut entry = json!({
        "source": uri,
        "script": {
            "type": "@Script",
            "fixedId": true,
            "id": format!("libraries/1/scripts/{uri}"),
            "uri": uri,
            "_kind": "library",
        },
        "hits": flat_counts(&hit_map.line_hits),
    });
    if let Some(func_hits) = &hit_map.func_hits {
        entry["funcHits"] = flat_counts(func_hits);
    }
    if let Some(func_names) = &hit_map.func_names {
        entry["funcNames"] = Value::Array(
            func_names
                .iter()
                .flat_map(|(line, name)| [json!(line), json!(name)])
                .collect(),
        );
    }
    if let Some(branch_hits) = &hit_map.branch_hits {
        entry["branchHits"] = flat_counts(branch_hits);
    }
    entry
}

fn flat_counts(map: &BTreeMap<u32, u64>) -> Value {
    Value::Array(
        map.iter()
            .flat_map(|(line, count)| [json!(line), json!(count)])
            .collect(),
    )
}

fn add_counts(into: &mut BTreeMap<u32, u64>, from: &BTreeMap<u32, u64>) {
    for (line, count) in from {
        *into.entry(*line).or_insert(0) += count;
    }
}

fn merge_hit_map(uri: &str, into: &mut HitMap, from: HitMap) -> CovResult<()> {
    add_counts(&mut into.line_hits, &from.line_hits);
    if let Some(func_hits) = from.func_hits {
        add_counts(into.func_hits.get_or_insert_with(BTreeMap::new), &func_hits);
    }
    if let Some(branch_hits) = from.branch_hits {
        add_counts(
            into.branch_hits.get_or_insert_with(BTreeMap::new),
            &branch_hits,
        );
    }
    if let Some(func_names) = from.func_names {
        let into_names = into.func_names.get_or_insert_with(BTreeMap::new);
        for (line, name) in func_names {
            match into_names.entry(line) {
                Entry::Vacant(slot) => {
                    let _ = slot.insert(name);
                }
                Entry::Occupied(slot) => {
                    if *slot.get() != name {
                        return Err(CovError::InconsistentFunctionName {
                            source_uri: uri.to_string(),
                            line,
                            existing: slot.get().clone(),
                            incoming: name,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Parse a flat `[line-or-range, count, ...]` array, expanding `"a-b"`
/// range keys and dropping ignored lines
fn parse_flat_counts(
    source: &str,
    value: &Value,
    ignored: &BTreeSet<u32>,
) -> CovResult<BTreeMap<u32, u64>> {
    let array = value
        .as_array()
        .ok_or_else(|| CovError::invalid_entry(format!("{source}: hits must be an array")))?;
    if array.len() % 2 != 0 {
        return Err(CovError::invalid_entry(format!(
            "{source}: hits array has odd length {}",
            array.len()
        )));
    }

    let mut counts = BTreeMap::new();
    for pair in array.chunks(2) {
        let count = pair[1].as_u64().ok_or_else(|| {
            CovError::invalid_entry(format!("{source}: hit count {} is not a number", pair[1]))
        })?;
        match &pair[0] {
            Value::Number(_) => {
                let line = parse_line(source, &pair[0])?;
                if !ignored.contains(&line) {
                    *counts.entry(line).or_insert(0) += count;
                }
            }
            Value::String(key) => {
                let (start, end) = parse_range_key(source, key)?;
                for line in start..=end {
                    if !ignored.contains(&line) {
                        *counts.entry(line).or_insert(0) += count;
                    }
                }
            }
            other => {
                return Err(CovError::invalid_entry(format!(
                    "{source}: hit key {other} is neither a line nor a range"
                )));
            }
        }
    }
    Ok(counts)
}

/// Parse a flat `[line, name, ...]` array, dropping ignored lines
fn parse_flat_names(
    source: &str,
    value: &Value,
    ignored: &BTreeSet<u32>,
) -> CovResult<BTreeMap<u32, String>> {
    let array = value
        .as_array()
        .ok_or_else(|| CovError::invalid_entry(format!("{source}: funcNames must be an array")))?;
    if array.len() % 2 != 0 {
        return Err(CovError::invalid_entry(format!(
            "{source}: funcNames array has odd length {}",
            array.len()
        )));
    }

    let mut names = BTreeMap::new();
    for pair in array.chunks(2) {
        let line = parse_line(source, &pair[0])?;
        let name = pair[1].as_str().ok_or_else(|| {
            CovError::invalid_entry(format!("{source}: function name {} is not a string", pair[1]))
        })?;
        if !ignored.contains(&line) {
            let _ = names.insert(line, name.to_string());
        }
    }
    Ok(names)
}

fn parse_line(source: &str, value: &Value) -> CovResult<u32> {
    value
        .as_u64()
        .and_then(|line| u32::try_from(line).ok())
        .ok_or_else(|| {
            CovError::invalid_entry(format!("{source}: line key {value} is not a valid line"))
        })
}

fn parse_range_key(source: &str, key: &str) -> CovResult<(u32, u32)> {
    let malformed =
        || CovError::invalid_entry(format!("{source}: malformed range key '{key}'"));
    let (start, end) = key.split_once('-').ok_or_else(malformed)?;
    let start: u32 = start.trim().parse().map_err(|_| malformed())?;
    let end: u32 = end.trim().parse().map_err(|_| malformed())?;
    if start > end {
        return Err(malformed());
    }
    Ok((start, end))
}
