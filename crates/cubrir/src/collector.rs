//! Coverage collection against a live VM service.
//!
//! [`collect`] drives a [`VmService`] session: optionally waits for every
//! isolate to pause, visits one isolate per isolate group (program counters
//! are shared within a group, so one member reports for all of them),
//! fetches source reports under the session's capability gates, and folds
//! everything into a [`CoverageSet`]. Isolates that die mid-collection are
//! skipped; the service handle is disposed on every exit path.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Duration;

use futures::future::join_all;

use crate::hitmap::CoverageSet;
use crate::result::{CovError, CovResult};
use crate::service::{
    EventKind, Event, Function, FunctionOwner, IsolateRef, Script, ScriptRef,
    ServiceCapabilities, SourceReport, SourceReportKind, SourceReportRequest, VmObject,
    VmService, RETRY_INTERVAL,
};

/// Caller-owned cache of the coverable lines per library.
///
/// Threading the same cache through successive [`collect`] calls lets the
/// service skip recompiling libraries it has already reported, while the
/// known-coverable lines are pre-seeded as misses so totals stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverableLineCache {
    lines: BTreeMap<String, BTreeSet<u32>>,
}

impl CoverableLineCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Coverable lines recorded for a script URI
    #[must_use]
    pub fn coverable_lines(&self, script_uri: &str) -> Option<&BTreeSet<u32>> {
        self.lines.get(script_uri)
    }

    /// Record coverable lines for a script URI
    pub fn add_coverable_lines<I>(&mut self, script_uri: &str, lines: I)
    where
        I: IntoIterator<Item = u32>,
    {
        self.lines
            .entry(script_uri.to_string())
            .or_default()
            .extend(lines);
    }

    /// URIs of every library in the cache, ascending
    #[must_use]
    pub fn cached_libraries(&self) -> Vec<String> {
        self.lines.keys().cloned().collect()
    }

    /// Number of cached libraries
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Options controlling one collection pass
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// Wait for every isolate to reach a pause point before collecting
    pub wait_paused: bool,
    /// Resume paused isolates after collecting
    pub resume_isolates: bool,
    /// Record function declaration lines and per-function counts
    pub function_coverage: bool,
    /// Request branch coverage (downgraded with a warning on old services)
    pub branch_coverage: bool,
    /// Keep runtime-SDK (`dart:`) scripts in the output
    pub include_sdk: bool,
    /// Package names to retain; empty keeps everything
    pub scoped_output: BTreeSet<String>,
    /// Only visit these isolates when set
    pub isolate_ids: Option<BTreeSet<String>>,
    /// Budget for the pause-wait phase
    pub timeout: Option<Duration>,
}

impl CollectOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for all isolates to pause before collecting
    #[must_use]
    pub const fn with_wait_paused(mut self, wait: bool) -> Self {
        self.wait_paused = wait;
        self
    }

    /// Resume paused isolates after collecting
    #[must_use]
    pub const fn with_resume(mut self, resume: bool) -> Self {
        self.resume_isolates = resume;
        self
    }

    /// Collect function coverage
    #[must_use]
    pub const fn with_function_coverage(mut self, enabled: bool) -> Self {
        self.function_coverage = enabled;
        self
    }

    /// Collect branch coverage
    #[must_use]
    pub const fn with_branch_coverage(mut self, enabled: bool) -> Self {
        self.branch_coverage = enabled;
        self
    }

    /// Keep runtime-SDK scripts
    #[must_use]
    pub const fn with_include_sdk(mut self, include: bool) -> Self {
        self.include_sdk = include;
        self
    }

    /// Restrict output to a set of package names
    #[must_use]
    pub fn with_scoped_output<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scoped_output = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict collection to specific isolates
    #[must_use]
    pub fn with_isolate_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.isolate_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Bound the pause-wait phase
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Collect coverage from every isolate group of a running VM.
///
/// The service handle is disposed before returning, on success and on
/// failure. When `resume_isolates` is set, paused isolates are resumed
/// first (concurrently; individual failures are swallowed).
///
/// # Errors
///
/// [`CovError::PauseTimeout`] or [`CovError::NoIsolates`] from the
/// pause-wait phase, [`CovError::InconsistentFunctionName`] from merging,
/// or any non-sentinel RPC failure.
pub async fn collect(
    service: &dyn VmService,
    options: &CollectOptions,
    mut cache: Option<&mut CoverableLineCache>,
) -> CovResult<CoverageSet> {
    let result = collect_inner(service, options, cache.as_deref_mut()).await;
    if options.resume_isolates {
        resume_isolates(service).await;
    }
    let _ = service.dispose().await;
    result
}

/// Poll until every isolate of the VM sits at a pause point.
///
/// Polls at [`RETRY_INTERVAL`].
///
/// # Errors
///
/// [`CovError::NoIsolates`] if the VM reports zero isolates,
/// [`CovError::PauseTimeout`] once the budget is spent, or any RPC failure.
pub async fn wait_for_all_paused(
    service: &dyn VmService,
    timeout: Option<Duration>,
) -> CovResult<()> {
    let deadline = timeout.map(|budget| tokio::time::Instant::now() + budget);
    loop {
        if all_isolates_paused(service).await? {
            return Ok(());
        }
        if let Some(deadline) = deadline {
            if tokio::time::Instant::now() + RETRY_INTERVAL > deadline {
                #[allow(clippy::cast_possible_truncation)]
                return Err(CovError::PauseTimeout {
                    ms: timeout.map_or(0, |budget| budget.as_millis() as u64),
                });
            }
        }
        tokio::time::sleep(RETRY_INTERVAL).await;
    }
}

/// Check whether a script URI passes the package scope filter.
///
/// An empty scope keeps everything; otherwise only `package:` URIs whose
/// package name is in the scope pass.
#[must_use]
pub fn includes_script(scoped_output: &BTreeSet<String>, uri: &str) -> bool {
    if scoped_output.is_empty() {
        return true;
    }
    let Some(rest) = uri.strip_prefix("package:") else {
        return false;
    };
    let package = match rest.split_once('/') {
        Some((package, _)) => package,
        None => rest,
    };
    scoped_output.contains(package)
}

/// Look up the line declared at a token position.
///
/// Rows are `[line, tokenPos, column, ...]` sorted by line, with the row's
/// minimum token position at index 1.
#[must_use]
pub fn line_from_token_pos(table: &[Vec<i64>], token_pos: i64) -> Option<u32> {
    let mut min = 0;
    let mut max = table.len();
    while min < max {
        let mid = min + (max - min) / 2;
        let row = &table[mid];
        if row.get(1).is_some_and(|&first| first > token_pos) {
            max = mid;
        } else {
            for pair in row.get(1..).unwrap_or(&[]).chunks(2) {
                if pair.first() == Some(&token_pos) {
                    return row.first().and_then(|&line| u32::try_from(line).ok());
                }
            }
            min = mid + 1;
        }
    }
    None
}

async fn collect_inner(
    service: &dyn VmService,
    options: &CollectOptions,
    mut cache: Option<&mut CoverableLineCache>,
) -> CovResult<CoverageSet> {
    if options.wait_paused {
        wait_for_all_paused(service, options.timeout).await?;
    }

    let version = service.get_version().await?;
    let capabilities = ServiceCapabilities::from_version(version);
    let branch_coverage = options.branch_coverage && capabilities.branch_coverage;
    if options.branch_coverage && !branch_coverage {
        eprintln!(
            "warning: VM service {}.{} does not support branch coverage; \
             collecting without it",
            version.major, version.minor
        );
    }

    let vm = service.get_vm().await?;

    // Group membership per isolate, fetched only when the refs cannot
    // answer it themselves.
    let mut group_ids: HashMap<String, String> = HashMap::new();
    if !capabilities.fast_isolate_groups {
        for group_ref in &vm.isolate_groups {
            match service.get_isolate_group(&group_ref.id).await {
                Ok(group) => {
                    for member in group.isolates {
                        let _ = group_ids.insert(member.id, group.id.clone());
                    }
                }
                Err(err) if err.is_stale() => {}
                Err(err) => return Err(err),
            }
        }
    }

    let mut coverage = CoverageSet::new();
    let mut covered_groups: HashSet<String> = HashSet::new();
    for isolate_ref in &vm.isolates {
        if let Some(allowed) = &options.isolate_ids {
            if !allowed.contains(&isolate_ref.id) {
                continue;
            }
        }
        let group_id = if capabilities.fast_isolate_groups {
            isolate_ref.isolate_group_id.clone()
        } else {
            group_ids.get(&isolate_ref.id).cloned()
        };
        // One isolate reports for its whole group; ungrouped isolates are
        // always visited.
        if let Some(group_id) = group_id {
            if !covered_groups.insert(group_id) {
                continue;
            }
        }
        let collected = collect_isolate(
            service,
            capabilities,
            options,
            branch_coverage,
            isolate_ref,
            cache.as_deref_mut(),
        )
        .await;
        match collected {
            Ok(isolate_coverage) => coverage.merge(isolate_coverage)?,
            Err(err) if err.is_stale() => {}
            Err(err) => return Err(err),
        }
    }
    Ok(coverage)
}

async fn collect_isolate(
    service: &dyn VmService,
    capabilities: ServiceCapabilities,
    options: &CollectOptions,
    branch_coverage: bool,
    isolate_ref: &IsolateRef,
    mut cache: Option<&mut CoverableLineCache>,
) -> CovResult<CoverageSet> {
    let mut kinds = vec![SourceReportKind::Coverage];
    if branch_coverage {
        kinds.push(SourceReportKind::BranchCoverage);
    }

    let mut collector = IsolateCollector {
        service,
        isolate_id: &isolate_ref.id,
        function_coverage: options.function_coverage,
        include_sdk: options.include_sdk,
        scoped_output: &options.scoped_output,
        scripts: HashMap::new(),
        loaded_libraries: HashSet::new(),
        coverage: CoverageSet::new(),
    };

    let libraries_already_compiled = |cache: Option<&CoverableLineCache>| {
        if capabilities.line_cache {
            cache.map(CoverableLineCache::cached_libraries)
        } else {
            None
        }
    };

    if !options.scoped_output.is_empty() && !capabilities.library_filters {
        // The service cannot filter libraries itself; ask per script.
        let scripts = service.get_scripts(&isolate_ref.id).await?;
        for script in scripts {
            if !includes_script(&options.scoped_output, &script.uri) {
                continue;
            }
            let request = SourceReportRequest {
                force_compile: true,
                report_lines: true,
                script_id: Some(script.id.clone()),
                libraries_already_compiled: libraries_already_compiled(cache.as_deref()),
                ..Default::default()
            };
            let report = service
                .get_source_report(&isolate_ref.id, &kinds, &request)
                .await?;
            collector
                .process_report(&report, cache.as_deref_mut())
                .await?;
        }
    } else {
        let library_filters = (!options.scoped_output.is_empty()).then(|| {
            options
                .scoped_output
                .iter()
                .map(|package| format!("package:{package}/"))
                .collect()
        });
        let request = SourceReportRequest {
            force_compile: true,
            report_lines: true,
            library_filters,
            libraries_already_compiled: libraries_already_compiled(cache.as_deref()),
            ..Default::default()
        };
        let report = service
            .get_source_report(&isolate_ref.id, &kinds, &request)
            .await?;
        collector
            .process_report(&report, cache.as_deref_mut())
            .await?;
    }

    Ok(collector.finish())
}

/// Per-isolate processing state: fetched objects are cached for the
/// duration of one isolate visit, then discarded.
struct IsolateCollector<'a> {
    service: &'a dyn VmService,
    isolate_id: &'a str,
    function_coverage: bool,
    include_sdk: bool,
    scoped_output: &'a BTreeSet<String>,
    scripts: HashMap<String, Script>,
    loaded_libraries: HashSet<String>,
    coverage: CoverageSet,
}

impl IsolateCollector<'_> {
    async fn process_report(
        &mut self,
        report: &SourceReport,
        mut cache: Option<&mut CoverableLineCache>,
    ) -> CovResult<()> {
        for range in &report.ranges {
            let Some(script_ref) = report.scripts.get(range.script_index) else {
                return Err(CovError::service(format!(
                    "source report range references script index {} of {} scripts",
                    range.script_index,
                    report.scripts.len()
                )));
            };
            // Ranges may reference a different script than the enclosing
            // report (mixin expansion), so the filters run again here.
            if !includes_script(self.scoped_output, &script_ref.uri) {
                continue;
            }
            if !self.is_collectible(&script_ref.uri) {
                continue;
            }

            if self.function_coverage {
                let script = self.script(script_ref).await?;
                if let Some(library) = script.library.clone() {
                    self.process_library(&library.id).await?;
                }
            }

            let hit_map = self.coverage.entry(&script_ref.uri);
            if self.function_coverage {
                hit_map.ensure_function_maps();
            }
            if range.branch_coverage.is_some() {
                hit_map.ensure_branch_map();
            }

            if let Some(cache) = cache.as_deref_mut() {
                if let Some(lines) = cache.coverable_lines(&script_ref.uri) {
                    for &line in lines {
                        let _ = hit_map.line_hits.entry(line).or_insert(0);
                    }
                }
            }

            if let Some(coverage) = &range.coverage {
                for &line in &coverage.hits {
                    *hit_map.line_hits.entry(line).or_insert(0) += 1;
                    let is_function_line = hit_map
                        .func_names
                        .as_ref()
                        .is_some_and(|names| names.contains_key(&line));
                    if is_function_line {
                        if let Some(func_hits) = hit_map.func_hits.as_mut() {
                            *func_hits.entry(line).or_insert(0) += 1;
                        }
                    }
                }
                for &line in &coverage.misses {
                    let _ = hit_map.line_hits.entry(line).or_insert(0);
                }
                if let Some(cache) = cache.as_deref_mut() {
                    cache.add_coverable_lines(
                        &script_ref.uri,
                        coverage.hits.iter().chain(&coverage.misses).copied(),
                    );
                }
            }

            if let Some(branch) = &range.branch_coverage {
                if let Some(branch_hits) = hit_map.branch_hits.as_mut() {
                    for &line in &branch.hits {
                        *branch_hits.entry(line).or_insert(0) += 1;
                    }
                    for &line in &branch.misses {
                        let _ = branch_hits.entry(line).or_insert(0);
                    }
                }
            }
        }
        Ok(())
    }

    /// Hand the accumulated coverage back, with a zero entry for every
    /// known function that never ran
    fn finish(mut self) -> CoverageSet {
        for (_, hit_map) in self.coverage.iter_mut() {
            let Some(func_names) = &hit_map.func_names else {
                continue;
            };
            let lines: Vec<u32> = func_names.keys().copied().collect();
            if let Some(func_hits) = hit_map.func_hits.as_mut() {
                for line in lines {
                    let _ = func_hits.entry(line).or_insert(0);
                }
            }
        }
        self.coverage
    }

    fn is_collectible(&self, uri: &str) -> bool {
        match uri.split_once(':') {
            Some(("evaluate", _)) => false,
            Some(("dart", _)) => self.include_sdk,
            _ => true,
        }
    }

    async fn script(&mut self, script_ref: &ScriptRef) -> CovResult<Script> {
        if let Some(script) = self.scripts.get(&script_ref.id) {
            return Ok(script.clone());
        }
        let object = self
            .service
            .get_object(self.isolate_id, &script_ref.id)
            .await?;
        let VmObject::Script(script) = object else {
            return Err(CovError::service(format!(
                "object {} is not a script",
                script_ref.id
            )));
        };
        let _ = self.scripts.insert(script_ref.id.clone(), script.clone());
        Ok(script)
    }

    async fn process_library(&mut self, library_id: &str) -> CovResult<()> {
        if !self.loaded_libraries.insert(library_id.to_string()) {
            return Ok(());
        }
        let object = self.service.get_object(self.isolate_id, library_id).await?;
        let VmObject::Library(library) = object else {
            return Err(CovError::service(format!(
                "object {library_id} is not a library"
            )));
        };
        for func_ref in &library.functions {
            self.process_function(&func_ref.id).await?;
        }
        for class_ref in &library.classes {
            let object = self
                .service
                .get_object(self.isolate_id, &class_ref.id)
                .await?;
            let VmObject::Class(class) = object else {
                return Err(CovError::service(format!(
                    "object {} is not a class",
                    class_ref.id
                )));
            };
            for func_ref in &class.functions {
                self.process_function(&func_ref.id).await?;
            }
        }
        Ok(())
    }

    async fn process_function(&mut self, function_id: &str) -> CovResult<()> {
        let object = self
            .service
            .get_object(self.isolate_id, function_id)
            .await?;
        let VmObject::Function(function) = object else {
            return Err(CovError::service(format!(
                "object {function_id} is not a function"
            )));
        };
        if function.implicit || function.is_abstract {
            return Ok(());
        }
        let Some(location) = function.location.clone() else {
            return Ok(());
        };
        let name = qualified_name(&function, location.token_pos);
        let script = self.script(&location.script).await?;
        let Some(line) = line_from_token_pos(&script.token_pos_table, location.token_pos) else {
            return Ok(());
        };
        let hit_map = self.coverage.entry(&script.uri);
        hit_map.ensure_function_maps();
        if let Some(names) = hit_map.func_names.as_mut() {
            let _ = names.insert(line, name);
        }
        Ok(())
    }
}

fn qualified_name(function: &Function, token_pos: i64) -> String {
    let Some(name) = &function.name else {
        return format!("{}:{token_pos}", function.kind);
    };
    match &function.owner {
        Some(FunctionOwner::Class { name: class_name }) => format!("{class_name}.{name}"),
        _ => name.clone(),
    }
}

async fn all_isolates_paused(service: &dyn VmService) -> CovResult<bool> {
    let vm = service.get_vm().await?;
    if vm.isolates.is_empty() {
        return Err(CovError::NoIsolates);
    }
    for isolate_ref in &vm.isolates {
        let isolate = service.get_isolate(&isolate_ref.id).await?;
        let paused = isolate
            .pause_event
            .is_some_and(|event| event.kind.is_paused());
        if !paused {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Resume every isolate not already running. Failures are swallowed; a
/// dying isolate is not worth failing the collection over.
async fn resume_isolates(service: &dyn VmService) {
    let Ok(vm) = service.get_vm().await else {
        return;
    };
    let resumes = vm.isolates.iter().map(|isolate_ref| async move {
        let Ok(isolate) = service.get_isolate(&isolate_ref.id).await else {
            return;
        };
        let running = matches!(
            isolate.pause_event,
            Some(Event {
                kind: EventKind::Resume
            })
        );
        if !running {
            let _ = service.resume(&isolate_ref.id).await;
        }
    });
    let _ = join_all(resumes).await;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod scope_tests {
        use super::*;

        #[test]
        fn test_empty_scope_keeps_everything() {
            let scope = BTreeSet::new();
            assert!(includes_script(&scope, "package:app/a.dart"));
            assert!(includes_script(&scope, "dart:core"));
            assert!(includes_script(&scope, "file:///x.dart"));
        }

        #[test]
        fn test_scope_matches_package_name() {
            let scope = BTreeSet::from(["app".to_string()]);
            assert!(includes_script(&scope, "package:app/a.dart"));
            assert!(!includes_script(&scope, "package:other/a.dart"));
        }

        #[test]
        fn test_scope_drops_non_package_uris() {
            let scope = BTreeSet::from(["app".to_string()]);
            assert!(!includes_script(&scope, "file:///app/a.dart"));
            assert!(!includes_script(&scope, "dart:core"));
        }

        #[test]
        fn test_scope_with_bare_package_uri() {
            let scope = BTreeSet::from(["app".to_string()]);
            assert!(includes_script(&scope, "package:app"));
        }
    }

    mod token_pos_tests {
        use super::*;

        fn table() -> Vec<Vec<i64>> {
            vec![
                vec![1, 10, 1, 14, 5],
                vec![3, 20, 1],
                vec![7, 30, 1, 35, 9, 39, 12],
            ]
        }

        #[test]
        fn test_exact_match_first_row() {
            assert_eq!(line_from_token_pos(&table(), 10), Some(1));
            assert_eq!(line_from_token_pos(&table(), 14), Some(1));
        }

        #[test]
        fn test_exact_match_last_row() {
            assert_eq!(line_from_token_pos(&table(), 39), Some(7));
        }

        #[test]
        fn test_middle_row() {
            assert_eq!(line_from_token_pos(&table(), 20), Some(3));
        }

        #[test]
        fn test_no_match() {
            assert_eq!(line_from_token_pos(&table(), 15), None);
            assert_eq!(line_from_token_pos(&table(), 99), None);
        }

        #[test]
        fn test_empty_table() {
            assert_eq!(line_from_token_pos(&[], 10), None);
        }
    }

    mod name_tests {
        use super::*;
        use crate::service::SourceLocation;

        fn function(name: Option<&str>, owner: Option<FunctionOwner>) -> Function {
            Function {
                id: "f1".to_string(),
                name: name.map(str::to_string),
                kind: "RegularFunction".to_string(),
                owner,
                location: Some(SourceLocation {
                    script: ScriptRef {
                        id: "s1".to_string(),
                        uri: "package:app/a.dart".to_string(),
                    },
                    token_pos: 42,
                }),
                is_abstract: false,
                implicit: false,
            }
        }

        #[test]
        fn test_class_member_qualified() {
            let func = function(
                Some("run"),
                Some(FunctionOwner::Class {
                    name: "Worker".to_string(),
                }),
            );
            assert_eq!(qualified_name(&func, 42), "Worker.run");
        }

        #[test]
        fn test_top_level_name() {
            let func = function(Some("main"), Some(FunctionOwner::Library));
            assert_eq!(qualified_name(&func, 42), "main");
        }

        #[test]
        fn test_unnamed_falls_back_to_kind_and_token() {
            let func = function(None, None);
            assert_eq!(qualified_name(&func, 42), "RegularFunction:42");
        }
    }

    mod cache_tests {
        use super::*;

        #[test]
        fn test_cache_accumulates_lines() {
            let mut cache = CoverableLineCache::new();
            cache.add_coverable_lines("package:app/a.dart", [3, 1]);
            cache.add_coverable_lines("package:app/a.dart", [1, 7]);

            assert_eq!(
                cache.coverable_lines("package:app/a.dart"),
                Some(&BTreeSet::from([1, 3, 7]))
            );
        }

        #[test]
        fn test_cached_libraries_sorted() {
            let mut cache = CoverableLineCache::new();
            cache.add_coverable_lines("package:app/b.dart", [1]);
            cache.add_coverable_lines("package:app/a.dart", [1]);

            assert_eq!(
                cache.cached_libraries(),
                vec![
                    "package:app/a.dart".to_string(),
                    "package:app/b.dart".to_string()
                ]
            );
        }
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = CollectOptions::new();
            assert!(!options.wait_paused);
            assert!(!options.function_coverage);
            assert!(options.scoped_output.is_empty());
            assert!(options.isolate_ids.is_none());
        }

        #[test]
        fn test_builder() {
            let options = CollectOptions::new()
                .with_wait_paused(true)
                .with_resume(true)
                .with_function_coverage(true)
                .with_branch_coverage(true)
                .with_scoped_output(["app"])
                .with_isolate_ids(["iso1"])
                .with_timeout(Duration::from_secs(5));

            assert!(options.wait_paused);
            assert!(options.resume_isolates);
            assert!(options.function_coverage);
            assert!(options.branch_coverage);
            assert!(options.scoped_output.contains("app"));
            assert!(options.isolate_ids.unwrap().contains("iso1"));
            assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        }
    }
}
