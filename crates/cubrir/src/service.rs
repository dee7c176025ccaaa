//! Typed VM-service RPC surface.
//!
//! The debugger/introspection service speaks JSON over a WebSocket; the
//! transport is the embedder's concern. This module defines the typed
//! records mirroring each RPC response shape, the [`VmService`] trait the
//! collector drives, session [`ServiceCapabilities`] derived once from the
//! protocol version, and connection helpers with retry. A scripted
//! [`MockVmService`] backs the tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::{CovError, CovResult};

/// Interval between connection attempts and pause polls
pub const RETRY_INTERVAL: Duration = Duration::from_millis(200);

// ============================================================================
// Response records
// ============================================================================

/// VM-service protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
}

impl Version {
    /// Create a version
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Compare against a minimum version
    #[must_use]
    pub const fn at_least(self, major: u32, minor: u32) -> bool {
        self.major > major || (self.major == major && self.minor >= minor)
    }
}

/// Reference to an isolate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsolateRef {
    /// Isolate id
    pub id: String,
    /// Isolate name
    pub name: String,
    /// Group id, when the service reports it on the ref
    #[serde(default)]
    pub isolate_group_id: Option<String>,
}

impl IsolateRef {
    /// Create a reference without group information
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            isolate_group_id: None,
        }
    }

    /// Attach the isolate group id
    #[must_use]
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.isolate_group_id = Some(group_id.into());
        self
    }
}

/// Reference to an isolate group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolateGroupRef {
    /// Group id
    pub id: String,
}

/// Top-level VM description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vm {
    /// Live isolates
    #[serde(default)]
    pub isolates: Vec<IsolateRef>,
    /// Isolate groups
    #[serde(default)]
    pub isolate_groups: Vec<IsolateGroupRef>,
}

/// Event kinds the collector reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Paused at start
    PauseStart,
    /// Paused on an uncaught exception
    PauseException,
    /// Paused at exit
    PauseExit,
    /// Paused by an interrupt
    PauseInterrupted,
    /// Paused at a breakpoint
    PauseBreakpoint,
    /// Running again
    Resume,
    /// Anything else the service may emit
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Check whether this kind means the isolate sits at a pause point
    #[must_use]
    pub const fn is_paused(self) -> bool {
        matches!(
            self,
            Self::PauseStart
                | Self::PauseException
                | Self::PauseExit
                | Self::PauseInterrupted
                | Self::PauseBreakpoint
        )
    }
}

/// A service event attached to an isolate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event kind
    pub kind: EventKind,
}

/// Full isolate description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Isolate {
    /// Isolate id
    pub id: String,
    /// Isolate name
    pub name: String,
    /// Last pause/resume event
    #[serde(default)]
    pub pause_event: Option<Event>,
}

/// Full isolate-group description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolateGroup {
    /// Group id
    pub id: String,
    /// Member isolates
    #[serde(default)]
    pub isolates: Vec<IsolateRef>,
}

/// Reference to a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRef {
    /// Script object id
    pub id: String,
    /// Script URI
    pub uri: String,
}

/// Reference to a library, class, or function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjRef {
    /// Object id
    pub id: String,
    /// Object name, when the service reports one
    #[serde(default)]
    pub name: Option<String>,
}

/// Full script object.
///
/// `token_pos_table` rows are `[line, tokenPos, column, tokenPos, column,
/// ...]`, sorted by line; the element at index 1 is the row's minimum token
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Script object id
    pub id: String,
    /// Script URI
    pub uri: String,
    /// Owning library
    #[serde(default)]
    pub library: Option<ObjRef>,
    /// Token-position table
    #[serde(default)]
    pub token_pos_table: Vec<Vec<i64>>,
}

/// Full library object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// Library object id
    pub id: String,
    /// Library URI
    pub uri: String,
    /// Top-level functions
    #[serde(default)]
    pub functions: Vec<ObjRef>,
    /// Classes
    #[serde(default)]
    pub classes: Vec<ObjRef>,
}

/// Full class object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Class object id
    pub id: String,
    /// Class name
    pub name: String,
    /// Member functions
    #[serde(default)]
    pub functions: Vec<ObjRef>,
}

/// Owner of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionOwner {
    /// Owned by a class
    Class {
        /// Class name
        name: String,
    },
    /// Owned directly by a library
    Library,
}

/// Source location of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    /// Script holding the declaration
    pub script: ScriptRef,
    /// Token position within the script
    pub token_pos: i64,
}

/// Full function object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    /// Function object id
    pub id: String,
    /// Function name; absent for some synthetic functions
    #[serde(default)]
    pub name: Option<String>,
    /// Function kind, e.g. `RegularFunction`
    pub kind: String,
    /// Owner, when reported
    #[serde(default)]
    pub owner: Option<FunctionOwner>,
    /// Declaration location
    #[serde(default)]
    pub location: Option<SourceLocation>,
    /// Whether the function is abstract
    #[serde(default)]
    pub is_abstract: bool,
    /// Whether the function is compiler-generated
    #[serde(default)]
    pub implicit: bool,
}

/// Tagged response of `get_object`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VmObject {
    /// A script
    Script(Script),
    /// A library
    Library(Library),
    /// A class
    Class(Class),
    /// A function
    Function(Function),
}

/// Coverage kinds a source report can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceReportKind {
    /// Line coverage
    Coverage,
    /// Branch coverage
    BranchCoverage,
}

impl SourceReportKind {
    /// Wire name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coverage => "Coverage",
            Self::BranchCoverage => "BranchCoverage",
        }
    }
}

/// Hit and miss lines of one report range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReportCoverage {
    /// Lines that executed
    #[serde(default)]
    pub hits: Vec<u32>,
    /// Lines that were compiled but never executed
    #[serde(default)]
    pub misses: Vec<u32>,
}

/// One code range of a source report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReportRange {
    /// Index into the report's script table
    pub script_index: usize,
    /// Whether the range was compiled
    #[serde(default)]
    pub compiled: bool,
    /// Line coverage for the range
    #[serde(default)]
    pub coverage: Option<SourceReportCoverage>,
    /// Branch coverage for the range
    #[serde(default)]
    pub branch_coverage: Option<SourceReportCoverage>,
}

/// A source report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Code ranges
    #[serde(default)]
    pub ranges: Vec<SourceReportRange>,
    /// Scripts referenced by the ranges
    #[serde(default)]
    pub scripts: Vec<ScriptRef>,
}

/// Parameters of `get_source_report` beyond the report kinds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReportRequest {
    /// Compile not-yet-compiled code so misses are reported
    pub force_compile: bool,
    /// Restrict the report to one script
    pub script_id: Option<String>,
    /// Report line numbers instead of token positions
    pub report_lines: bool,
    /// Restrict the report to libraries matching these URI prefixes
    pub library_filters: Option<Vec<String>>,
    /// Libraries whose coverable lines the caller already knows
    pub libraries_already_compiled: Option<Vec<String>>,
}

// ============================================================================
// Capabilities
// ============================================================================

/// Feature gates derived once from the service version at session start
/// and passed along instead of re-querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceCapabilities {
    /// Branch coverage in source reports (3.56)
    pub branch_coverage: bool,
    /// `library_filters` on whole-isolate reports (3.57)
    pub library_filters: bool,
    /// Group ids available directly on isolate refs (3.61)
    pub fast_isolate_groups: bool,
    /// `libraries_already_compiled` on report requests (4.13)
    pub line_cache: bool,
}

impl ServiceCapabilities {
    /// Derive the gates from a protocol version
    #[must_use]
    pub const fn from_version(version: Version) -> Self {
        Self {
            branch_coverage: version.at_least(3, 56),
            library_filters: version.at_least(3, 57),
            fast_isolate_groups: version.at_least(3, 61),
            line_cache: version.at_least(4, 13),
        }
    }
}

// ============================================================================
// RPC surface
// ============================================================================

/// The VM-service operations the collector drives.
///
/// Implementations own the transport (WebSocket + JSON frames). A stale
/// isolate answers with [`CovError::StaleIsolate`]; the collector skips it
/// and continues.
#[async_trait]
pub trait VmService: Send + Sync + std::fmt::Debug {
    /// Protocol version
    async fn get_version(&self) -> CovResult<Version>;

    /// VM description with live isolates and groups
    async fn get_vm(&self) -> CovResult<Vm>;

    /// Full isolate description
    async fn get_isolate(&self, isolate_id: &str) -> CovResult<Isolate>;

    /// Full isolate-group description
    async fn get_isolate_group(&self, group_id: &str) -> CovResult<IsolateGroup>;

    /// Scripts loaded in an isolate
    async fn get_scripts(&self, isolate_id: &str) -> CovResult<Vec<ScriptRef>>;

    /// Fetch a script, library, class, or function object
    async fn get_object(&self, isolate_id: &str, object_id: &str) -> CovResult<VmObject>;

    /// Coverage source report for an isolate or a single script
    async fn get_source_report(
        &self,
        isolate_id: &str,
        kinds: &[SourceReportKind],
        request: &SourceReportRequest,
    ) -> CovResult<SourceReport>;

    /// Resume a paused isolate
    async fn resume(&self, isolate_id: &str) -> CovResult<()>;

    /// Release the service handle and its transport
    async fn dispose(&self) -> CovResult<()>;
}

/// Establishes VM-service sessions over some transport.
///
/// Implementations should disable socket compression; coverage payloads are
/// large and the service sends them in bursts.
#[async_trait]
pub trait ServiceConnector: Send + Sync {
    /// Open a session against a WebSocket URI
    async fn connect(&self, uri: &str) -> CovResult<Box<dyn VmService>>;
}

/// Rewrite a service URI to its WebSocket form: `ws`/`wss` scheme, empty
/// path segments dropped, a trailing `ws` segment appended.
#[must_use]
pub fn websocket_uri(uri: &str) -> String {
    let (scheme, rest) = uri.split_once("://").unwrap_or(("ws", uri));
    let scheme = match scheme {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    let (authority, path) = rest
        .split_once('/')
        .map_or((rest, ""), |(authority, path)| (authority, path));
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.push("ws");
    format!("{scheme}://{authority}/{}", segments.join("/"))
}

/// Connect to a VM service, retrying until the budget elapses.
///
/// The URI is rewritten with [`websocket_uri`]; each attempt dials the
/// transport and issues `get_vm` to prove the session is live. Attempts
/// repeat at [`RETRY_INTERVAL`].
///
/// # Errors
///
/// [`CovError::ConnectTimeout`] once the budget is spent.
pub async fn connect(
    connector: &dyn ServiceConnector,
    uri: &str,
    timeout: Duration,
) -> CovResult<Box<dyn VmService>> {
    let ws_uri = websocket_uri(uri);
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(service) = try_connect(connector, &ws_uri).await {
            return Ok(service);
        }
        if tokio::time::Instant::now() + RETRY_INTERVAL > deadline {
            #[allow(clippy::cast_possible_truncation)]
            return Err(CovError::ConnectTimeout {
                uri: ws_uri,
                ms: timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(RETRY_INTERVAL).await;
    }
}

async fn try_connect(
    connector: &dyn ServiceConnector,
    uri: &str,
) -> CovResult<Box<dyn VmService>> {
    let service = connector.connect(uri).await?;
    let _ = service.get_vm().await?;
    Ok(service)
}

// ============================================================================
// Scripted mock
// ============================================================================

/// Scripted VM service for tests.
///
/// Responses come from in-memory tables; every call is appended to a
/// history so tests can assert on the wire traffic.
#[derive(Debug)]
pub struct MockVmService {
    /// Reported protocol version
    pub version: Version,
    /// Reported VM description
    pub vm: Vm,
    /// Isolates by id
    pub isolates: HashMap<String, Isolate>,
    /// Isolate groups by id
    pub isolate_groups: HashMap<String, IsolateGroup>,
    /// Script tables by isolate id
    pub scripts: HashMap<String, Vec<ScriptRef>>,
    /// Objects by object id
    pub objects: HashMap<String, VmObject>,
    /// Whole-isolate source reports by isolate id
    pub reports: HashMap<String, SourceReport>,
    /// Per-script source reports by `(isolate id, script id)`
    pub script_reports: HashMap<(String, String), SourceReport>,
    /// Isolates that answer every RPC with a stale sentinel
    pub stale_isolates: HashSet<String>,
    call_history: Mutex<Vec<String>>,
}

impl Default for MockVmService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVmService {
    /// Create a mock reporting a current protocol version
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: Version::new(4, 13),
            vm: Vm::default(),
            isolates: HashMap::new(),
            isolate_groups: HashMap::new(),
            scripts: HashMap::new(),
            objects: HashMap::new(),
            reports: HashMap::new(),
            script_reports: HashMap::new(),
            stale_isolates: HashSet::new(),
            call_history: Mutex::new(Vec::new()),
        }
    }

    /// Override the reported protocol version
    #[must_use]
    pub const fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Register a paused isolate and add it to the VM
    pub fn add_isolate(&mut self, isolate_ref: IsolateRef, pause_kind: EventKind) {
        let _ = self.isolates.insert(
            isolate_ref.id.clone(),
            Isolate {
                id: isolate_ref.id.clone(),
                name: isolate_ref.name.clone(),
                pause_event: Some(Event { kind: pause_kind }),
            },
        );
        self.vm.isolates.push(isolate_ref);
    }

    /// Register an isolate group and add it to the VM
    pub fn add_isolate_group(&mut self, group: IsolateGroup) {
        self.vm.isolate_groups.push(IsolateGroupRef {
            id: group.id.clone(),
        });
        let _ = self.isolate_groups.insert(group.id.clone(), group);
    }

    /// Snapshot of the recorded call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Check whether any recorded call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.history().iter().any(|call| call.starts_with(prefix))
    }

    fn record(&self, call: String) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(call);
        }
    }

    fn check_stale(&self, isolate_id: &str) -> CovResult<()> {
        if self.stale_isolates.contains(isolate_id) {
            return Err(CovError::stale_isolate(format!(
                "{isolate_id} has been collected"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VmService for MockVmService {
    async fn get_version(&self) -> CovResult<Version> {
        self.record("getVersion".to_string());
        Ok(self.version)
    }

    async fn get_vm(&self) -> CovResult<Vm> {
        self.record("getVM".to_string());
        Ok(self.vm.clone())
    }

    async fn get_isolate(&self, isolate_id: &str) -> CovResult<Isolate> {
        self.record(format!("getIsolate:{isolate_id}"));
        self.check_stale(isolate_id)?;
        self.isolates
            .get(isolate_id)
            .cloned()
            .ok_or_else(|| CovError::service(format!("unknown isolate {isolate_id}")))
    }

    async fn get_isolate_group(&self, group_id: &str) -> CovResult<IsolateGroup> {
        self.record(format!("getIsolateGroup:{group_id}"));
        self.isolate_groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| CovError::service(format!("unknown group {group_id}")))
    }

    async fn get_scripts(&self, isolate_id: &str) -> CovResult<Vec<ScriptRef>> {
        self.record(format!("getScripts:{isolate_id}"));
        self.check_stale(isolate_id)?;
        Ok(self.scripts.get(isolate_id).cloned().unwrap_or_default())
    }

    async fn get_object(&self, isolate_id: &str, object_id: &str) -> CovResult<VmObject> {
        self.record(format!("getObject:{isolate_id}:{object_id}"));
        self.check_stale(isolate_id)?;
        self.objects
            .get(object_id)
            .cloned()
            .ok_or_else(|| CovError::service(format!("unknown object {object_id}")))
    }

    async fn get_source_report(
        &self,
        isolate_id: &str,
        kinds: &[SourceReportKind],
        request: &SourceReportRequest,
    ) -> CovResult<SourceReport> {
        let kinds: Vec<&str> = kinds.iter().map(|kind| kind.as_str()).collect();
        let mut call = format!("getSourceReport:{isolate_id}:{}", kinds.join("+"));
        if let Some(script_id) = &request.script_id {
            call.push_str(&format!(":script={script_id}"));
        }
        if let Some(filters) = &request.library_filters {
            call.push_str(&format!(":filters={}", filters.join(",")));
        }
        if let Some(compiled) = &request.libraries_already_compiled {
            call.push_str(&format!(":alreadyCompiled={}", compiled.join(",")));
        }
        self.record(call);
        self.check_stale(isolate_id)?;

        if let Some(script_id) = &request.script_id {
            let key = (isolate_id.to_string(), script_id.clone());
            return self
                .script_reports
                .get(&key)
                .cloned()
                .ok_or_else(|| CovError::service(format!("no report for script {script_id}")));
        }
        self.reports
            .get(isolate_id)
            .cloned()
            .ok_or_else(|| CovError::service(format!("no report for isolate {isolate_id}")))
    }

    async fn resume(&self, isolate_id: &str) -> CovResult<()> {
        self.record(format!("resume:{isolate_id}"));
        self.check_stale(isolate_id)
    }

    async fn dispose(&self) -> CovResult<()> {
        self.record("dispose".to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod version_tests {
        use super::*;

        #[test]
        fn test_at_least() {
            let version = Version::new(3, 61);
            assert!(version.at_least(3, 61));
            assert!(version.at_least(3, 56));
            assert!(version.at_least(2, 99));
            assert!(!version.at_least(3, 62));
            assert!(!version.at_least(4, 0));
        }

        #[test]
        fn test_capabilities_old_service() {
            let caps = ServiceCapabilities::from_version(Version::new(3, 55));
            assert!(!caps.branch_coverage);
            assert!(!caps.library_filters);
            assert!(!caps.fast_isolate_groups);
            assert!(!caps.line_cache);
        }

        #[test]
        fn test_capabilities_staggered_gates() {
            let caps = ServiceCapabilities::from_version(Version::new(3, 57));
            assert!(caps.branch_coverage);
            assert!(caps.library_filters);
            assert!(!caps.fast_isolate_groups);

            let caps = ServiceCapabilities::from_version(Version::new(4, 13));
            assert!(caps.fast_isolate_groups);
            assert!(caps.line_cache);
        }
    }

    mod uri_tests {
        use super::*;

        #[test]
        fn test_http_scheme_rewritten() {
            assert_eq!(
                websocket_uri("http://127.0.0.1:8181/"),
                "ws://127.0.0.1:8181/ws"
            );
        }

        #[test]
        fn test_https_becomes_wss() {
            assert_eq!(
                websocket_uri("https://host:8181/token/"),
                "wss://host:8181/token/ws"
            );
        }

        #[test]
        fn test_trailing_slashes_normalized() {
            assert_eq!(
                websocket_uri("http://host:1234//auth//"),
                "ws://host:1234/auth/ws"
            );
        }

        #[test]
        fn test_ws_scheme_kept() {
            assert_eq!(websocket_uri("ws://host:1/a"), "ws://host:1/a/ws");
        }
    }

    mod connect_tests {
        use super::*;
        use std::sync::atomic::{AtomicU32, Ordering};

        /// Connector that fails a fixed number of times before succeeding
        struct FlakyConnector {
            failures_left: AtomicU32,
        }

        #[async_trait]
        impl ServiceConnector for FlakyConnector {
            async fn connect(&self, _uri: &str) -> CovResult<Box<dyn VmService>> {
                if self.failures_left.fetch_sub(1, Ordering::SeqCst) > 0 {
                    return Err(CovError::service("connection refused"));
                }
                Ok(Box::new(MockVmService::new()))
            }
        }

        #[tokio::test]
        async fn test_connect_retries_until_success() {
            let connector = FlakyConnector {
                failures_left: AtomicU32::new(2),
            };
            let service = connect(&connector, "http://127.0.0.1:8181/", Duration::from_secs(2))
                .await
                .unwrap();
            assert!(service.get_version().await.is_ok());
        }

        #[tokio::test]
        async fn test_connect_times_out() {
            let connector = FlakyConnector {
                failures_left: AtomicU32::new(u32::MAX),
            };
            let err = connect(&connector, "http://127.0.0.1:1/", Duration::from_millis(50))
                .await
                .unwrap_err();
            assert!(matches!(err, CovError::ConnectTimeout { .. }));
        }
    }

    mod mock_tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_records_history() {
            let mut mock = MockVmService::new();
            mock.add_isolate(IsolateRef::new("iso1", "main"), EventKind::PauseStart);

            let _ = mock.get_vm().await.unwrap();
            let _ = mock.get_isolate("iso1").await.unwrap();
            assert!(mock.was_called("getVM"));
            assert!(mock.was_called("getIsolate:iso1"));
        }

        #[tokio::test]
        async fn test_mock_stale_isolate() {
            let mut mock = MockVmService::new();
            mock.add_isolate(IsolateRef::new("iso1", "main"), EventKind::PauseStart);
            let _ = mock.stale_isolates.insert("iso1".to_string());

            let err = mock.get_isolate("iso1").await.unwrap_err();
            assert!(err.is_stale());
        }

        #[tokio::test]
        async fn test_mock_source_report_call_encoding() {
            let mut mock = MockVmService::new();
            let _ = mock.reports.insert("iso1".to_string(), SourceReport::default());

            let request = SourceReportRequest {
                force_compile: true,
                report_lines: true,
                library_filters: Some(vec!["package:app/".to_string()]),
                ..Default::default()
            };
            let _ = mock
                .get_source_report("iso1", &[SourceReportKind::Coverage], &request)
                .await
                .unwrap();
            assert!(mock.was_called("getSourceReport:iso1:Coverage:filters=package:app/"));
        }
    }
}
