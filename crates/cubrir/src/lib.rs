//! Cubrir: coverage collection and normalization for VM-service runtimes.
//!
//! Cubrir (Spanish: "to cover") drives the debugger/introspection service
//! of a running program to obtain execution hit data from all of its
//! isolates, deduplicates isolate groups that share compiled code, and
//! folds everything into one canonical per-file hit map. Browser-style
//! precise coverage (byte-offset ranges over compiled scripts) lowers into
//! the same form through source maps. Hit maps merge across runs, honor
//! in-source ignore directives, and serialize to LCOV or an annotated
//! source listing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     CUBRIR Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐     ┌────────────┐     ┌────────────┐          │
//! │   │ VM service │────►│ Collector  │────►│            │          │
//! │   │ (isolates) │     │ (dedup)    │     │  Coverage  │   LCOV   │
//! │   └────────────┘     └────────────┘     │    Set     │──►  +    │
//! │   ┌────────────┐     ┌────────────┐     │ (hit maps) │  pretty  │
//! │   │  Precise   │────►│ Source-map │────►│            │          │
//! │   │  coverage  │     │  lowering  │     └────────────┘          │
//! │   └────────────┘     └────────────┘                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The WebSocket transport, the source-map decoder, and filesystem access
//! are injected capabilities: [`service::ServiceConnector`],
//! [`precise::ScriptSourceProvider`], [`resolver::Resolver`] and
//! [`resolver::Loader`].

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays))]

pub mod collector;
pub mod formatters;
pub mod hitmap;
pub mod ignore;
pub mod precise;
pub mod resolver;
pub mod result;
pub mod service;

pub use collector::{collect, wait_for_all_paused, CollectOptions, CoverableLineCache};
pub use formatters::{LcovFormatter, PrettyFormatter};
pub use hitmap::{CoverageSet, HitMap};
pub use ignore::{ignored_lines, IGNORE_END, IGNORE_LINE, IGNORE_START};
pub use precise::{
    lower_precise_coverage, CoverageRange, FunctionCoverage, LowerOptions, ScriptCoverage,
    ScriptSourceProvider, SourceMap, SourceMapEntry,
};
pub use resolver::{
    FileLoader, IdentityResolver, Loader, MemoryLoader, NullLoader, PackageResolver, Resolver,
};
pub use result::{CovError, CovResult};
pub use service::{
    connect, websocket_uri, MockVmService, ServiceCapabilities, ServiceConnector, VmService,
};
