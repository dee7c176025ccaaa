//! Source-URI resolution and file loading seams.
//!
//! Reports are keyed by source URIs (`package:app/main.dart`,
//! `file:///home/x/main.dart`, plain paths). Turning those into local files
//! is environment-specific, so the formatters and the JSON parser take these
//! capabilities as trait objects instead of touching the filesystem
//! themselves.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Maps source URIs to local filesystem paths.
///
/// Returning `None` means the URI cannot be mapped; callers drop the entry.
pub trait Resolver: std::fmt::Debug {
    /// Resolve a source URI to a local path
    fn resolve(&self, uri: &str) -> Option<String>;
}

/// Loads a file as lines, for ignore-directive scanning and annotated
/// listings.
pub trait Loader {
    /// Load the file at `path`, or `None` if it cannot be read
    fn load(&self, path: &str) -> Option<Vec<String>>;
}

/// Resolver that hands every URI back unchanged.
///
/// Useful when coverage sources are already filesystem paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl Resolver for IdentityResolver {
    fn resolve(&self, uri: &str) -> Option<String> {
        Some(uri.to_string())
    }
}

/// Resolver backed by a `package name -> lib directory` table.
///
/// `package:name/rest` resolves under the registered directory, `file:` URIs
/// are stripped to their path, and anything else passes through unchanged.
/// Unregistered packages resolve to `None`.
#[derive(Debug, Clone, Default)]
pub struct PackageResolver {
    roots: BTreeMap<String, PathBuf>,
}

impl PackageResolver {
    /// Create an empty resolver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the lib directory of a package
    #[must_use]
    pub fn with_root(mut self, package: impl Into<String>, lib_dir: impl Into<PathBuf>) -> Self {
        let _ = self.roots.insert(package.into(), lib_dir.into());
        self
    }

    /// Number of registered packages
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Check whether any packages are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl Resolver for PackageResolver {
    fn resolve(&self, uri: &str) -> Option<String> {
        if let Some(rest) = uri.strip_prefix("package:") {
            let (package, path) = rest.split_once('/')?;
            let root = self.roots.get(package)?;
            return Some(root.join(path).to_string_lossy().into_owned());
        }
        if let Some(path) = uri.strip_prefix("file://") {
            return Some(path.to_string());
        }
        Some(uri.to_string())
    }
}

/// Loader reading from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl Loader for FileLoader {
    fn load(&self, path: &str) -> Option<Vec<String>> {
        let content = std::fs::read_to_string(path).ok()?;
        Some(content.lines().map(str::to_string).collect())
    }
}

/// In-memory loader for tests and embedders that already hold sources.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: BTreeMap<String, Vec<String>>,
}

impl MemoryLoader {
    /// Create an empty loader
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file's lines
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, lines: &[&str]) -> Self {
        let _ = self
            .files
            .insert(path.into(), lines.iter().map(|&l| l.to_string()).collect());
        self
    }
}

impl Loader for MemoryLoader {
    fn load(&self, path: &str) -> Option<Vec<String>> {
        self.files.get(path).cloned()
    }
}

/// Loader that never finds anything; disables ignore scanning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoader;

impl Loader for NullLoader {
    fn load(&self, _path: &str) -> Option<Vec<String>> {
        None
    }
}
