//! Result and error types for coverage collection and formatting.

use thiserror::Error;

/// Result type for coverage operations
pub type CovResult<T> = Result<T, CovError>;

/// Errors that can occur while collecting, lowering, or formatting coverage
#[derive(Debug, Error)]
pub enum CovError {
    /// The VM service could not be reached within the connection budget
    #[error("Failed to connect to the VM service at {uri} within {ms}ms")]
    ConnectTimeout {
        /// WebSocket URI that was dialed
        uri: String,
        /// Connection budget in milliseconds
        ms: u64,
    },

    /// Not every isolate reached a pause event within the budget
    #[error("Timed out after {ms}ms waiting for all isolates to pause")]
    PauseTimeout {
        /// Pause budget in milliseconds
        ms: u64,
    },

    /// The VM reported zero isolates
    #[error("No isolates")]
    NoIsolates,

    /// An RPC was answered with a sentinel because the isolate is shutting
    /// down. The collector always swallows this and moves on.
    #[error("Stale isolate: {message}")]
    StaleIsolate {
        /// Sentinel detail from the service
        message: String,
    },

    /// Generic VM-service RPC failure
    #[error("VM service error: {message}")]
    Service {
        /// Error message
        message: String,
    },

    /// A precise-coverage range or interchange entry was malformed
    #[error("Invalid coverage entry: {message}")]
    InvalidCoverageEntry {
        /// What was malformed
        message: String,
    },

    /// Two merged records disagree about the function declared on a line
    #[error(
        "Cannot merge coverage for {source_uri}: line {line} is named both \
         '{existing}' and '{incoming}'"
    )]
    InconsistentFunctionName {
        /// Source URI of the conflicting record
        source_uri: String,
        /// Declaration line with two names
        line: u32,
        /// Name already recorded
        existing: String,
        /// Name arriving from the merge
        incoming: String,
    },

    /// Function-level output was requested on data collected without it
    #[error("Function coverage formatting requires function coverage data")]
    MissingFunctionCoverage,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CovError {
    /// Create a generic VM-service error
    #[must_use]
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Create a stale-isolate error
    #[must_use]
    pub fn stale_isolate(message: impl Into<String>) -> Self {
        Self::StaleIsolate {
            message: message.into(),
        }
    }

    /// Create an invalid-entry error
    #[must_use]
    pub fn invalid_entry(message: impl Into<String>) -> Self {
        Self::InvalidCoverageEntry {
            message: message.into(),
        }
    }

    /// Check whether this error marks an isolate that died mid-collection
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleIsolate { .. })
    }
}
