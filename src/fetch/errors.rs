//! # Fetch Errors
//!
//! Only the count stage and caller contract violations fail a fetch.
//! Chunk failures and duplicate ids are absorbed and logged.

use thiserror::Error;

use crate::query::QueryError;
use crate::source::SourceError;

/// Result type for chunked reads
pub type FetchResult<T> = Result<T, FetchError>;

/// Chunked read errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Count query rejected; carries the backend's diagnostic
    #[error("{0}")]
    Count(SourceError),

    /// Count query answered without a count
    #[error("Error fetching data")]
    MissingCount,

    /// Filter violates its operator's operand contract
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] QueryError),

    /// A row did not match the requested row type
    #[error("Failed to decode row {index} of {table}: {message}")]
    Decode {
        table: String,
        index: usize,
        message: String,
    },
}

impl FetchError {
    /// Diagnostic message for callers that surface errors as text
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// True when the backend, not the caller, caused the failure
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, FetchError::Count(_) | FetchError::MissingCount)
    }
}
