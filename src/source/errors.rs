//! # Query Source Errors

use thiserror::Error;

/// Result type for query source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors reported by a query source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The backend rejected the request
    #[error("{message}")]
    Backend {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    /// Relation does not exist
    #[error("relation \"{0}\" does not exist")]
    RelationNotFound(String),

    /// Request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Source-internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SourceError {
    /// Backend rejection with only a message
    pub fn backend(message: impl Into<String>) -> Self {
        SourceError::Backend {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// HTTP status, when the source speaks HTTP
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Backend { status, .. } => *status,
            SourceError::RelationNotFound(_) => Some(404),
            _ => None,
        }
    }
}
