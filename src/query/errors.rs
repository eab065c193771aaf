//! # Query Errors
//!
//! Contract violations in filter construction and parse failures in the
//! textual `field=op.value` syntax.

use thiserror::Error;

/// Result type for query model operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Query model errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Filter names no column
    #[error("Filter field must not be empty")]
    EmptyField,

    /// `in` operand is not an array
    #[error("Value for 'in' filter on '{0}' must be an array")]
    InOperandNotArray(String),

    /// `in` operand is an empty array
    #[error("Value for 'in' filter on '{0}' must not be empty")]
    EmptyInOperand(String),

    /// Operand is JSON null; the backend compares it as the text `null`
    /// and SQL NULL never compares equal, so the filter would match nothing
    #[error("Value for '{operator}' filter on '{field}' must not be null")]
    NullOperand { field: String, operator: &'static str },

    /// Comparison operand is an array or object
    #[error("Value for '{operator}' filter on '{field}' must be a scalar")]
    NonScalarOperand { field: String, operator: &'static str },

    /// Textual filter could not be parsed
    #[error("Invalid filter expression: {0}")]
    InvalidExpression(String),
}
