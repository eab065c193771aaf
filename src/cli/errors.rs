//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::query::QueryError;
use crate::source::SourceError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout)
    IoError,
    /// Filter argument could not be parsed
    InvalidFilter,
    /// Backend client could not be built
    BackendError,
    /// Fetch or count failed
    FetchFailed,
    /// Async runtime could not start
    RuntimeFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "LT_CLI_CONFIG_ERROR",
            Self::IoError => "LT_CLI_IO_ERROR",
            Self::InvalidFilter => "LT_CLI_INVALID_FILTER",
            Self::BackendError => "LT_CLI_BACKEND_ERROR",
            Self::FetchFailed => "LT_CLI_FETCH_FAILED",
            Self::RuntimeFailed => "LT_CLI_RUNTIME_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Runtime startup failed
    pub fn runtime_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::RuntimeFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        Self::new(CliErrorCode::InvalidFilter, e.to_string())
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        Self::new(CliErrorCode::BackendError, e.to_string())
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidFilter(inner) => inner.into(),
            other => Self::new(CliErrorCode::FetchFailed, other.message()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::config_error("Config has no backend section");
        assert_eq!(
            err.to_string(),
            "LT_CLI_CONFIG_ERROR: Config has no backend section"
        );
    }

    #[test]
    fn test_fetch_error_mapping() {
        let err: CliError = FetchError::MissingCount.into();
        assert_eq!(err.code(), &CliErrorCode::FetchFailed);
        assert_eq!(err.message(), "Error fetching data");

        let err: CliError = FetchError::InvalidFilter(QueryError::EmptyField).into();
        assert_eq!(err.code_str(), "LT_CLI_INVALID_FILTER");
    }
}
