//! Configuration file handling
//!
//! A single JSON document. Every field has a default except the backend
//! connection, which is only needed by commands that talk to a server.
//!
//! ```json
//! {
//!   "log_level": "info",
//!   "reader": { "chunk_size": 4500, "max_in_values": 100, "id_column": "id", "row_cap": 5000 },
//!   "backend": { "url": "https://project.example.co", "api_key": "..." }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::{CHUNK_SIZE, MAX_IN_UUIDS};
use crate::observability::{Event, Logger, Severity};
use crate::source::memory::DEFAULT_ROW_CAP;

/// Result type for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Config has no backend section")]
    MissingBackend,
}

/// Top-level configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minimum log severity: trace, info, warn, error, fatal (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Chunked reader settings
    #[serde(default)]
    pub reader: ReaderConfig,

    /// Backend connection (required by commands that query a server)
    #[serde(default)]
    pub backend: Option<BackendConfig>,
}

/// Chunked reader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Rows requested per range query (default: 4500)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// `in` list size above which a warning is logged (default: 100)
    #[serde(default = "default_max_in_values")]
    pub max_in_values: usize,

    /// Unique, totally ordered column used for ordering and the duplicate check
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Backend's maximum rows per query (default: 5000)
    #[serde(default = "default_row_cap")]
    pub row_cap: u64,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, with or without the `/rest/v1` suffix
    pub url: String,

    /// Project API key, sent as `apikey`
    pub api_key: String,

    /// User access token; the API key is used as bearer when absent
    #[serde(default)]
    pub access_token: Option<String>,

    /// Database schema (default: "public")
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_chunk_size() -> u64 {
    CHUNK_SIZE
}
fn default_max_in_values() -> usize {
    MAX_IN_UUIDS
}
fn default_id_column() -> String {
    "id".to_string()
}
fn default_row_cap() -> u64 {
    DEFAULT_ROW_CAP
}
fn default_schema() -> String {
    "public".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            reader: ReaderConfig::default(),
            backend: None,
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_in_values: default_max_in_values(),
            id_column: default_id_column(),
            row_cap: default_row_cap(),
        }
    }
}

impl ReaderConfig {
    /// Chunk size must be positive and fit under the row cap, or chunks
    /// would be silently truncated by the backend
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("reader.chunk_size must be > 0".to_string()));
        }
        if self.chunk_size > self.row_cap {
            return Err(ConfigError::Invalid(format!(
                "reader.chunk_size ({}) exceeds reader.row_cap ({})",
                self.chunk_size, self.row_cap
            )));
        }
        if self.max_in_values == 0 {
            return Err(ConfigError::Invalid("reader.max_in_values must be > 0".to_string()));
        }
        if self.id_column.trim().is_empty() {
            return Err(ConfigError::Invalid("reader.id_column must not be empty".to_string()));
        }
        Ok(())
    }
}

impl BackendConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "backend.url must be an http(s) URL, got '{}'",
                self.url
            )));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Invalid("backend.api_key must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("backend.timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;

        let path_str = path.display().to_string();
        let chunk_size = config.reader.chunk_size.to_string();
        Logger::info(
            Event::ConfigLoaded,
            &[("path", path_str.as_str()), ("chunk_size", chunk_size.as_str())],
        );
        Ok(config)
    }

    /// Parse and validate a configuration document
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.severity()?;
        self.reader.validate()?;
        if let Some(backend) = &self.backend {
            backend.validate()?;
        }
        Ok(())
    }

    /// Configured minimum log severity
    pub fn severity(&self) -> ConfigResult<Severity> {
        Severity::parse(&self.log_level)
            .ok_or_else(|| ConfigError::Invalid(format!("Unknown log_level '{}'", self.log_level)))
    }

    /// Backend section, required by server-facing commands
    pub fn backend(&self) -> ConfigResult<&BackendConfig> {
        self.backend.as_ref().ok_or(ConfigError::MissingBackend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.reader, ReaderConfig::default());
        assert_eq!(config.reader.chunk_size, 4500);
        assert_eq!(config.reader.max_in_values, 100);
        assert_eq!(config.reader.id_column, "id");
        assert!(config.backend.is_none());
        assert!(matches!(config.backend(), Err(ConfigError::MissingBackend)));
    }

    #[test]
    fn test_backend_defaults() {
        let config = Config::from_json(
            r#"{"backend": {"url": "https://project.example.co", "api_key": "k"}}"#,
        )
        .unwrap();
        let backend = config.backend().unwrap();
        assert_eq!(backend.schema, "public");
        assert_eq!(backend.timeout_secs, 30);
        assert!(backend.access_token.is_none());
    }

    #[test]
    fn test_chunk_size_must_fit_row_cap() {
        let err = Config::from_json(r#"{"reader": {"chunk_size": 6000}}"#).unwrap_err();
        assert!(err.to_string().contains("exceeds reader.row_cap"));

        assert!(Config::from_json(r#"{"reader": {"chunk_size": 0}}"#).is_err());
        assert!(Config::from_json(r#"{"reader": {"id_column": " "}}"#).is_err());
    }

    #[test]
    fn test_rejects_bad_backend_and_level() {
        assert!(Config::from_json(r#"{"backend": {"url": "ftp://x", "api_key": "k"}}"#).is_err());
        assert!(Config::from_json(r#"{"log_level": "loud"}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"log_level": "warn", "reader": {{"chunk_size": 1000}}}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.reader.chunk_size, 1000);
        assert_eq!(config.severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/largetable.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
