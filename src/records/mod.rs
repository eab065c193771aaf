//! # Record Helpers
//!
//! Single-row updates addressed by id. An update must touch exactly one
//! row; anything else is reported as a failure with the backend's message
//! when there is one.

pub mod company;
pub mod user;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::observability::{Event, Logger};
use crate::query::{FilterExpr, FilterSet};
use crate::source::{RecordWriter, SourceError};

pub use company::{Company, CompanyPatch, CompanyTheme, COMPANIES_TABLE};
pub use user::{User, UserRole, USERS_TABLE};

/// Result type for record helpers
pub type RecordResult<T> = Result<T, RecordError>;

/// Record helper errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// Id is not a version 4 UUID
    #[error("Invalid UUIDv4: {0}")]
    InvalidId(String),

    /// Backend rejected the update
    #[error("{0}")]
    Backend(#[from] SourceError),

    /// Update matched zero or several rows
    #[error("Error updating {table}: expected 1 row, matched {matched}")]
    NotExactlyOne { table: String, matched: usize },

    /// Patch or returned row did not (de)serialize
    #[error("Invalid record for {table}: {message}")]
    Serde { table: String, message: String },
}

/// True when `id` parses as a UUID with version 4
pub fn is_valid_uuid_v4(id: &str) -> bool {
    Uuid::parse_str(id)
        .map(|uuid| uuid.get_version_num() == 4)
        .unwrap_or(false)
}

/// Merge `patch` into the row of `table` whose `id_column` equals `id`
pub async fn update_by_id<W, T>(
    writer: &W,
    table: &str,
    id_column: &str,
    id: Value,
    patch: &Value,
) -> RecordResult<T>
where
    W: RecordWriter,
    T: DeserializeOwned,
{
    let filters = FilterSet::new().and(FilterExpr::eq(id_column, id));

    let mut rows = match writer.update(table, &filters, patch, "*").await {
        Ok(rows) => rows,
        Err(err) => {
            let message = err.to_string();
            Logger::event(
                Event::RecordUpdateFailed,
                &[("table", table), ("message", message.as_str())],
            );
            return Err(RecordError::Backend(err));
        }
    };

    if rows.len() != 1 {
        let matched = rows.len().to_string();
        Logger::event(
            Event::RecordUpdateFailed,
            &[("table", table), ("matched", matched.as_str())],
        );
        return Err(RecordError::NotExactlyOne {
            table: table.to_string(),
            matched: rows.len(),
        });
    }

    let row = rows.remove(0);
    serde_json::from_value(row).map_err(|e| RecordError::Serde {
        table: table.to_string(),
        message: e.to_string(),
    })
}

/// Update one company by its UUIDv4 id
pub async fn update_company<W: RecordWriter>(
    writer: &W,
    company_id: &str,
    patch: &CompanyPatch,
) -> RecordResult<Company> {
    if !is_valid_uuid_v4(company_id) {
        return Err(RecordError::InvalidId(company_id.to_string()));
    }

    let patch = serde_json::to_value(patch).map_err(|e| RecordError::Serde {
        table: COMPANIES_TABLE.to_string(),
        message: e.to_string(),
    })?;

    update_by_id(
        writer,
        COMPANIES_TABLE,
        "id",
        Value::String(company_id.to_string()),
        &patch,
    )
    .await
}
