//! # Query Sources
//!
//! The backend as seen by the chunked reader: a head-only count and an
//! ordered range select, both taking the same filter set. Writers add a
//! filtered update for the record helpers.
//!
//! Sources are constructed once and injected; the reader only borrows them.

pub mod errors;
pub mod memory;
pub mod postgrest;

use std::future::Future;

use serde_json::Value;

use crate::query::{FilterSet, OrderBy, RowRange};

pub use errors::{SourceError, SourceResult};
pub use memory::InMemorySource;
pub use postgrest::PostgrestSource;

/// Read primitives required by the chunked reader
pub trait QuerySource: Send + Sync {
    /// Number of rows matching `filters`, without row payloads.
    ///
    /// `select` is the same column list the range queries use; embedded
    /// resources in it can change which rows match.
    /// `Ok(None)` means the backend answered without a count.
    fn count(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
    ) -> impl Future<Output = SourceResult<Option<u64>>> + Send;

    /// Rows matching `filters`, sorted by `order`, restricted to `range`
    fn select_range(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        order: &OrderBy,
        range: RowRange,
    ) -> impl Future<Output = SourceResult<Vec<Value>>> + Send;
}

/// Write primitive used by the record helpers
pub trait RecordWriter: Send + Sync {
    /// Merge `patch` into every row matching `filters`; returns the updated
    /// rows projected through `select`
    fn update(
        &self,
        table: &str,
        filters: &FilterSet,
        patch: &Value,
        select: &str,
    ) -> impl Future<Output = SourceResult<Vec<Value>>> + Send;
}

impl<S: QuerySource> QuerySource for &S {
    fn count(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
    ) -> impl Future<Output = SourceResult<Option<u64>>> + Send {
        (**self).count(table, select, filters)
    }

    fn select_range(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        order: &OrderBy,
        range: RowRange,
    ) -> impl Future<Output = SourceResult<Vec<Value>>> + Send {
        (**self).select_range(table, select, filters, order, range)
    }
}

impl<S: QuerySource> QuerySource for std::sync::Arc<S> {
    fn count(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
    ) -> impl Future<Output = SourceResult<Option<u64>>> + Send {
        (**self).count(table, select, filters)
    }

    fn select_range(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        order: &OrderBy,
        range: RowRange,
    ) -> impl Future<Output = SourceResult<Vec<Value>>> + Send {
        (**self).select_range(table, select, filters, order, range)
    }
}

/// Parse a select list into column names; `None` selects every column
pub fn parse_select(select: &str) -> Option<Vec<String>> {
    let select = select.trim();
    if select.is_empty() || select == "*" {
        return None;
    }

    let fields: Vec<String> = select
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if fields.iter().any(|f| f == "*") {
        None
    } else {
        Some(fields)
    }
}
