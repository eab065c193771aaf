//! # Chunked Table Reader
//!
//! Reads every row matching a filter set from a backend that caps the
//! number of rows per query.
//!
//! A pass is one head-only count followed by range queries of
//! `chunk_size` rows, ordered by the id column, issued strictly one after
//! another. After a pass the accumulated ids are checked for duplicates;
//! a duplicate means rows moved across a chunk boundary during the read,
//! and the whole pass is repeated once. The second pass is returned as
//! is, duplicates included.
//!
//! Failed chunks are logged and skipped. Only a failed count fails the
//! fetch.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::{FetchError, FetchResult};
use super::integrity::IntegrityCheck;
use crate::config::ReaderConfig;
use crate::observability::{Event, Logger};
use crate::query::{FilterSet, OrderBy, RowRange};
use crate::source::QuerySource;

/// Rows per range query; stays under the hosted backend's 5000-row cap
pub const CHUNK_SIZE: u64 = 4500;

/// `in` lists above this size risk request-too-large rejections
pub const MAX_IN_UUIDS: usize = 100;

/// What happened during a fetch.
///
/// `passes` and `chunk_queries` accumulate over all passes; the other
/// fields describe the pass whose rows were returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub passes: u32,
    pub chunk_queries: u64,
    pub total_count: u64,
    pub rows_fetched: usize,
    pub failed_chunk_offsets: Vec<u64>,
    pub duplicate_ids: usize,
    pub retried: bool,
}

impl FetchReport {
    /// Every chunk succeeded, ids are unique and the row count matches the
    /// count query. Concurrent writes can still make this true for a set
    /// that differs from any single snapshot.
    pub fn looks_complete(&self) -> bool {
        self.failed_chunk_offsets.is_empty()
            && self.duplicate_ids == 0
            && self.rows_fetched as u64 == self.total_count
    }
}

/// Rows plus the report of the fetch that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<T> {
    pub rows: Vec<T>,
    pub report: FetchReport,
}

/// Chunked reader over an injected query source
#[derive(Debug)]
pub struct ChunkedReader<S> {
    source: S,
    config: ReaderConfig,
}

impl<S: QuerySource> ChunkedReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    pub fn with_config(source: S, config: ReaderConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// [`fetch_all`](Self::fetch_all) with the single retry enabled
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
    ) -> FetchResult<Vec<T>> {
        self.fetch_all(table, select, filters, true).await
    }

    /// Fetch every row of `table` matching `filters`.
    ///
    /// `select` is passed to the source unchanged. With `allow_retry`, a
    /// pass that yields duplicate ids is repeated once.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        allow_retry: bool,
    ) -> FetchResult<Vec<T>> {
        let outcome = self
            .fetch_all_with_report(table, select, filters, allow_retry)
            .await?;
        Ok(outcome.rows)
    }

    /// Same as [`fetch_all`](Self::fetch_all), also returning the report
    pub async fn fetch_all_with_report<T: DeserializeOwned>(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        allow_retry: bool,
    ) -> FetchResult<FetchOutcome<T>> {
        filters.validate()?;

        let max_passes = if allow_retry { 2 } else { 1 };
        let mut report = FetchReport::default();
        let mut pass = 1;

        loop {
            let rows = self.run_pass(table, select, filters, &mut report).await?;

            let check = IntegrityCheck::run(&rows, &self.config.id_column);
            report.duplicate_ids = check.duplicates();

            if !check.is_consistent() {
                let duplicates = check.duplicates().to_string();
                let pass_str = pass.to_string();
                let fields = [
                    ("table", table),
                    ("duplicates", duplicates.as_str()),
                    ("pass", pass_str.as_str()),
                ];

                if pass < max_passes {
                    Logger::event(Event::DuplicateIdsRetry, &fields);
                    report.retried = true;
                    pass += 1;
                    continue;
                }
                Logger::event(Event::DuplicateIdsAccepted, &fields);
            }

            let rows = decode_rows(table, rows)?;

            let row_count = rows.len().to_string();
            let passes = report.passes.to_string();
            Logger::event(
                Event::FetchComplete,
                &[("table", table), ("rows", row_count.as_str()), ("passes", passes.as_str())],
            );
            return Ok(FetchOutcome { rows, report });
        }
    }

    /// Number of rows matching `filters` under `select`, as reported by
    /// the source
    pub async fn count(&self, table: &str, select: &str, filters: &FilterSet) -> FetchResult<u64> {
        filters.validate()?;
        self.count_rows(table, select, filters).await
    }

    async fn count_rows(&self, table: &str, select: &str, filters: &FilterSet) -> FetchResult<u64> {
        self.warn_oversized(table, filters, "count");

        match self.source.count(table, select, filters).await {
            Ok(Some(total)) => Ok(total),
            Ok(None) => {
                let err = FetchError::MissingCount;
                let message = err.message();
                Logger::event(
                    Event::CountFailed,
                    &[("table", table), ("message", message.as_str())],
                );
                Err(err)
            }
            Err(source_err) => {
                let message = source_err.to_string();
                Logger::event(
                    Event::CountFailed,
                    &[("table", table), ("message", message.as_str())],
                );
                Err(FetchError::Count(source_err))
            }
        }
    }

    /// One count plus every chunk it implies
    async fn run_pass(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        report: &mut FetchReport,
    ) -> FetchResult<Vec<Value>> {
        report.passes += 1;
        report.failed_chunk_offsets.clear();
        report.rows_fetched = 0;

        let total = self.count_rows(table, select, filters).await?;
        report.total_count = total;

        let order = OrderBy::ascending(self.config.id_column.as_str());
        let mut rows = Vec::new();

        for range in RowRange::chunks(total, self.config.chunk_size) {
            self.warn_oversized(table, filters, "chunk");
            report.chunk_queries += 1;

            match self
                .source
                .select_range(table, select, filters, &order, range)
                .await
            {
                Ok(chunk) => rows.extend(chunk),
                Err(err) => {
                    let offset = range.start.to_string();
                    let message = err.to_string();
                    Logger::event(
                        Event::ChunkFailed,
                        &[
                            ("table", table),
                            ("offset", offset.as_str()),
                            ("message", message.as_str()),
                        ],
                    );
                    report.failed_chunk_offsets.push(range.start);
                }
            }
        }

        report.rows_fetched = rows.len();
        Ok(rows)
    }

    fn warn_oversized(&self, table: &str, filters: &FilterSet, stage: &str) {
        let max = self.config.max_in_values;
        for (field, len) in filters.oversized_in_lists(max) {
            let len = len.to_string();
            let max = max.to_string();
            Logger::event(
                Event::InListOversized,
                &[
                    ("table", table),
                    ("field", field),
                    ("values", len.as_str()),
                    ("max", max.as_str()),
                    ("stage", stage),
                ],
            );
        }
    }
}

fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> FetchResult<Vec<T>> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row).map_err(|e| FetchError::Decode {
                table: table.to_string(),
                index,
                message: e.to_string(),
            })
        })
        .collect()
}
