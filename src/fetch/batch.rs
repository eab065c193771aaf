//! Fetching by large member lists.
//!
//! An `in` operand over a few hundred ids makes the request URL too long
//! for the hosted backend. The member list is split into batches of at
//! most `max_in_values` and each batch is read with its own chunked fetch.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::FetchResult;
use super::reader::ChunkedReader;
use crate::query::{FilterExpr, FilterSet};
use crate::source::QuerySource;

/// Split `values` into consecutive groups of at most `size` elements
pub fn chunk_values<T: Clone>(values: &[T], size: usize) -> Vec<Vec<T>> {
    values.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

impl<S: QuerySource> ChunkedReader<S> {
    /// Fetch rows whose `field` is one of `members`, on top of `filters`.
    ///
    /// Results are concatenated in batch order. The first batch whose count
    /// fails aborts the whole call. An empty member list reads nothing.
    pub async fn fetch_all_by_members<T: DeserializeOwned>(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        field: &str,
        members: &[Value],
        allow_retry: bool,
    ) -> FetchResult<Vec<T>> {
        filters.validate()?;

        let mut rows = Vec::new();
        for batch in chunk_values(members, self.config().max_in_values) {
            let mut batch_filters = filters.clone();
            batch_filters.push(FilterExpr::in_list(field, batch));

            let batch_rows: Vec<T> = self
                .fetch_all(table, select, &batch_filters, allow_retry)
                .await?;
            rows.extend(batch_rows);
        }
        Ok(rows)
    }
}
