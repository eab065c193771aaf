//! # Ordering and Row Ranges
//!
//! Range queries are only meaningful over a strictly totally ordered,
//! stable key; the reader always orders by the id column.

use serde::{Deserialize, Serialize};

/// Order by clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }

    /// PostgREST `order` parameter, e.g. `id.asc`
    pub fn to_query_value(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// Inclusive offset window `[start, end_inclusive]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRange {
    pub start: u64,
    pub end_inclusive: u64,
}

impl RowRange {
    /// Window of `len` rows starting at `start`, clamped at `u64::MAX`;
    /// a zero `len` is treated as one
    pub fn starting_at(start: u64, len: u64) -> Self {
        Self {
            start,
            end_inclusive: start.saturating_add(len.max(1) - 1),
        }
    }

    /// Number of offset positions covered
    pub fn span(&self) -> u64 {
        self.end_inclusive.saturating_sub(self.start) + 1
    }

    /// Windows of `chunk_size` covering `0..total`, in increasing offset order
    pub fn chunks(total: u64, chunk_size: u64) -> impl Iterator<Item = RowRange> {
        let step = chunk_size.max(1);
        std::iter::successors(Some(0u64), move |offset| offset.checked_add(step))
            .take_while(move |offset| *offset < total)
            .map(move |offset| RowRange::starting_at(offset, step))
    }
}
