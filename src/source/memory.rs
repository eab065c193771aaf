//! # In-Memory Query Source
//!
//! Tables of JSON rows with the same query semantics as the hosted
//! backend: AND-ed filters, ordering, offset ranges truncated to a row
//! cap, and column projection. Writes may interleave with a running
//! chunked read, which makes it useful for exercising the reader.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::{Map, Value};

use super::errors::{SourceError, SourceResult};
use super::{parse_select, QuerySource, RecordWriter};
use crate::query::{compare_json_values, FilterSet, OrderBy, RowRange};

/// Maximum rows returned by one query on the hosted backend
pub const DEFAULT_ROW_CAP: u64 = 5000;

/// In-memory tables keyed by name
#[derive(Debug)]
pub struct InMemorySource {
    /// Data store: table -> rows in insertion order
    tables: RwLock<HashMap<String, Vec<Value>>>,

    /// Maximum rows returned by a single range query
    row_cap: u64,
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::with_row_cap(DEFAULT_ROW_CAP)
    }

    pub fn with_row_cap(row_cap: u64) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            row_cap: row_cap.max(1),
        }
    }

    pub fn row_cap(&self) -> u64 {
        self.row_cap
    }

    /// Create an empty table; existing rows are kept
    pub fn create_table(&self, table: &str) -> SourceResult<()> {
        let mut tables = self.write_lock()?;
        tables.entry(table.to_string()).or_default();
        Ok(())
    }

    /// Append a row, creating the table on first use
    pub fn insert(&self, table: &str, row: Value) -> SourceResult<()> {
        self.insert_many(table, std::iter::once(row))
    }

    /// Append rows, creating the table on first use
    pub fn insert_many<I>(&self, table: &str, rows: I) -> SourceResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut tables = self.write_lock()?;
        tables.entry(table.to_string()).or_default().extend(rows);
        Ok(())
    }

    /// Remove every row whose `id_column` equals `id`; returns how many went
    pub fn delete(&self, table: &str, id_column: &str, id: &Value) -> SourceResult<usize> {
        let mut tables = self.write_lock()?;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| SourceError::RelationNotFound(table.to_string()))?;

        let before = rows.len();
        rows.retain(|row| row.get(id_column) != Some(id));
        Ok(before - rows.len())
    }

    /// Number of rows currently stored in `table`
    pub fn table_len(&self, table: &str) -> SourceResult<usize> {
        let tables = self.read_lock()?;
        tables
            .get(table)
            .map(Vec::len)
            .ok_or_else(|| SourceError::RelationNotFound(table.to_string()))
    }

    fn read_lock(
        &self,
    ) -> SourceResult<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<Value>>>> {
        self.tables
            .read()
            .map_err(|_| SourceError::Internal("Lock poisoned".to_string()))
    }

    fn write_lock(
        &self,
    ) -> SourceResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<Value>>>> {
        self.tables
            .write()
            .map_err(|_| SourceError::Internal("Lock poisoned".to_string()))
    }

    /// Rows of `table` matching `filters`, cloned out of the lock
    fn matching_rows(&self, table: &str, filters: &FilterSet) -> SourceResult<Vec<Value>> {
        filters
            .validate()
            .map_err(|e| SourceError::backend(e.to_string()))?;

        let tables = self.read_lock()?;
        let rows = tables
            .get(table)
            .ok_or_else(|| SourceError::RelationNotFound(table.to_string()))?;

        Ok(rows.iter().filter(|r| filters.matches(r)).cloned().collect())
    }

    /// Apply ordering
    fn apply_ordering(rows: &mut [Value], order: &OrderBy) {
        rows.sort_by(|a, b| {
            let cmp = compare_optional(a.get(&order.column), b.get(&order.column));
            if order.ascending {
                cmp
            } else {
                cmp.reverse()
            }
        });
    }

    /// Apply the offset window, never returning more than the row cap
    fn apply_range(rows: Vec<Value>, range: RowRange, row_cap: u64) -> Vec<Value> {
        let take = range.span().min(row_cap);
        rows.into_iter()
            .skip(range.start as usize)
            .take(take as usize)
            .collect()
    }
}

/// Select fields from rows
fn select_fields(rows: Vec<Value>, select: &str) -> Vec<Value> {
    let fields = match parse_select(select) {
        None => return rows,
        Some(fields) => fields,
    };

    rows.into_iter()
        .map(|row| match row {
            Value::Object(obj) => {
                let projected: Map<String, Value> = obj
                    .into_iter()
                    .filter(|(k, _)| fields.contains(k))
                    .collect();
                Value::Object(projected)
            }
            other => other,
        })
        .collect()
}

/// Missing values sort after present ones; incomparable values are equal
fn compare_optional(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_json_values(a, b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl QuerySource for InMemorySource {
    async fn count(
        &self,
        table: &str,
        _select: &str,
        filters: &FilterSet,
    ) -> SourceResult<Option<u64>> {
        let rows = self.matching_rows(table, filters)?;
        Ok(Some(rows.len() as u64))
    }

    async fn select_range(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        order: &OrderBy,
        range: RowRange,
    ) -> SourceResult<Vec<Value>> {
        let mut rows = self.matching_rows(table, filters)?;
        Self::apply_ordering(&mut rows, order);
        let rows = Self::apply_range(rows, range, self.row_cap);
        Ok(select_fields(rows, select))
    }
}

impl RecordWriter for InMemorySource {
    async fn update(
        &self,
        table: &str,
        filters: &FilterSet,
        patch: &Value,
        select: &str,
    ) -> SourceResult<Vec<Value>> {
        filters
            .validate()
            .map_err(|e| SourceError::backend(e.to_string()))?;
        let patch = patch
            .as_object()
            .ok_or_else(|| SourceError::backend("update payload must be an object"))?;

        let mut tables = self.write_lock()?;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| SourceError::RelationNotFound(table.to_string()))?;

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|r| filters.matches(r)) {
            if let Some(obj) = row.as_object_mut() {
                for (key, value) in patch {
                    obj.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }

        Ok(select_fields(updated, select))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterExpr;
    use serde_json::json;

    fn seeded(n: i64) -> InMemorySource {
        let source = InMemorySource::new();
        // Insert in reverse so ordering is observable
        source
            .insert_many(
                "items",
                (1..=n).rev().map(|i| json!({"id": i, "parity": i % 2, "name": format!("item-{}", i)})),
            )
            .unwrap();
        source
    }

    #[tokio::test]
    async fn test_count_with_filters() {
        let source = seeded(10);
        let all = source.count("items", "*", &FilterSet::new()).await.unwrap();
        assert_eq!(all, Some(10));

        let even = FilterSet::new().and(FilterExpr::eq("parity", 0));
        assert_eq!(source.count("items", "*", &even).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_select_range_orders_and_windows() {
        let source = seeded(10);
        let rows = source
            .select_range(
                "items",
                "id",
                &FilterSet::new(),
                &OrderBy::ascending("id"),
                RowRange::starting_at(3, 4),
            )
            .await
            .unwrap();

        assert_eq!(rows, vec![json!({"id": 4}), json!({"id": 5}), json!({"id": 6}), json!({"id": 7})]);
    }

    #[tokio::test]
    async fn test_row_cap_truncates_ranges() {
        let source = InMemorySource::with_row_cap(3);
        source
            .insert_many("items", (1..=10).map(|i| json!({"id": i})))
            .unwrap();

        let rows = source
            .select_range(
                "items",
                "*",
                &FilterSet::new(),
                &OrderBy::ascending("id"),
                RowRange::starting_at(0, 10),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let source = InMemorySource::new();
        let err = source.count("missing", "*", &FilterSet::new()).await.unwrap_err();
        assert_eq!(err, SourceError::RelationNotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_filter_is_rejected() {
        let source = seeded(3);
        let filters = FilterSet::new().and(FilterExpr::new(
            "id",
            crate::query::FilterOperator::In,
            json!(1),
        ));
        assert!(matches!(
            source.count("items", "*", &filters).await,
            Err(SourceError::Backend { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let source = seeded(4);
        let filters = FilterSet::new().and(FilterExpr::eq("id", 2));

        let updated = source
            .update("items", &filters, &json!({"name": "renamed"}), "id,name")
            .await
            .unwrap();
        assert_eq!(updated, vec![json!({"id": 2, "name": "renamed"})]);

        assert_eq!(source.delete("items", "id", &json!(2)).unwrap(), 1);
        assert_eq!(source.table_len("items").unwrap(), 3);
        assert_eq!(source.count("items", "*", &filters).await.unwrap(), Some(0));
    }
}
