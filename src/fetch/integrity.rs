//! Duplicate-id detection over an accumulated row set.
//!
//! Concurrent inserts shift id-ordered offsets between chunk boundaries,
//! so a row at the end of one chunk can reappear at the start of the next.
//! Gaps from concurrent deletes are not detectable here.

use std::collections::HashSet;

use serde_json::Value;

/// Row count versus distinct id count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityCheck {
    pub total: usize,
    pub distinct: usize,
}

impl IntegrityCheck {
    /// Count distinct values of `id_column`. Rows without the column all
    /// share the `null` id.
    pub fn run(rows: &[Value], id_column: &str) -> Self {
        let distinct: HashSet<String> = rows.iter().map(|row| id_key(row, id_column)).collect();
        Self {
            total: rows.len(),
            distinct: distinct.len(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.distinct
    }

    /// Rows beyond the first occurrence of each id
    pub fn duplicates(&self) -> usize {
        self.total - self.distinct
    }
}

/// Canonical JSON text of the id, so `1` and `"1"` stay distinct
fn id_key(row: &Value, id_column: &str) -> String {
    match row.get(id_column) {
        Some(id) => id.to_string(),
        None => Value::Null.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unique_ids() {
        let rows = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": "3"})];
        let check = IntegrityCheck::run(&rows, "id");
        assert!(check.is_consistent());
        assert_eq!(check.duplicates(), 0);
    }

    #[test]
    fn test_duplicate_ids() {
        let rows = vec![json!({"id": "a"}), json!({"id": "b"}), json!({"id": "a"})];
        let check = IntegrityCheck::run(&rows, "id");
        assert!(!check.is_consistent());
        assert_eq!(check, IntegrityCheck { total: 3, distinct: 2 });
    }

    #[test]
    fn test_string_and_number_ids_differ() {
        let rows = vec![json!({"id": 1}), json!({"id": "1"})];
        assert!(IntegrityCheck::run(&rows, "id").is_consistent());
    }

    #[test]
    fn test_missing_ids_collide() {
        let rows = vec![json!({"name": "x"}), json!({"name": "y"})];
        assert_eq!(IntegrityCheck::run(&rows, "id").duplicates(), 1);
    }

    #[test]
    fn test_custom_id_column() {
        let rows = vec![json!({"uuid": "a", "id": 1}), json!({"uuid": "b", "id": 1})];
        assert!(IntegrityCheck::run(&rows, "uuid").is_consistent());
        assert!(!IntegrityCheck::run(&rows, "id").is_consistent());
    }
}
