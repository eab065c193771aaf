//! # Filter Expression AST
//!
//! Filter predicates applied identically to count and range queries.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{QueryError, QueryResult};

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equals
    #[serde(rename = "eq")]
    Eq,

    /// Greater than
    #[serde(rename = "gt")]
    Gt,

    /// Less than
    #[serde(rename = "lt")]
    Lt,

    /// Value in list
    #[serde(rename = "in")]
    In,
}

impl FilterOperator {
    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::In => "in",
        }
    }

    /// Parse an operator prefix such as `gt`
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "eq" => Some(FilterOperator::Eq),
            "gt" => Some(FilterOperator::Gt),
            "lt" => Some(FilterOperator::Lt),
            "in" => Some(FilterOperator::In),
            _ => None,
        }
    }
}

/// A filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Field to filter on
    pub field: String,

    /// Comparison operator
    pub operator: FilterOperator,

    /// Value to compare against (an array for `In`)
    pub value: Value,
}

impl FilterExpr {
    /// Create a new filter expression
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Eq, value.into())
    }

    /// Create a greater than filter
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Gt, value.into())
    }

    /// Create a less than filter
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Lt, value.into())
    }

    /// Create an "in list" filter
    pub fn in_list<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Check the operand shape against the operator.
    ///
    /// A failure here is a caller error; no query should be issued.
    pub fn validate(&self) -> QueryResult<()> {
        if self.field.is_empty() {
            return Err(QueryError::EmptyField);
        }

        match self.operator {
            FilterOperator::In => match &self.value {
                Value::Array(items) if items.is_empty() => {
                    Err(QueryError::EmptyInOperand(self.field.clone()))
                }
                Value::Array(items) if items.iter().any(Value::is_null) => {
                    Err(self.null_operand())
                }
                Value::Array(_) => Ok(()),
                _ => Err(QueryError::InOperandNotArray(self.field.clone())),
            },
            op => match &self.value {
                Value::Array(_) | Value::Object(_) => Err(QueryError::NonScalarOperand {
                    field: self.field.clone(),
                    operator: op.as_str(),
                }),
                Value::Null => Err(self.null_operand()),
                _ => Ok(()),
            },
        }
    }

    fn null_operand(&self) -> QueryError {
        QueryError::NullOperand {
            field: self.field.clone(),
            operator: self.operator.as_str(),
        }
    }

    /// Number of members of an `In` operand, `None` for other operators
    pub fn in_list_len(&self) -> Option<usize> {
        match (self.operator, &self.value) {
            (FilterOperator::In, Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }

    /// Check if a row matches this filter
    pub fn matches(&self, row: &Value) -> bool {
        let field_value = match row.get(&self.field) {
            Some(v) => v,
            None => return false,
        };

        match self.operator {
            FilterOperator::Eq => field_value == &self.value,
            FilterOperator::Gt => {
                compare_json_values(field_value, &self.value) == Some(Ordering::Greater)
            }
            FilterOperator::Lt => {
                compare_json_values(field_value, &self.value) == Some(Ordering::Less)
            }
            FilterOperator::In => match self.value.as_array() {
                Some(arr) => arr.contains(field_value),
                None => false,
            },
        }
    }

    /// Render as a PostgREST query pair, e.g. `("status", "eq.active")`
    pub fn to_query_pair(&self) -> (String, String) {
        let rendered = match (self.operator, &self.value) {
            (FilterOperator::In, Value::Array(items)) => {
                let members: Vec<String> = items.iter().map(render_list_member).collect();
                format!("in.({})", members.join(","))
            }
            (op, value) => format!("{}.{}", op.as_str(), render_scalar(value)),
        };
        (self.field.clone(), rendered)
    }
}

/// Compare two JSON scalars; `None` when they are not comparable
pub fn compare_json_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// List members containing PostgREST reserved characters, and the text
/// `null`, are double-quoted
fn render_list_member(value: &Value) -> String {
    let raw = render_scalar(value);
    let needs_quotes = raw.is_empty()
        || matches!(value, Value::String(s) if s == "null")
        || raw
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ':') || c.is_whitespace());
    if !needs_quotes {
        return raw;
    }

    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// A set of filters combined with AND logic, kept in caller order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    pub filters: Vec<FilterExpr>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: FilterExpr) {
        self.filters.push(filter);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterExpr> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Validate every filter, stopping at the first violation
    pub fn validate(&self) -> QueryResult<()> {
        self.filters.iter().try_for_each(FilterExpr::validate)
    }

    /// Check if a row matches all filters
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// `In` filters whose operand exceeds `max_members`
    pub fn oversized_in_lists(&self, max_members: usize) -> impl Iterator<Item = (&str, usize)> {
        self.filters.iter().filter_map(move |f| match f.in_list_len() {
            Some(len) if len > max_members => Some((f.field.as_str(), len)),
            _ => None,
        })
    }

    /// Render every filter as a PostgREST query pair, in order
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.filters.iter().map(FilterExpr::to_query_pair).collect()
    }
}

impl From<Vec<FilterExpr>> for FilterSet {
    fn from(filters: Vec<FilterExpr>) -> Self {
        Self { filters }
    }
}

impl FromIterator<FilterExpr> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterExpr>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter() {
        let filter = FilterExpr::eq("name", "Alice");

        assert!(filter.matches(&json!({"name": "Alice"})));
        assert!(!filter.matches(&json!({"name": "Bob"})));
        assert!(!filter.matches(&json!({"other": "Alice"})));
    }

    #[test]
    fn test_gt_and_lt_filters() {
        let gt = FilterExpr::gt("age", 18);
        assert!(gt.matches(&json!({"age": 21})));
        assert!(!gt.matches(&json!({"age": 18})));

        let lt = FilterExpr::lt("created_at", "2024-01-01");
        assert!(lt.matches(&json!({"created_at": "2023-12-31"})));
        assert!(!lt.matches(&json!({"created_at": "2024-01-02"})));

        // Mixed types never compare
        assert!(!gt.matches(&json!({"age": "21"})));
    }

    #[test]
    fn test_in_filter() {
        let filter = FilterExpr::in_list("status", ["active", "pending"]);

        assert!(filter.matches(&json!({"status": "active"})));
        assert!(filter.matches(&json!({"status": "pending"})));
        assert!(!filter.matches(&json!({"status": "inactive"})));
        assert_eq!(filter.in_list_len(), Some(2));
    }

    #[test]
    fn test_validate_rejects_malformed_in() {
        let not_array = FilterExpr::new("id", FilterOperator::In, json!("abc"));
        assert_eq!(
            not_array.validate(),
            Err(QueryError::InOperandNotArray("id".to_string()))
        );

        let empty = FilterExpr::in_list("id", Vec::<Value>::new());
        assert_eq!(
            empty.validate(),
            Err(QueryError::EmptyInOperand("id".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_array_for_comparison() {
        let filter = FilterExpr::new("age", FilterOperator::Gt, json!([1, 2]));
        assert!(matches!(
            filter.validate(),
            Err(QueryError::NonScalarOperand { operator: "gt", .. })
        ));
        assert_eq!(FilterExpr::eq("", 1).validate(), Err(QueryError::EmptyField));
    }

    #[test]
    fn test_validate_rejects_null_operands() {
        assert_eq!(
            FilterExpr::eq("deleted_at", Value::Null).validate(),
            Err(QueryError::NullOperand {
                field: "deleted_at".to_string(),
                operator: "eq",
            })
        );
        assert!(matches!(
            FilterExpr::in_list("company_id", [json!("c1"), Value::Null]).validate(),
            Err(QueryError::NullOperand { operator: "in", .. })
        ));
        assert!(FilterExpr::eq("deleted", false).validate().is_ok());
    }

    #[test]
    fn test_query_pair_rendering() {
        assert_eq!(
            FilterExpr::eq("status", "active").to_query_pair(),
            ("status".to_string(), "eq.active".to_string())
        );
        assert_eq!(FilterExpr::gt("age", 18).to_query_pair().1, "gt.18");
        assert_eq!(
            FilterExpr::in_list("name", ["a", "b,c", "say \"hi\""]).to_query_pair().1,
            r#"in.(a,"b,c","say \"hi\"")"#
        );
        assert_eq!(
            FilterExpr::in_list("nickname", ["null"]).to_query_pair().1,
            r#"in.("null")"#
        );
    }

    #[test]
    fn test_filter_set() {
        let filters = FilterSet::new()
            .and(FilterExpr::eq("status", "active"))
            .and(FilterExpr::gt("age", 18));

        assert!(filters.matches(&json!({"status": "active", "age": 21})));
        assert!(!filters.matches(&json!({"status": "inactive", "age": 21})));
        assert_eq!(filters.to_query_pairs().len(), 2);
    }

    #[test]
    fn test_oversized_in_lists() {
        let big: Vec<i64> = (0..101).collect();
        let filters = FilterSet::new()
            .and(FilterExpr::in_list("id", big))
            .and(FilterExpr::in_list("tag", ["x"]));

        let oversized: Vec<_> = filters.oversized_in_lists(100).collect();
        assert_eq!(oversized, vec![("id", 101)]);
    }
}
