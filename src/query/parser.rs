//! # Filter Argument Parser
//!
//! Parses `field=op.value` filter arguments (the PostgREST query syntax)
//! into filter expressions.

use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::filter::{FilterExpr, FilterOperator, FilterSet};

/// Parse a list of `field=op.value` arguments, preserving order
pub fn parse_filters<S: AsRef<str>>(args: &[S]) -> QueryResult<FilterSet> {
    args.iter().map(|arg| parse_filter_arg(arg.as_ref())).collect()
}

/// Parse one `field=op.value` argument
pub fn parse_filter_arg(arg: &str) -> QueryResult<FilterExpr> {
    let (field, value) = arg
        .split_once('=')
        .ok_or_else(|| QueryError::InvalidExpression(format!("missing '=' in '{}'", arg)))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(QueryError::EmptyField);
    }

    let filter = parse_filter(field, value)?;
    filter.validate()?;
    Ok(filter)
}

/// Parse a filter expression from key=value
fn parse_filter(field: &str, value: &str) -> QueryResult<FilterExpr> {
    if let Some((op_str, operand)) = value.split_once('.') {
        if let Some(operator) = FilterOperator::from_prefix(op_str) {
            let parsed = match operator {
                FilterOperator::In => parse_list(operand)?,
                _ => parse_scalar(operand),
            };
            return Ok(FilterExpr::new(field, operator, parsed));
        }
    }

    // No known operator, treat as eq with the whole value
    Ok(FilterExpr::new(field, FilterOperator::Eq, parse_scalar(value)))
}

/// Parse list syntax: `(a,b,"c,d")`
fn parse_list(value: &str) -> QueryResult<Value> {
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| {
            QueryError::InvalidExpression(format!("'in' list must be parenthesized: '{}'", value))
        })?;

    if inner.trim().is_empty() {
        return Ok(Value::Array(Vec::new()));
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut was_quoted = false;
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if quoted => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '"' => {
                quoted = !quoted;
                was_quoted = true;
            }
            ',' if !quoted => {
                items.push(finish_member(&current, was_quoted));
                current.clear();
                was_quoted = false;
            }
            c => current.push(c),
        }
    }

    if quoted {
        return Err(QueryError::InvalidExpression(format!(
            "unterminated quote in '{}'",
            value
        )));
    }
    items.push(finish_member(&current, was_quoted));

    Ok(Value::Array(items))
}

fn finish_member(raw: &str, was_quoted: bool) -> Value {
    if was_quoted {
        Value::String(raw.to_string())
    } else {
        parse_scalar(raw.trim())
    }
}

/// Parse a scalar value: null, booleans, integers, floats, else string
fn parse_scalar(value: &str) -> Value {
    match value {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = value.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return Value::Number(num);
        }
    }

    Value::String(value.to_string())
}
