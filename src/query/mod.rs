//! # Query Model
//!
//! Filter predicates, ordering and offset ranges shared by every query
//! source, plus the textual `field=op.value` filter syntax.

pub mod errors;
pub mod filter;
pub mod parser;
pub mod range;

pub use errors::{QueryError, QueryResult};
pub use filter::{compare_json_values, FilterExpr, FilterOperator, FilterSet};
pub use parser::{parse_filter_arg, parse_filters};
pub use range::{OrderBy, RowRange};
