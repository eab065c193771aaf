//! largetable - consistent reads of tables larger than a backend's row cap
//!
//! A [`fetch::ChunkedReader`] counts the rows matching a [`query::FilterSet`],
//! then pages through them in id order with bounded range queries against an
//! injected [`source::QuerySource`]. A post-read duplicate check triggers at
//! most one full re-read.

pub mod cli;
pub mod config;
pub mod fetch;
pub mod observability;
pub mod query;
pub mod records;
pub mod source;

pub use config::{BackendConfig, Config, ConfigError, ReaderConfig};
pub use fetch::{ChunkedReader, FetchError, FetchOutcome, FetchReport, FetchResult, CHUNK_SIZE, MAX_IN_UUIDS};
pub use query::{FilterExpr, FilterOperator, FilterSet};
pub use source::{InMemorySource, PostgrestSource, QuerySource, RecordWriter, SourceError};
