//! # Chunked Fetch
//!
//! Complete reads of tables larger than the backend's per-query row cap.

pub mod batch;
pub mod errors;
pub mod integrity;
pub mod reader;

pub use batch::chunk_values;
pub use errors::{FetchError, FetchResult};
pub use integrity::IntegrityCheck;
pub use reader::{ChunkedReader, FetchOutcome, FetchReport, CHUNK_SIZE, MAX_IN_UUIDS};
