//! Observability for the chunked reader
//!
//! Structured JSON log lines with typed event names. Logging never fails
//! the operation being observed.
//!
//! ```ignore
//! use largetable::observability::{Event, Logger};
//!
//! Logger::error(Event::ChunkFailed, &[("table", "orders"), ("offset", "4500")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{LogCapture, Logger, Severity};
