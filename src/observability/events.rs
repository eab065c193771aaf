//! Observable events emitted by the chunked reader and its helpers
//!
//! Events are explicit and typed; the wire name is what appears in the
//! `event` key of a log line.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded and validated
    ConfigLoaded,

    // Chunked reads
    /// Count query failed or returned no count; the fetch is abandoned
    CountFailed,
    /// An `in` operand is larger than the configured maximum
    InListOversized,
    /// A range query failed; the fetch continues without its rows
    ChunkFailed,
    /// Duplicate ids detected; the fetch starts over
    DuplicateIdsRetry,
    /// Duplicate ids detected with no retry left; rows returned as-is
    DuplicateIdsAccepted,
    /// Fetch returned rows
    FetchComplete,

    // Record helpers
    /// Single-row update did not affect exactly one row
    RecordUpdateFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CountFailed => "COUNT_FAILED",
            Event::InListOversized => "IN_LIST_OVERSIZED",
            Event::ChunkFailed => "CHUNK_FAILED",
            Event::DuplicateIdsRetry => "DUPLICATE_IDS_RETRY",
            Event::DuplicateIdsAccepted => "DUPLICATE_IDS_ACCEPTED",
            Event::FetchComplete => "FETCH_COMPLETE",
            Event::RecordUpdateFailed => "RECORD_UPDATE_FAILED",
        }
    }

    /// Severity the event is normally logged at
    pub fn default_severity(&self) -> Severity {
        match self {
            Event::ConfigLoaded | Event::FetchComplete | Event::DuplicateIdsRetry => Severity::Info,
            Event::InListOversized | Event::DuplicateIdsAccepted => Severity::Warn,
            Event::CountFailed | Event::ChunkFailed | Event::RecordUpdateFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
