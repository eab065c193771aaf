//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, then `severity`, then fields sorted by key
//! - Synchronous, no buffering
//! - Written to stderr, leaving stdout to command output
//!
//! Lines below the process-wide minimum severity are dropped. A
//! [`LogCapture`] diverts the current thread's lines into memory instead.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use super::events::Event;

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

thread_local! {
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Parse a configured level name, case-insensitively
    pub fn parse(level: &str) -> Option<Self> {
        match level.to_ascii_lowercase().as_str() {
            "trace" => Some(Severity::Trace),
            "info" => Some(Severity::Info),
            "warn" | "warning" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            "fatal" => Some(Severity::Fatal),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Severity::Trace,
            1 => Severity::Info,
            2 => Severity::Warn,
            3 => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Set the minimum severity written by any logger call
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    /// Current minimum severity
    pub fn min_severity() -> Severity {
        Severity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    /// Log an event at the given severity
    pub fn log(severity: Severity, event: Event, fields: &[(&str, &str)]) {
        if severity < Self::min_severity() {
            return;
        }

        let line = Self::format_line(severity, event, fields);
        if let Some(line) = capture(line) {
            Self::write_line(&line, &mut io::stderr());
        }
    }

    /// Log an event at its default severity
    pub fn event(event: Event, fields: &[(&str, &str)]) {
        Self::log(event.default_severity(), event, fields);
    }

    fn write_line<W: Write>(line: &str, writer: &mut W) {
        // Write atomically (one syscall)
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Render one log line, newline included
    pub fn format_line(severity: Severity, event: Event, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(256);

        output.push_str("{\"event\":\"");
        output.push_str(event.as_str());
        output.push_str("\",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push_str("}\n");
        output
    }

    /// Escape special characters for JSON strings
    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }

    /// Log at TRACE level
    pub fn trace(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }
}

/// Keeps the line when a capture is active; hands it back otherwise
fn capture(line: String) -> Option<String> {
    CAPTURED.with(|captured| match captured.borrow_mut().as_mut() {
        Some(lines) => {
            lines.push(line);
            None
        }
        None => Some(line),
    })
}

/// Collects log lines written on the current thread until dropped.
///
/// Meant for tests on a current-thread runtime, where the code under test
/// logs from the same thread that holds the capture.
#[derive(Debug)]
pub struct LogCapture {
    _private: (),
}

impl LogCapture {
    pub fn start() -> Self {
        CAPTURED.with(|captured| *captured.borrow_mut() = Some(Vec::new()));
        Self { _private: () }
    }

    /// Every captured line, newline included
    pub fn lines(&self) -> Vec<String> {
        CAPTURED.with(|captured| captured.borrow().clone().unwrap_or_default())
    }

    /// Captured lines for one event
    pub fn events(&self, event: Event) -> Vec<String> {
        let marker = format!("{{\"event\":\"{}\"", event.as_str());
        self.lines()
            .into_iter()
            .filter(|line| line.starts_with(&marker))
            .collect()
    }
}

impl Drop for LogCapture {
    fn drop(&mut self) {
        CAPTURED.with(|captured| *captured.borrow_mut() = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("WARN"), Some(Severity::Warn));
        assert_eq!(Severity::parse("warning"), Some(Severity::Warn));
        assert_eq!(Severity::parse("debug"), None);
        assert_eq!(Severity::from_u8(Severity::Error as u8), Severity::Error);
    }

    #[test]
    fn test_line_is_json() {
        let line = Logger::format_line(
            Severity::Error,
            Event::ChunkFailed,
            &[("table", "orders"), ("offset", "4500")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "CHUNK_FAILED");
        assert_eq!(parsed["severity"], "ERROR");
        assert_eq!(parsed["offset"], "4500");
        assert_eq!(line.chars().filter(|c| *c == '\n').count(), 1);
    }

    #[test]
    fn test_fields_sorted_after_event_and_severity() {
        let a = Logger::format_line(Severity::Info, Event::FetchComplete, &[("rows", "1"), ("passes", "2")]);
        let b = Logger::format_line(Severity::Info, Event::FetchComplete, &[("passes", "2"), ("rows", "1")]);
        assert_eq!(a, b);

        let event = a.find("\"event\"").unwrap();
        let severity = a.find("\"severity\"").unwrap();
        let passes = a.find("\"passes\"").unwrap();
        let rows = a.find("\"rows\"").unwrap();
        assert!(event < severity && severity < passes && passes < rows);
    }

    #[test]
    fn test_escapes_special_chars() {
        let line = Logger::format_line(
            Severity::Error,
            Event::CountFailed,
            &[("message", "relation \"x\"\ndoes not exist")],
        );
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["message"], "relation \"x\"\ndoes not exist");
    }

    #[test]
    fn test_capture_collects_lines_until_dropped() {
        let capture = LogCapture::start();
        Logger::warn(Event::InListOversized, &[("field", "id"), ("values", "150")]);
        Logger::error(Event::ChunkFailed, &[("offset", "0")]);

        assert_eq!(capture.lines().len(), 2);
        let warnings = capture.events(Event::InListOversized);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("\"values\":\"150\""));

        drop(capture);
        let next = LogCapture::start();
        assert!(next.lines().is_empty());
    }
}
