//! JSON output for the CLI
//!
//! - Output: single JSON object per command on stdout
//! - Logs never touch stdout

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Write a success response to `out`
pub fn write_response_to<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_response_to(&mut lock, data)
}
