//! CLI module for largetable
//!
//! Provides command-line interface for:
//! - fetch: Read every matching row in chunks
//! - count: Head-only count of matching rows
//! - check-config: Validate a configuration file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_config, count, fetch, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_response, write_response_to};
