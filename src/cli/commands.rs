//! CLI command implementations
//!
//! Each command loads the config, applies its log level and, when it talks
//! to the backend, drives a chunked reader on a fresh tokio runtime.

use std::path::Path;

use serde_json::{json, Value};

use crate::config::Config;
use crate::fetch::ChunkedReader;
use crate::observability::Logger;
use crate::query::parse_filters;
use crate::source::PostgrestSource;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Fetch {
            config,
            table,
            select,
            filters,
            no_retry,
            report,
        } => fetch(&config, &table, &select, &filters, !no_retry, report),
        Command::Count {
            config,
            table,
            select,
            filters,
        } => count(&config, &table, &select, &filters),
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Fetch every matching row and print `{"rows": [...]}`, plus the report
/// when asked
pub fn fetch(
    config_path: &Path,
    table: &str,
    select: &str,
    filter_args: &[String],
    allow_retry: bool,
    with_report: bool,
) -> CliResult<()> {
    let filters = parse_filters(filter_args)?;
    let reader = build_reader(config_path)?;

    let outcome = block_on(async {
        reader
            .fetch_all_with_report::<Value>(table, select, &filters, allow_retry)
            .await
    })??;

    let data = if with_report {
        json!({
            "rows": outcome.rows,
            "report": serde_json::to_value(&outcome.report)?,
        })
    } else {
        json!({ "rows": outcome.rows })
    };
    write_response(data)
}

/// Print `{"table": ..., "count": n}`
pub fn count(
    config_path: &Path,
    table: &str,
    select: &str,
    filter_args: &[String],
) -> CliResult<()> {
    let filters = parse_filters(filter_args)?;
    let reader = build_reader(config_path)?;

    let total = block_on(async { reader.count(table, select, &filters).await })??;
    write_response(json!({ "table": table, "count": total }))
}

/// Load, validate and echo the effective configuration
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let reader = serde_json::to_value(&config.reader)?;

    write_response(json!({
        "valid": true,
        "log_level": config.log_level,
        "reader": reader,
        "backend_configured": config.backend.is_some(),
    }))
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}

fn build_reader(config_path: &Path) -> CliResult<ChunkedReader<PostgrestSource>> {
    let config = load_config(config_path)?;
    let source = PostgrestSource::new(config.backend()?)?;
    Ok(ChunkedReader::with_config(source, config.reader))
}

fn block_on<F: std::future::Future>(future: F) -> CliResult<F::Output> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime_failed(format!("Failed to create tokio runtime: {}", e)))?;
    Ok(rt.block_on(future))
}
