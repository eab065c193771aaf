//! CLI argument definitions using clap
//!
//! Commands:
//! - largetable fetch --config <path> --table <t> [--select <s>] [--filter f=op.v]... [--no-retry] [--report]
//! - largetable count --config <path> --table <t> [--select <s>] [--filter f=op.v]...
//! - largetable check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// largetable - read every row of a large hosted table in capped chunks
#[derive(Parser, Debug)]
#[command(name = "largetable")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch all rows matching the filters and print them as JSON
    Fetch {
        /// Path to configuration file
        #[arg(long, default_value = "./largetable.json")]
        config: PathBuf,

        /// Table to read
        #[arg(long)]
        table: String,

        /// Column list passed to the backend unchanged
        #[arg(long, default_value = "*")]
        select: String,

        /// Filter in `field=op.value` form; repeat to AND several
        #[arg(long = "filter", value_name = "FIELD=OP.VALUE")]
        filters: Vec<String>,

        /// Return the first pass even if it contains duplicate ids
        #[arg(long)]
        no_retry: bool,

        /// Include the fetch report in the output
        #[arg(long)]
        report: bool,
    },

    /// Print the number of rows matching the filters
    Count {
        /// Path to configuration file
        #[arg(long, default_value = "./largetable.json")]
        config: PathBuf,

        /// Table to count
        #[arg(long)]
        table: String,

        /// Column list; embedded resources here change which rows count
        #[arg(long, default_value = "*")]
        select: String,

        /// Filter in `field=op.value` form; repeat to AND several
        #[arg(long = "filter", value_name = "FIELD=OP.VALUE")]
        filters: Vec<String>,
    },

    /// Load and validate a configuration file
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./largetable.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
