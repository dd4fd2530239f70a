//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "trigsync")]
#[command(author, version, about = "Trigger reconciliation for schema dumps")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a recorded snapshot and print the schema triggers section
    Dump {
        /// Snapshot file (JSON) with database triggers and declared migrations
        snapshot: Option<PathBuf>,

        /// Database adapter (overrides the snapshot and config file)
        #[arg(short, long, env = "TRIGSYNC_ADAPTER")]
        adapter: Option<String>,

        /// Tables whose triggers are left out (repeatable)
        #[arg(short, long = "ignore-table", value_name = "TABLE")]
        ignore_table: Vec<String>,

        /// Previous schema file handed to the migration source
        #[arg(long, value_name = "FILE")]
        previous_schema: Option<PathBuf>,

        /// Path to trigsync.toml config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List the trigger and function definitions found in a SQL file
    Extract {
        /// SQL file to scan
        file: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Schema-file triggers section
    #[default]
    Schema,
    /// JSON reconciliation report
    Json,
}
