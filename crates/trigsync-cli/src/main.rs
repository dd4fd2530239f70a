//! trigsync CLI - replays trigger schema dumps from recorded snapshots

mod args;
mod config;
mod output;

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use trigsync_core::trigger::{extract_definitions, split_sql_statements};
use trigsync_core::{AdapterKind, DumpOptions, Snapshot, TriggerDumper};

use crate::args::{Args, Command, OutputFormat};
use crate::config::Config;
use crate::output::OutputFormatter;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.quiet {
        tracing::Level::ERROR
    } else {
        match args.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(args) {
        Ok(has_mismatches) => {
            if has_mismatches {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let quiet = args.quiet;

    match args.command {
        Command::Dump {
            snapshot,
            adapter,
            ignore_table,
            previous_schema,
            config: config_path,
            format,
        } => {
            // Load configuration
            let config = if let Some(path) = config_path {
                Config::from_file(&path)?
            } else {
                Config::find_and_load()?.unwrap_or_default()
            };

            // Merge CLI args with config (CLI takes precedence)
            let config =
                config.merge_with_args(&snapshot, &adapter, &ignore_table, &previous_schema, &format);

            let Some(snapshot_path) = config.snapshot.as_ref().map(PathBuf::from) else {
                miette::bail!(
                    "No snapshot specified. Pass a snapshot file or configure `snapshot` in trigsync.toml"
                );
            };

            let adapter = config
                .adapter
                .as_deref()
                .map(|s| s.parse::<AdapterKind>())
                .transpose()
                .map_err(|e: String| miette::miette!(e))?;

            let output_format = match config.format.as_deref() {
                Some("json") => OutputFormat::Json,
                _ => OutputFormat::Schema,
            };

            let content = fs::read_to_string(&snapshot_path).into_diagnostic()?;
            let snapshot = Snapshot::from_json(&content)
                .map_err(|e| miette::miette!("invalid snapshot {}: {}", snapshot_path.display(), e))?;

            let mut options = DumpOptions::new();
            options.ignore_tables = config.ignore_tables.clone();
            options.previous_schema = config.previous_schema.as_ref().map(PathBuf::from);

            let mut conn = snapshot.connection(adapter);
            let reconciliation =
                TriggerDumper::new(&mut conn, &snapshot.migrations, options).reconcile()?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            OutputFormatter::new(output_format).write(&mut out, &reconciliation)?;
            out.flush().into_diagnostic()?;

            let mismatches = reconciliation
                .orphans
                .keys()
                .filter(|name| reconciliation.is_mismatch(name))
                .count();

            if !quiet {
                eprintln!(
                    "{} confirmed, {} orphaned ({} mismatched) trigger(s)",
                    reconciliation.confirmed.len(),
                    reconciliation.orphans.len(),
                    mismatches
                );
            }

            Ok(mismatches > 0)
        }

        Command::Extract { file } => {
            let content = fs::read_to_string(&file).into_diagnostic()?;
            let statements = split_sql_statements(&content);
            let definitions = extract_definitions(&statements);

            for def in &definitions {
                println!("{:?}\t{}", def.kind, def.name);
            }

            if !quiet {
                eprintln!(
                    "{} definition(s) in {} statement(s)",
                    definitions.len(),
                    statements.len()
                );
            }

            Ok(false)
        }
    }
}
