//! importsync CLI
//!
//! Command-line reconciliation of CSV record feeds.
//!
//! # Commands
//!
//! - `diff` - Reconcile a destination CSV against a source CSV
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use importsync_engine::SyncMode;

/// importsync command-line import tools.
#[derive(Parser)]
#[command(name = "importsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a destination CSV against a source CSV
    Diff {
        /// Path to the source CSV (the authoritative feed)
        source: PathBuf,

        /// Path to the destination CSV (the data to reconcile)
        destination: PathBuf,

        /// Name of the natural key column (col0, col1, ... without a header)
        #[arg(short, long, default_value = "id")]
        key_column: String,

        /// Name of the status column (imported, forced, invalid); ignored
        /// for files that lack it
        #[arg(short, long)]
        status_column: Option<String>,

        /// Input files have no header row; columns are named col0, col1, ...
        #[arg(long)]
        no_header: bool,

        /// Combined target size of a chunk pair
        #[arg(long, default_value = "16384")]
        chunk_hint: usize,

        /// Only add and update; never delete stale records
        #[arg(short, long)]
        additive: bool,

        /// Keep invalid records that are absent from the source
        #[arg(long)]
        retain_invalid: bool,

        /// Write the reconciled destination to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Diff {
            source,
            destination,
            key_column,
            status_column,
            no_header,
            chunk_hint,
            additive,
            retain_invalid,
            output,
            format,
        } => {
            let options = commands::diff::DiffOptions {
                key_column,
                status_column,
                has_header: !no_header,
                chunk_hint,
                mode: if additive {
                    SyncMode::Additive
                } else {
                    SyncMode::Full
                },
                retain_invalid,
                output,
            };
            commands::diff::run(&source, &destination, &options, &format)?;
        }
        Commands::Version => {
            println!("importsync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("importsync Core v{}", importsync_core::VERSION);
        }
    }

    Ok(())
}
