//! dirsync CLI
//!
//! Command-line tools for inspecting sync sessions.
//!
//! # Commands
//!
//! - `replay` - Replay a recorded round log through the cycle detector
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use dirsync_cycle::{
    DetectorConfig, DEFAULT_MAX_HISTORY_ENTRY_LENGTH, DEFAULT_MAX_HISTORY_SIZE,
    DEFAULT_MIN_REPETITION_COUNT, DEFAULT_MIN_SEQUENCE_LENGTH,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// dirsync command-line tools.
#[derive(Parser)]
#[command(name = "dirsync")]
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
    /// Replay a recorded round log and report detected cycles
    Replay {
        /// Round log, one JSON round per line
        log: PathBuf,

        /// JSON map of directory path to current checksum
        #[arg(long)]
        versions: Option<PathBuf>,

        /// Repetitions a unit needs before it counts as a cycle
        #[arg(long, default_value_t = DEFAULT_MIN_REPETITION_COUNT)]
        min_repetitions: usize,

        /// Rounds a unit needs before it counts as a cycle
        #[arg(long, default_value_t = DEFAULT_MIN_SEQUENCE_LENGTH)]
        min_sequence_length: usize,

        /// Rounds kept in the history
        #[arg(long, default_value_t = DEFAULT_MAX_HISTORY_SIZE)]
        max_history: usize,

        /// Action count above which rounds are stored compacted
        #[arg(long, default_value_t = DEFAULT_MAX_HISTORY_ENTRY_LENGTH)]
        max_entry_length: usize,

        /// Also send reset actions to the server side
        #[arg(long)]
        reset_server: bool,

        /// Log the full round listing of every detected cycle
        #[arg(short, long)]
        trace: bool,

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
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            log,
            versions,
            min_repetitions,
            min_sequence_length,
            max_history,
            max_entry_length,
            reset_server,
            trace,
            format,
        } => {
            let config = DetectorConfig::new()
                .with_min_repetition_count(min_repetitions)
                .with_min_sequence_length(min_sequence_length)
                .with_max_history_size(max_history)
                .with_max_history_entry_length(max_entry_length)
                .with_reset_server_directories(reset_server);
            commands::replay::run(&log, versions.as_deref(), config, trace, &format)?;
        }
        Commands::Version => {
            println!("dirsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
