//! Trace Log Stitcher CLI
//!
//! Attaches a transaction's receipt logs to the calls that emitted them,
//! using the step trace to recover which frame ran each LOG opcode.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use trace_log_stitcher::commands::{
    display_schema, display_version, execute_stitch, validate_args, validate_report_file,
    StitchArgs,
};

/// Trace Log Stitcher - per-call event attribution for EVM transactions
#[derive(Parser, Debug)]
#[command(name = "log-stitch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Stitch receipt logs onto a call tree
    Stitch {
        /// Step trace JSON (structLogs)
        #[arg(long)]
        trace: PathBuf,

        /// Call tree JSON (callTracer)
        #[arg(long)]
        calls: PathBuf,

        /// Transaction receipt JSON
        #[arg(long)]
        receipt: PathBuf,

        /// Output path for the JSON report
        #[arg(short, long, default_value = "stitched.json")]
        output: PathBuf,

        /// Extra method/event signatures (TOML)
        #[arg(long)]
        signatures: Option<PathBuf>,

        /// Don't seed lookups with the built-in signatures
        #[arg(long)]
        no_builtin_signatures: bool,

        /// Keep going on reconciliation warnings
        #[arg(long)]
        lenient: bool,

        /// Transaction hash to record in the report
        #[arg(short, long)]
        tx: Option<String>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a stitch report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Stitch {
            trace,
            calls,
            receipt,
            output,
            signatures,
            no_builtin_signatures,
            lenient,
            tx,
            summary,
        } => {
            let args = StitchArgs {
                trace_path: trace,
                calls_path: calls,
                receipt_path: receipt,
                output_json: output,
                signatures,
                builtin_signatures: !no_builtin_signatures,
                lenient,
                transaction_hash: tx,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_stitch(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(&file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
