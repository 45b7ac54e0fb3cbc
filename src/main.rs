//! Txn Metrics CLI
//!
//! Drives a synthetic multi-threaded request workload through the metric
//! store and writes the drained metrics and slow-transaction samples as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use txn_metrics::commands::{
    display_version, execute_simulate, validate_args, validate_report_file, SimulateArgs,
};

/// Txn Metrics - transaction metrics aggregation and sampling
#[derive(Parser, Debug)]
#[command(name = "txn-metrics")]
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
    /// Run a synthetic workload and write the drained report
    Simulate {
        /// Worker threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Transactions per worker
        #[arg(short = 'n', long, default_value = "100")]
        transactions: usize,

        /// Duration of one unit of simulated work, in microseconds
        #[arg(long, default_value = "100")]
        unit_us: u64,

        /// Every Nth transaction makes a slow external call (0 = never)
        #[arg(long, default_value = "10")]
        slow_every: usize,

        /// Output path for JSON report
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Store configuration (TOML)
        #[arg(short, long, env = "TXN_METRICS_CONFIG")]
        config: Option<PathBuf>,

        /// Slow-transaction threshold in milliseconds
        #[arg(long)]
        slow_threshold_ms: Option<u64>,

        /// Merge an existing report at the output path into this one
        #[arg(long)]
        merge_existing: bool,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Simulate {
            threads,
            transactions,
            unit_us,
            slow_every,
            output,
            config,
            slow_threshold_ms,
            merge_existing,
            summary,
        } => {
            let args = SimulateArgs {
                threads,
                transactions,
                unit_us,
                slow_every,
                output_json: output,
                config,
                slow_threshold_ms,
                merge_existing,
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_simulate(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
