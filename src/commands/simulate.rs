//! Simulate command implementation.
//!
//! The simulate command:
//! 1. Builds a store from config
//! 2. Runs a synthetic request workload on several threads
//! 3. Drains the store (optionally merging a previous report)
//! 4. Writes the JSON report

use super::models::{SimulateArgs, SimulationSummary};
use crate::metrics::MetricStats;
use crate::output::{read_report, validate_path, write_report, ReportFile};
use crate::store::{ReportData, SampledOptions, StopOptions, StopOutcome, Store};
use crate::transaction::{FrameKind, TransactionContext};
use crate::utils::config::{load_config, StoreConfig};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};

/// Counts reported back by one worker thread
#[derive(Debug, Default, Clone, Copy)]
struct WorkerTally {
    closed: usize,
    sampled: usize,
}

/// Execute the simulate command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Config file read/parse failures
/// * Report read (with `merge_existing`) or write failures
pub fn execute_simulate(args: SimulateArgs) -> Result<SimulationSummary> {
    let start_time = Instant::now();

    info!(
        "Starting simulation: {} threads x {} transactions",
        args.threads, args.transactions
    );

    // Step 1: Build the store
    info!("Step 1/4: Building store...");
    let store = Store::new(build_config(&args)?);

    // Step 2: Run the workload
    info!("Step 2/4: Running workload...");
    let tally = run_workload(&store, &args);
    debug!(
        "Workload finished: {} closed, {} sampled",
        tally.closed, tally.sampled
    );

    // Step 3: Drain
    info!("Step 3/4: Draining store...");
    let old_data = if args.merge_existing && args.output_json.exists() {
        read_report(&args.output_json)
            .context("Failed to read existing report")?
            .into_report_data()
    } else {
        ReportData::default()
    };
    let slowest = store.fetch_and_reset_sample();
    let data = store.merge_data_and_clear(old_data);

    // Step 4: Write
    info!("Step 4/4: Writing report...");
    let report = ReportFile::from_data(&data, slowest.as_ref());
    write_report(&report, &args.output_json).context("Failed to write report JSON")?;
    info!("✓ Report written to: {}", args.output_json.display());

    if args.print_summary {
        print_summary(&report);
    }

    info!(
        "Simulation completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(SimulationSummary {
        transactions_closed: tally.closed,
        transactions_sampled: tally.sampled,
        metric_count: data.metrics.len(),
        sample_count: data.samples.len(),
        slowest: slowest.map(|s| s.metric_name),
    })
}

/// Validate simulate arguments
///
/// **Public** - can be called before execute_simulate for early validation
pub fn validate_args(args: &SimulateArgs) -> Result<()> {
    if args.threads == 0 {
        anyhow::bail!("threads must be greater than 0");
    }

    if args.threads > 256 {
        anyhow::bail!("threads is too large (max 256)");
    }

    if args.transactions == 0 {
        anyhow::bail!("transactions must be greater than 0");
    }

    validate_path(&args.output_json)?;

    Ok(())
}

/// **Private** - config file plus CLI overrides
fn build_config(args: &SimulateArgs) -> Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StoreConfig::default(),
    };

    if let Some(ms) = args.slow_threshold_ms {
        config = config.with_slow_threshold(Duration::from_millis(ms));
    }

    debug!("Store config: {:?}", config);
    Ok(config)
}

/// **Private** - one context per worker, joined before returning
fn run_workload(store: &Store, args: &SimulateArgs) -> WorkerTally {
    thread::scope(|scope| {
        let workers: Vec<_> = (0..args.threads)
            .map(|worker| scope.spawn(move || run_worker(store, args, worker)))
            .collect();

        workers
            .into_iter()
            .fold(WorkerTally::default(), |acc, handle| match handle.join() {
                Ok(tally) => WorkerTally {
                    closed: acc.closed + tally.closed,
                    sampled: acc.sampled + tally.sampled,
                },
                Err(_) => {
                    warn!("Worker thread panicked; its transactions are not counted");
                    acc
                }
            })
    })
}

/// **Private** - run one worker's transactions
fn run_worker(store: &Store, args: &SimulateArgs, worker: usize) -> WorkerTally {
    let mut ctx = TransactionContext::new();
    let mut tally = WorkerTally::default();
    let unit = Duration::from_micros(args.unit_us);

    for i in 0..args.transactions {
        let slow = args.slow_every > 0 && (i + 1) % args.slow_every == 0;

        match run_transaction(store, &mut ctx, worker, i, unit, slow) {
            StopOutcome::TransactionClosed { sampled } => {
                tally.closed += 1;
                if sampled {
                    tally.sampled += 1;
                }
            }
            other => debug!("Worker {} transaction {} ended as {:?}", worker, i, other),
        }
        ctx.reset_transaction();
    }

    tally
}

/// **Private** - a request: two queries, a render with a nested query, an
/// external call
fn run_transaction(
    store: &Store,
    ctx: &mut TransactionContext,
    worker: usize,
    index: usize,
    unit: Duration,
    slow: bool,
) -> StopOutcome {
    let action = index % 3;
    let root_name = format!("Controller/Simulated#action{}", action);
    let root = store.record(ctx, root_name.as_str());

    let find = store.record(ctx, "ActiveRecord/User/find");
    thread::sleep(unit);
    store.stop_recording(
        ctx,
        find,
        StopOptions::default().with_description("SELECT * FROM users WHERE id = ?"),
    );

    let render = store.record(ctx, "View/users/show");
    let posts = store.record(ctx, "ActiveRecord/Post/find");
    thread::sleep(unit);
    store.stop_recording(ctx, posts, StopOptions::default());
    thread::sleep(unit);
    store.stop_recording(ctx, render, StopOptions::default());

    let external = store.record(ctx, "External/api.example.com/get");
    thread::sleep(if slow { unit * 20 } else { unit });
    store.stop_recording(ctx, external, StopOptions::default());

    store.track_sampled(
        "Custom/Worker/queue_wait",
        unit * (worker as u32 + 1),
        SampledOptions::default(),
    );

    let options = StopOptions {
        uri: Some(format!("/users/{}", action)),
        kind: FrameKind::classify(&root_name),
        ..Default::default()
    };
    store.stop_recording(ctx, root, options)
}

/// **Private** - print the ten most expensive metrics
fn print_summary(report: &ReportFile) {
    let mut top: Vec<_> = report.metrics.iter().collect();
    top.sort_by(|a, b| b.stats.total_call_time.cmp(&a.stats.total_call_time));

    println!("\n{}", "=".repeat(80));
    println!("METRICS SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Metrics:  {}", report.metrics.len());
    println!("Calls:    {}", report.total_calls());
    println!("Samples:  {}", report.samples.len());
    if let Some(slowest) = &report.slowest {
        println!(
            "Slowest:  {} ({:.3}s)",
            slowest.metric_name,
            slowest.total_time.as_secs_f64()
        );
    }
    println!();
    for record in top.iter().take(10) {
        println!(
            "  {:>8} calls {:>10.3}ms {:>10.3}ms excl  {} [{}]",
            record.stats.call_count,
            millis(&record.stats, |s| s.total_call_time),
            millis(&record.stats, |s| s.total_exclusive_time),
            record.key.metric_name,
            record.key.scope.as_deref().unwrap_or("-"),
        );
    }
    println!("{}", "=".repeat(80));
}

fn millis(stats: &MetricStats, field: impl Fn(&MetricStats) -> Duration) -> f64 {
    field(stats).as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricMap;

    fn total_exclusive(metrics: &MetricMap) -> Duration {
        metrics.values().map(|s| s.total_exclusive_time).sum()
    }

    #[test]
    fn test_validate_args_valid() {
        assert!(validate_args(&SimulateArgs::default()).is_ok());
    }

    #[test]
    fn test_validate_args_zero_threads() {
        let args = SimulateArgs {
            threads: 0,
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_too_many_threads() {
        let args = SimulateArgs {
            threads: 1000,
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_zero_transactions() {
        let args = SimulateArgs {
            transactions: 0,
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_directory_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let args = SimulateArgs {
            output_json: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_single_transaction_closes() {
        let store = Store::default();
        let mut ctx = TransactionContext::new();

        let outcome = run_transaction(&store, &mut ctx, 0, 0, Duration::ZERO, false);

        assert_eq!(outcome, StopOutcome::TransactionClosed { sampled: false });
        assert!(ctx.is_idle());

        // root + 4 nested calls, plus ActiveRecord/View/External roll-ups, plus the sampled metric
        assert_eq!(store.metric_count(), 9);
        assert_eq!(
            total_exclusive(ctx.metrics()),
            ctx.metrics()
                .iter()
                .find(|(k, _)| k.scope.is_none())
                .map(|(_, s)| s.total_call_time)
                .unwrap()
        );
    }
}
