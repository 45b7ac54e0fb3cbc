use std::path::PathBuf;

/// Arguments for the simulate command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct SimulateArgs {
    /// Worker threads, each with its own transaction context
    pub threads: usize,

    /// Transactions run by each worker
    pub transactions: usize,

    /// Base duration of one simulated unit of work, in microseconds
    pub unit_us: u64,

    /// Every Nth transaction makes a slow external call (0 = never)
    pub slow_every: usize,

    /// Output path for the JSON report
    pub output_json: PathBuf,

    /// Optional TOML configuration for the store
    pub config: Option<PathBuf>,

    /// Override for the slow-transaction threshold
    pub slow_threshold_ms: Option<u64>,

    /// Merge an existing report at `output_json` into this cycle
    pub merge_existing: bool,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            threads: 4,
            transactions: 100,
            unit_us: 100,
            slow_every: 10,
            output_json: PathBuf::from("report.json"),
            config: None,
            slow_threshold_ms: None,
            merge_existing: false,
            print_summary: false,
        }
    }
}

/// What a simulation run produced
#[derive(Debug, Clone, Default)]
pub struct SimulationSummary {
    /// Transactions whose entry point closed cleanly
    pub transactions_closed: usize,

    /// Transactions retained by the reservoir
    pub transactions_sampled: usize,

    /// Distinct metrics in the drained report
    pub metric_count: usize,

    /// Samples in the drained report
    pub sample_count: usize,

    /// Name of the slowest transaction, if one was retained
    pub slowest: Option<String>,
}
