use crate::output::read_report;
use crate::utils::config::REPORT_VERSION;
use anyhow::Result;
use std::path::PathBuf;

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Generated: {}", report.generated_at.to_rfc3339());
    println!("  Metrics: {}", report.metrics.len());
    println!("  Calls: {}", report.total_calls());
    println!("  Samples: {}", report.samples.len());
    if let Some(slowest) = &report.slowest {
        println!(
            "  Slowest: {} ({:.3}s)",
            slowest.metric_name,
            slowest.total_time.as_secs_f64()
        );
    }

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("Txn Metrics v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", REPORT_VERSION);
    println!();
    println!("In-process transaction metrics aggregation and slow-transaction sampling.");
}
