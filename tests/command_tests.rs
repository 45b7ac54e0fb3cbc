use txn_metrics::commands::{execute_simulate, validate_args, SimulateArgs};
use txn_metrics::output::read_report;

fn quick_args(output: std::path::PathBuf) -> SimulateArgs {
    SimulateArgs {
        threads: 2,
        transactions: 6,
        unit_us: 0,
        slow_every: 3,
        output_json: output,
        slow_threshold_ms: Some(0),
        ..Default::default()
    }
}

#[test]
fn test_simulate_writes_report() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = temp_dir.path().join("report.json");
    let args = quick_args(output.clone());

    validate_args(&args).unwrap();
    let summary = execute_simulate(args).unwrap();

    assert_eq!(summary.transactions_closed, 12);
    assert_eq!(summary.transactions_sampled, 12);
    assert_eq!(summary.sample_count, 12);
    assert!(summary.slowest.is_some());

    let report = read_report(&output).unwrap();
    assert_eq!(report.metrics.len(), summary.metric_count);
    assert_eq!(report.samples.len(), 12);
    // only the first ten samples keep their breakdown
    assert_eq!(
        report.samples.iter().filter(|s| !s.metrics.is_empty()).count(),
        10
    );
}

#[test]
fn test_simulate_merges_existing_report() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = temp_dir.path().join("report.json");

    execute_simulate(quick_args(output.clone())).unwrap();
    let first = read_report(&output).unwrap();

    let args = SimulateArgs {
        merge_existing: true,
        ..quick_args(output.clone())
    };
    execute_simulate(args).unwrap();
    let second = read_report(&output).unwrap();

    assert_eq!(second.metrics.len(), first.metrics.len());
    assert_eq!(second.total_calls(), first.total_calls() * 2);
    assert_eq!(second.samples.len(), 24);
}

#[test]
fn test_simulate_with_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("store.toml");
    std::fs::write(&config_path, "max_metrics = 3\n").unwrap();

    let args = SimulateArgs {
        config: Some(config_path),
        slow_threshold_ms: None,
        ..quick_args(temp_dir.path().join("report.json"))
    };
    let summary = execute_simulate(args).unwrap();

    assert!(summary.metric_count <= 3);
    assert_eq!(summary.transactions_sampled, 0);
}

#[test]
fn test_simulate_with_bad_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("store.toml");
    std::fs::write(&config_path, "max_metrics = \"lots\"\n").unwrap();

    let args = SimulateArgs {
        config: Some(config_path),
        ..quick_args(temp_dir.path().join("report.json"))
    };
    assert!(execute_simulate(args).is_err());
}
