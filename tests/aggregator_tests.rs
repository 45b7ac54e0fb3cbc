use std::time::Duration;
use txn_metrics::aggregator::{aggregate_calls, rollup_name};
use txn_metrics::metrics::{MetricKey, MetricMap, MetricStats};

const ROOT: &str = "Controller/Home#index";

fn observed(count: u64, each_ms: u64) -> MetricStats {
    let mut stats = MetricStats::new(true);
    let d = Duration::from_millis(each_ms);
    for _ in 0..count {
        stats.update(d, d);
    }
    stats
}

fn transaction_metrics() -> MetricMap {
    let mut metrics = MetricMap::new();
    metrics.insert(MetricKey::new(ROOT), observed(1, 100));
    metrics.insert(MetricKey::scoped("ActiveRecord/User/find", ROOT), observed(3, 5));
    metrics.insert(MetricKey::scoped("ActiveRecord/Post/find", "View/show"), observed(2, 7));
    metrics.insert(MetricKey::scoped("View/show", ROOT), observed(1, 30));
    metrics
}

#[test]
fn test_rollup_name() {
    assert_eq!(rollup_name("ActiveRecord"), "ActiveRecord/all");
}

#[test]
fn test_rollups_per_category() {
    let metrics = transaction_metrics();
    let parent = MetricKey::new(ROOT);

    let rollups = aggregate_calls(&metrics, &parent);

    assert_eq!(rollups.len(), 2);

    let ar = &rollups[&MetricKey::scoped("ActiveRecord/all", ROOT)];
    assert_eq!(ar.call_count, 5);
    assert_eq!(ar.total_call_time, Duration::from_millis(29));

    let view = &rollups[&MetricKey::scoped("View/all", ROOT)];
    assert_eq!(view.call_count, 1);
}

#[test]
fn test_root_does_not_form_category() {
    let metrics = transaction_metrics();
    let rollups = aggregate_calls(&metrics, &MetricKey::new(ROOT));

    assert!(!rollups.contains_key(&MetricKey::scoped("Controller/all", ROOT)));
}

#[test]
fn test_zero_count_category_omitted() {
    let mut metrics = transaction_metrics();
    metrics.insert(MetricKey::scoped("Memcache/get", ROOT), MetricStats::new(true));

    let rollups = aggregate_calls(&metrics, &MetricKey::new(ROOT));

    assert!(!rollups.contains_key(&MetricKey::scoped("Memcache/all", ROOT)));
    assert_eq!(rollups.len(), 2);
}

#[test]
fn test_input_not_mutated() {
    let metrics = transaction_metrics();
    let before = metrics.clone();

    aggregate_calls(&metrics, &MetricKey::new(ROOT));

    assert_eq!(metrics, before);
}

#[test]
fn test_no_scoped_metrics_no_rollups() {
    let mut metrics = MetricMap::new();
    metrics.insert(MetricKey::new(ROOT), observed(1, 10));

    assert!(aggregate_calls(&metrics, &MetricKey::new(ROOT)).is_empty());
}
