//! Category roll-ups for a completed transaction.
//!
//! A roll-up answers "how much time did this transaction spend in
//! ActiveRecord?" by summing every `ActiveRecord/...` metric into one
//! synthetic `ActiveRecord/all` bucket scoped to the entry point.

use crate::metrics::{MetricKey, MetricMap, MetricStats};
use log::debug;
use std::collections::BTreeSet;

/// Suffix of synthetic roll-up metric names
pub const ROLLUP_SUFFIX: &str = "all";

/// Derive per-category roll-ups from a transaction's metric set
///
/// **Public** - main entry point for roll-up calculation
///
/// # Arguments
/// * `metrics` - The transaction's metric set (not modified)
/// * `parent_key` - Key of the transaction's root frame
///
/// # Returns
/// One `<category>/all` metric per category that appears among the scoped
/// metrics, scoped to `parent_key.metric_name`. Categories whose combined
/// call count is zero are left out.
pub fn aggregate_calls(metrics: &MetricMap, parent_key: &MetricKey) -> MetricMap {
    // Unscoped entries are the root itself and do not name a category
    let categories: BTreeSet<&str> = metrics
        .keys()
        .filter(|key| key.is_scoped())
        .map(MetricKey::category)
        .collect();

    debug!(
        "Rolling up {} categories under {}",
        categories.len(),
        parent_key.metric_name
    );

    categories
        .into_iter()
        .filter_map(|category| {
            let stats = combine_category(metrics, category);
            if stats.is_empty() {
                return None;
            }
            let key = MetricKey::scoped(rollup_name(category), parent_key.metric_name.clone());
            Some((key, stats))
        })
        .collect()
}

/// Name of the roll-up metric for `category`
pub fn rollup_name(category: &str) -> String {
    format!("{}/{}", category, ROLLUP_SUFFIX)
}

/// Combine every metric whose name starts with `<category>/`
///
/// **Private** - internal helper
fn combine_category(metrics: &MetricMap, category: &str) -> MetricStats {
    let prefix = format!("{}/", category);

    metrics
        .iter()
        .filter(|(key, _)| key.metric_name.starts_with(&prefix))
        .fold(MetricStats::new(true), |mut acc, (_, stats)| {
            acc.combine(stats);
            acc
        })
}
