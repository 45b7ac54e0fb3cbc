//! Metric identity and aggregated statistics.
//!
//! A metric is a `(name, scope)` bucket holding call counts and inclusive and
//! exclusive time. Metric sets are plain maps from key to stats.

pub mod key;
pub mod stats;

use std::collections::HashMap;

pub use key::{KeyExtra, MetricKey};
pub use stats::MetricStats;

/// A set of metric buckets
pub type MetricMap = HashMap<MetricKey, MetricStats>;
