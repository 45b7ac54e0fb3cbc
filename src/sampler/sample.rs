//! Snapshot of one completed transaction.

use crate::metrics::MetricMap;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A retained slow transaction
///
/// Built once at transaction close and never mutated; older samples are
/// replaced by their [`clear_metrics`](TransactionSample::clear_metrics)
/// projection to bound memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSample {
    pub uri: Option<String>,

    /// Name of the entry-point metric
    pub metric_name: String,

    pub total_time: Duration,

    /// Full metric breakdown, including category roll-ups
    pub metrics: MetricMap,

    pub captured_at: DateTime<Utc>,
}

impl TransactionSample {
    pub fn new(
        uri: Option<String>,
        metric_name: impl Into<String>,
        total_time: Duration,
        metrics: MetricMap,
    ) -> Self {
        Self {
            uri,
            metric_name: metric_name.into(),
            total_time,
            metrics,
            captured_at: Utc::now(),
        }
    }

    /// Copy keeping identity and ranking fields but no metric breakdown
    pub fn clear_metrics(&self) -> Self {
        Self {
            uri: self.uri.clone(),
            metric_name: self.metric_name.clone(),
            total_time: self.total_time,
            metrics: MetricMap::new(),
            captured_at: self.captured_at,
        }
    }

    pub fn has_metrics(&self) -> bool {
        !self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricKey, MetricStats};

    #[test]
    fn test_clear_metrics_keeps_identity() {
        let mut metrics = MetricMap::new();
        metrics.insert(MetricKey::new("Controller/x"), MetricStats::default());
        let sample = TransactionSample::new(
            Some("/users".to_string()),
            "Controller/x",
            Duration::from_secs(3),
            metrics,
        );

        let light = sample.clear_metrics();

        assert!(!light.has_metrics());
        assert_eq!(light.uri, sample.uri);
        assert_eq!(light.metric_name, sample.metric_name);
        assert_eq!(light.total_time, sample.total_time);
        assert_eq!(light.captured_at, sample.captured_at);
        assert!(sample.has_metrics());
    }
}
