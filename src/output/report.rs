//! Serializable report schema for drained store data.
//!
//! Metric sets are keyed by a struct, which JSON cannot use as an object key,
//! so they are written as flat record lists sorted by name and scope.

use crate::metrics::{MetricKey, MetricMap, MetricStats};
use crate::sampler::TransactionSample;
use crate::store::ReportData;
use crate::utils::config::REPORT_VERSION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level report written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the report was generated
    pub generated_at: DateTime<Utc>,

    pub metrics: Vec<MetricRecord>,

    /// Recent slow transactions, oldest first
    pub samples: Vec<SampleRecord>,

    /// Slowest transaction of the cycle, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub slowest: Option<SampleRecord>,
}

/// One metric bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(flatten)]
    pub key: MetricKey,

    #[serde(flatten)]
    pub stats: MetricStats,
}

/// One retained transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uri: Option<String>,
    pub metric_name: String,
    pub total_time: Duration,
    pub captured_at: DateTime<Utc>,
    pub metrics: Vec<MetricRecord>,
}

impl ReportFile {
    /// Build a report from drained data and the optional slowest sample
    pub fn from_data(data: &ReportData, slowest: Option<&TransactionSample>) -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            generated_at: Utc::now(),
            metrics: to_records(&data.metrics),
            samples: data.samples.iter().map(SampleRecord::from).collect(),
            slowest: slowest.map(SampleRecord::from),
        }
    }

    /// Turn a stored report back into data that can be merged into a store
    pub fn into_report_data(self) -> ReportData {
        ReportData {
            metrics: from_records(self.metrics),
            samples: self.samples.into_iter().map(TransactionSample::from).collect(),
        }
    }

    /// Sum of call counts across all metric records
    pub fn total_calls(&self) -> u64 {
        self.metrics.iter().map(|r| r.stats.call_count).sum()
    }
}

impl From<&TransactionSample> for SampleRecord {
    fn from(sample: &TransactionSample) -> Self {
        Self {
            uri: sample.uri.clone(),
            metric_name: sample.metric_name.clone(),
            total_time: sample.total_time,
            captured_at: sample.captured_at,
            metrics: to_records(&sample.metrics),
        }
    }
}

impl From<SampleRecord> for TransactionSample {
    fn from(record: SampleRecord) -> Self {
        Self {
            uri: record.uri,
            metric_name: record.metric_name,
            total_time: record.total_time,
            metrics: from_records(record.metrics),
            captured_at: record.captured_at,
        }
    }
}

/// Flatten a metric set into records sorted by name, then scope
pub fn to_records(metrics: &MetricMap) -> Vec<MetricRecord> {
    let mut records: Vec<MetricRecord> = metrics
        .iter()
        .map(|(key, stats)| MetricRecord {
            key: key.clone(),
            stats: stats.clone(),
        })
        .collect();

    records.sort_by(|a, b| {
        a.key
            .metric_name
            .cmp(&b.key.metric_name)
            .then_with(|| a.key.scope.cmp(&b.key.scope))
    });
    records
}

/// Rebuild a metric set; duplicate keys are combined
pub fn from_records(records: Vec<MetricRecord>) -> MetricMap {
    let mut metrics = MetricMap::new();
    for record in records {
        metrics.entry(record.key).or_default().combine(&record.stats);
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(ms: u64) -> MetricStats {
        let mut stats = MetricStats::new(true);
        let d = Duration::from_millis(ms);
        stats.update(d, d);
        stats
    }

    #[test]
    fn test_records_are_sorted() {
        let mut metrics = MetricMap::new();
        metrics.insert(MetricKey::scoped("B/x", "C/root"), observed(1));
        metrics.insert(MetricKey::scoped("A/x", "C/root"), observed(1));
        metrics.insert(MetricKey::new("A/x"), observed(1));

        let records = to_records(&metrics);
        let names: Vec<_> = records
            .iter()
            .map(|r| (r.key.metric_name.as_str(), r.key.scope.as_deref()))
            .collect();

        assert_eq!(
            names,
            vec![("A/x", None), ("A/x", Some("C/root")), ("B/x", Some("C/root"))]
        );
    }

    #[test]
    fn test_from_records_combines_duplicates() {
        let records = vec![
            MetricRecord {
                key: MetricKey::new("A/x"),
                stats: observed(2),
            },
            MetricRecord {
                key: MetricKey::new("A/x"),
                stats: observed(3),
            },
        ];

        let metrics = from_records(records);
        let stats = &metrics[&MetricKey::new("A/x")];
        assert_eq!(stats.call_count, 2);
        assert_eq!(stats.total_call_time, Duration::from_millis(5));
    }
}
