//! Thread-safe slow-transaction retention.
//!
//! Many threads close transactions and offer them here; one reporting thread
//! drains. Every operation takes the single reservoir lock for a short,
//! allocation-bounded critical section and never holds another lock.

use super::sample::TransactionSample;
use crate::metrics::{MetricKey, MetricMap, MetricStats};
use crate::utils::config::SampleTrimPolicy;
use log::debug;
use parking_lot::Mutex;
use std::time::Duration;

/// Holds the slowest transaction since the last fetch, plus the list of
/// recent slow transactions
#[derive(Debug)]
pub struct SampleReservoir {
    threshold: Duration,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Slowest transaction since the last `fetch_and_reset_sample`
    sample: Option<TransactionSample>,

    /// Recent slow transactions, oldest first
    samples: Vec<TransactionSample>,
}

impl SampleReservoir {
    /// Create a reservoir retaining transactions at least `threshold` long
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Offer a completed transaction
    ///
    /// # Arguments
    /// * `uri` - Request URI, if the entry point had one
    /// * `metrics` - Transaction metrics plus roll-ups; copied, never aliased
    /// * `parent_key` - Key of the transaction's root frame
    /// * `parent_stats` - Stats of the root frame; its total time ranks the sample
    ///
    /// # Returns
    /// `true` if the transaction was retained in either slot
    pub fn store_sample(
        &self,
        uri: Option<&str>,
        metrics: &MetricMap,
        parent_key: &MetricKey,
        parent_stats: &MetricStats,
    ) -> bool {
        let total_time = parent_stats.total_call_time;
        if total_time < self.threshold {
            return false;
        }

        let snapshot = || {
            TransactionSample::new(
                uri.map(str::to_string),
                parent_key.metric_name.clone(),
                total_time,
                metrics.clone(),
            )
        };

        let mut inner = self.inner.lock();

        let slowest = inner
            .sample
            .as_ref()
            .map_or(true, |held| total_time > held.total_time);
        if slowest {
            debug!(
                "New slowest transaction {} ({:.3}s)",
                parent_key.metric_name,
                total_time.as_secs_f64()
            );
            inner.sample = Some(snapshot());
        }

        inner.samples.push(snapshot());
        debug!(
            "Retained slow transaction {} ({} samples held)",
            parent_key.metric_name,
            inner.samples.len()
        );

        true
    }

    /// Take the slowest transaction, leaving the slot empty
    pub fn fetch_and_reset_sample(&self) -> Option<TransactionSample> {
        self.inner.lock().sample.take()
    }

    /// Append `incoming` and trim per `policy`
    ///
    /// Samples at index `keep_metrics` and beyond either lose their metric
    /// breakdown (`ClearMetrics`) or are removed (`Truncate`).
    pub fn merge_samples(
        &self,
        incoming: Vec<TransactionSample>,
        keep_metrics: usize,
        policy: SampleTrimPolicy,
    ) {
        let mut inner = self.inner.lock();
        merge_into(&mut inner.samples, incoming, keep_metrics, policy);
    }

    /// Merge `incoming` and take the whole list in one critical section
    pub fn merge_and_take(
        &self,
        incoming: Vec<TransactionSample>,
        keep_metrics: usize,
        policy: SampleTrimPolicy,
    ) -> Vec<TransactionSample> {
        let mut inner = self.inner.lock();
        merge_into(&mut inner.samples, incoming, keep_metrics, policy);
        std::mem::take(&mut inner.samples)
    }

    /// Number of samples in the recent list
    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the recent list
    pub fn samples(&self) -> Vec<TransactionSample> {
        self.inner.lock().samples.clone()
    }

    /// Total time of the held slowest sample
    pub fn slowest_time(&self) -> Option<Duration> {
        self.inner.lock().sample.as_ref().map(|s| s.total_time)
    }
}

/// **Private** - shared by the merge entry points; caller holds the lock
fn merge_into(
    samples: &mut Vec<TransactionSample>,
    incoming: Vec<TransactionSample>,
    keep_metrics: usize,
    policy: SampleTrimPolicy,
) {
    samples.extend(incoming);

    if samples.len() <= keep_metrics {
        return;
    }

    match policy {
        SampleTrimPolicy::ClearMetrics => {
            let mut cleared = 0;
            for sample in samples.iter_mut().skip(keep_metrics) {
                if sample.has_metrics() {
                    *sample = sample.clear_metrics();
                    cleared += 1;
                }
            }
            debug!(
                "Cleared metrics on {} of {} samples",
                cleared,
                samples.len()
            );
        }
        SampleTrimPolicy::Truncate => {
            let dropped = samples.len() - keep_metrics;
            samples.truncate(keep_metrics);
            debug!("Dropped {} samples beyond the cap of {}", dropped, keep_metrics);
        }
    }
}
