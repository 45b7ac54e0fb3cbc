//! Aggregated timing for one metric.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Running totals for a metric bucket
///
/// `total_exclusive_time` never exceeds `total_call_time`. Stats from
/// different transactions, cycles or workers fold together with
/// [`combine`](MetricStats::combine), which is commutative and associative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricStats {
    pub call_count: u64,
    pub total_call_time: Duration,
    pub total_exclusive_time: Duration,

    /// Shortest single call; meaningless while `call_count == 0`
    pub min_call_time: Duration,

    /// Longest single call
    pub max_call_time: Duration,

    /// Whether the bucket was recorded under an enclosing call
    pub scoped: bool,
}

impl MetricStats {
    pub fn new(scoped: bool) -> Self {
        Self {
            scoped,
            ..Default::default()
        }
    }

    /// Add one observation
    ///
    /// `exclusive` is clamped to `total`.
    pub fn update(&mut self, total: Duration, exclusive: Duration) {
        let exclusive = exclusive.min(total);

        if self.call_count == 0 {
            self.min_call_time = total;
            self.max_call_time = total;
        } else {
            self.min_call_time = self.min_call_time.min(total);
            self.max_call_time = self.max_call_time.max(total);
        }

        self.call_count += 1;
        self.total_call_time += total;
        self.total_exclusive_time += exclusive;
    }

    /// Fold `other` into `self`
    pub fn combine(&mut self, other: &MetricStats) {
        if other.call_count > 0 {
            if self.call_count == 0 {
                self.min_call_time = other.min_call_time;
                self.max_call_time = other.max_call_time;
            } else {
                self.min_call_time = self.min_call_time.min(other.min_call_time);
                self.max_call_time = self.max_call_time.max(other.max_call_time);
            }
        }

        self.call_count += other.call_count;
        self.total_call_time += other.total_call_time;
        self.total_exclusive_time += other.total_exclusive_time;
        self.scoped |= other.scoped;
    }

    /// Non-mutating form of [`combine`](MetricStats::combine)
    pub fn combined(&self, other: &MetricStats) -> MetricStats {
        let mut merged = self.clone();
        merged.combine(other);
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.call_count == 0
    }

    /// Mean call time, zero when nothing has been recorded
    pub fn average_call_time(&self) -> Duration {
        match u32::try_from(self.call_count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total_call_time / count,
            Err(_) => Duration::from_secs_f64(
                self.total_call_time.as_secs_f64() / self.call_count as f64,
            ),
        }
    }
}
