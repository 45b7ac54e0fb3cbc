//! The metric store: stack bookkeeping, transaction completion and the
//! reporting hand-off.
//!
//! # Locking
//!
//! - Per-transaction state lives in a `TransactionContext` passed by `&mut`
//!   and is never shared, so it takes no lock.
//! - The long-lived metric set sits behind one mutex; every mutation
//!   (transaction merge, `track_sampled`, `merge_metrics`, drain) holds it for
//!   the duration of a map update.
//! - The sample reservoir has its own mutex.
//!
//! No path holds both mutexes at once.

use super::backtrace::{capture_backtrace, BACKTRACE_EXTRA_KEY};
use super::types::{ReportData, SampledOptions, StopOptions, StopOutcome};
use crate::aggregator::aggregate_calls;
use crate::metrics::{MetricKey, MetricMap, MetricStats};
use crate::sampler::{SampleReservoir, TransactionSample};
use crate::transaction::{FrameHandle, FrameKind, TransactionContext};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::config::StoreConfig;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide metric store
///
/// Shared between worker threads behind an `Arc`; each worker drives its own
/// transactions through its own `TransactionContext`.
#[derive(Debug)]
pub struct Store {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    metrics: Mutex<MetricMap>,
    reservoir: SampleReservoir,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store reading time from `clock`
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        let reservoir = SampleReservoir::new(config.slow_transaction_threshold);
        Self {
            config,
            clock,
            metrics: Mutex::new(MetricMap::new()),
            reservoir,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Stack lifecycle
    // ------------------------------------------------------------------

    /// Open a frame for `metric_name`
    ///
    /// Returns the handle that must be passed back to `stop_recording`.
    /// While the transaction is ignored nothing is pushed.
    pub fn record(&self, ctx: &mut TransactionContext, metric_name: impl Into<String>) -> FrameHandle {
        if ctx.is_ignored() {
            return ctx.detached_handle();
        }
        ctx.push(metric_name.into(), self.clock.now())
    }

    /// Close the frame identified by `handle`
    ///
    /// Never fails: a mismatched handle puts the transaction into ignore mode
    /// and a full metric set drops the frame. See [`StopOutcome`].
    pub fn stop_recording(
        &self,
        ctx: &mut TransactionContext,
        handle: FrameHandle,
        options: StopOptions,
    ) -> StopOutcome {
        if ctx.is_ignored() {
            return StopOutcome::Ignored;
        }

        let frame = match ctx.pop() {
            Some(frame) if frame.matches(handle) => frame,
            popped => {
                warn!(
                    "Unexpected frame on stack: expected handle {}, found {}; ignoring transaction",
                    handle.id(),
                    popped
                        .as_ref()
                        .map(|f| f.metric_name.as_str())
                        .unwrap_or("<empty stack>")
                );
                ctx.ignore_transaction();
                return StopOutcome::StackMismatch;
            }
        };

        let duration = self.clock.now().saturating_duration_since(frame.start_time);
        let exclusive = duration.saturating_sub(frame.children_time);

        let scope = ctx.top_mut().map(|parent| {
            parent.children_time += duration;
            parent.metric_name.clone()
        });
        let at_root = scope.is_none();

        let mut key = MetricKey::new(frame.metric_name)
            .with_scope(scope)
            .with_description(options.description);

        if !at_root && duration > self.config.backtrace_threshold {
            let frames = capture_backtrace(self.config.max_backtrace_frames);
            key = key.with_extra(BACKTRACE_EXTRA_KEY, serde_json::json!(frames));
        }

        let closes_transaction = at_root && options.kind == FrameKind::EntryPoint;
        let parent_key = closes_transaction.then(|| key.clone());

        if !self.record_in_transaction(ctx, key, duration, exclusive, at_root) {
            return StopOutcome::CapacityDropped;
        }

        match parent_key {
            Some(parent_key) => {
                let sampled = self.complete_transaction(ctx, &parent_key, options.uri.as_deref());
                StopOutcome::TransactionClosed { sampled }
            }
            None => StopOutcome::Recorded,
        }
    }

    /// Update the transaction metric set; `false` if the key was dropped
    ///
    /// **Private** - existing keys always update, new keys need room unless
    /// the frame is the transaction's root
    fn record_in_transaction(
        &self,
        ctx: &mut TransactionContext,
        key: MetricKey,
        duration: Duration,
        exclusive: Duration,
        at_root: bool,
    ) -> bool {
        let max = self.config.max_metrics;
        let metrics = ctx.metrics_mut();

        if let Some(stats) = metrics.get_mut(&key) {
            stats.update(duration, exclusive);
            return true;
        }

        if metrics.len() >= max && !at_root {
            debug!(
                "Transaction metric set full ({} entries), dropping {}",
                metrics.len(),
                key.metric_name
            );
            return false;
        }

        let mut stats = MetricStats::new(!at_root);
        stats.update(duration, exclusive);
        metrics.insert(key, stats);
        true
    }

    /// Roll up, sample and merge a finished transaction
    ///
    /// **Private** - called when the entry point closes
    fn complete_transaction(
        &self,
        ctx: &TransactionContext,
        parent_key: &MetricKey,
        uri: Option<&str>,
    ) -> bool {
        let metrics = ctx.metrics();
        let parent_stats = metrics.get(parent_key).cloned().unwrap_or_default();

        let mut combined = metrics.clone();
        for (key, stats) in aggregate_calls(metrics, parent_key) {
            combined.entry(key).or_default().combine(&stats);
        }

        let sampled = self
            .reservoir
            .store_sample(uri, &combined, parent_key, &parent_stats);

        debug!(
            "Transaction {} closed: {} metrics, {:.3}s",
            parent_key.metric_name,
            combined.len(),
            parent_stats.total_call_time.as_secs_f64()
        );

        self.merge_metrics(combined);
        sampled
    }

    // ------------------------------------------------------------------
    // Long-lived metrics
    // ------------------------------------------------------------------

    /// Record a pre-aggregated observation straight into the long-lived set
    pub fn track_sampled(
        &self,
        metric_name: impl Into<String>,
        call_time: Duration,
        options: SampledOptions,
    ) {
        let key = MetricKey::new(metric_name).with_scope(options.scope);
        let exclusive = options.exclusive_time.unwrap_or(call_time);
        let max = self.config.max_metrics;

        let mut metrics = self.metrics.lock();
        if let Some(stats) = metrics.get_mut(&key) {
            stats.update(call_time, exclusive);
        } else if metrics.len() < max {
            let mut stats = MetricStats::new(key.is_scoped());
            stats.update(call_time, exclusive);
            metrics.insert(key, stats);
        } else {
            debug!("Metric set full, dropping sampled {}", key.metric_name);
        }
    }

    /// Fold `incoming` into the long-lived set
    ///
    /// # Returns
    /// Number of new keys dropped because the set was full
    pub fn merge_metrics(&self, incoming: MetricMap) -> usize {
        let mut metrics = self.metrics.lock();
        merge_into(&mut metrics, incoming, self.config.max_metrics)
    }

    /// Append samples carried over from elsewhere, trimming per config
    pub fn merge_samples(&self, incoming: Vec<TransactionSample>) {
        self.reservoir.merge_samples(
            incoming,
            self.config.max_samples_to_store_metrics,
            self.config.sample_trim_policy,
        );
    }

    /// Merge `old_data` in, then drain everything accumulated
    ///
    /// **Public** - the reporting layer's single hand-off per cycle. The
    /// returned data is the merged state; the store is left empty.
    pub fn merge_data_and_clear(&self, old_data: ReportData) -> ReportData {
        let metrics = {
            let mut current = self.metrics.lock();
            merge_into(&mut current, old_data.metrics, self.config.max_metrics);
            std::mem::take(&mut *current)
        };

        let samples = self.reservoir.merge_and_take(
            old_data.samples,
            self.config.max_samples_to_store_metrics,
            self.config.sample_trim_policy,
        );

        debug!(
            "Drained {} metrics and {} samples",
            metrics.len(),
            samples.len()
        );

        ReportData { metrics, samples }
    }

    /// Take the slowest transaction since the last fetch
    pub fn fetch_and_reset_sample(&self) -> Option<TransactionSample> {
        self.reservoir.fetch_and_reset_sample()
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Number of distinct metrics in the long-lived set
    pub fn metric_count(&self) -> usize {
        self.metrics.lock().len()
    }

    pub fn metric_stats(&self, key: &MetricKey) -> Option<MetricStats> {
        self.metrics.lock().get(key).cloned()
    }

    /// Copy of the long-lived set
    pub fn metrics_snapshot(&self) -> MetricMap {
        self.metrics.lock().clone()
    }

    pub fn reservoir(&self) -> &SampleReservoir {
        &self.reservoir
    }
}

/// Combine matching keys, insert new ones while under `max`, drop the rest
fn merge_into(target: &mut MetricMap, incoming: MetricMap, max: usize) -> usize {
    let mut dropped = 0;

    for (key, stats) in incoming {
        if let Some(existing) = target.get_mut(&key) {
            existing.combine(&stats);
        } else if target.len() < max {
            target.insert(key, stats);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        debug!("Metric set full ({} entries), dropped {} metrics", max, dropped);
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(ms: u64) -> MetricStats {
        let mut stats = MetricStats::new(false);
        let d = Duration::from_millis(ms);
        stats.update(d, d);
        stats
    }

    #[test]
    fn test_merge_into_combines_at_capacity() {
        let mut target = MetricMap::new();
        target.insert(MetricKey::new("A/a"), observed(1));

        let mut incoming = MetricMap::new();
        incoming.insert(MetricKey::new("A/a"), observed(2));
        incoming.insert(MetricKey::new("B/b"), observed(3));

        let dropped = merge_into(&mut target, incoming, 1);

        assert_eq!(dropped, 1);
        assert_eq!(target.len(), 1);
        assert_eq!(target[&MetricKey::new("A/a")].call_count, 2);
    }

    #[test]
    fn test_record_while_ignored_pushes_nothing() {
        let store = Store::default();
        let mut ctx = TransactionContext::new();
        ctx.ignore_transaction();

        let handle = store.record(&mut ctx, "Controller/x");

        assert!(ctx.is_idle());
        assert_eq!(
            store.stop_recording(&mut ctx, handle, StopOptions::entry_point()),
            StopOutcome::Ignored
        );
    }
}
