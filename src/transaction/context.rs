//! Per-transaction recording state.

use super::frame::{CallFrame, FrameHandle};
use crate::metrics::{MetricKey, MetricMap, MetricStats};
use std::time::Instant;

/// Everything one in-flight transaction owns: its call stack, its metric
/// set and the ignore flag
///
/// A context belongs to exactly one thread of execution for the lifetime of
/// a transaction and is passed by `&mut` into the store, so it needs no
/// locking. Call [`reset_transaction`](TransactionContext::reset_transaction)
/// at every transaction boundary.
#[derive(Debug, Default)]
pub struct TransactionContext {
    stack: Vec<CallFrame>,
    metrics: MetricMap,
    ignored: bool,
    next_frame_id: u64,
}

impl TransactionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop recording for the rest of this transaction
    pub fn ignore_transaction(&mut self) {
        self.ignored = true;
    }

    /// Clear the stack, the metric set and the ignore flag
    ///
    /// Frame ids keep counting so handles from the finished transaction
    /// cannot match frames of the next one.
    pub fn reset_transaction(&mut self) {
        self.stack.clear();
        self.metrics.clear();
        self.ignored = false;
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Number of open frames
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    /// Metrics recorded so far in this transaction
    pub fn metrics(&self) -> &MetricMap {
        &self.metrics
    }

    pub fn stats(&self, key: &MetricKey) -> Option<&MetricStats> {
        self.metrics.get(key)
    }

    pub(crate) fn push(&mut self, metric_name: String, start_time: Instant) -> FrameHandle {
        self.next_frame_id += 1;
        let frame = CallFrame::new(self.next_frame_id, metric_name, start_time);
        let handle = frame.handle();
        self.stack.push(frame);
        handle
    }

    /// A handle that matches no frame, handed out while ignoring
    pub(crate) fn detached_handle(&mut self) -> FrameHandle {
        self.next_frame_id += 1;
        FrameHandle {
            id: self.next_frame_id,
        }
    }

    pub(crate) fn pop(&mut self) -> Option<CallFrame> {
        self.stack.pop()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut CallFrame> {
        self.stack.last_mut()
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut MetricMap {
        &mut self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_state_but_not_ids() {
        let mut ctx = TransactionContext::new();
        let first = ctx.push("Controller/a".to_string(), Instant::now());
        ctx.ignore_transaction();
        ctx.metrics_mut()
            .insert(MetricKey::new("Controller/a"), MetricStats::default());

        ctx.reset_transaction();

        assert!(ctx.is_idle());
        assert!(!ctx.is_ignored());
        assert!(ctx.metrics().is_empty());

        let second = ctx.push("Controller/a".to_string(), Instant::now());
        assert_ne!(first, second);
    }
}
