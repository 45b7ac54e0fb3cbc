//! Option and result types for the store's inbound and outbound calls.

use crate::metrics::MetricMap;
use crate::sampler::TransactionSample;
use crate::transaction::FrameKind;
use std::time::Duration;

/// Options for `Store::stop_recording`
#[derive(Debug, Clone, Default)]
pub struct StopOptions {
    /// Free-form description attached to the metric key (e.g. SQL text)
    pub description: Option<String>,

    /// Request URI, kept on a retained sample
    pub uri: Option<String>,

    /// Whether this frame is the transaction's entry point
    pub kind: FrameKind,
}

impl StopOptions {
    /// Options for closing a transaction's entry point
    pub fn entry_point() -> Self {
        Self {
            kind: FrameKind::EntryPoint,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

/// Options for `Store::track_sampled`
#[derive(Debug, Clone, Default)]
pub struct SampledOptions {
    pub scope: Option<String>,

    /// Defaults to the call time
    pub exclusive_time: Option<Duration>,
}

/// What `stop_recording` did with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Stats updated in the transaction's metric set
    Recorded,

    /// The transaction metric set was full; the frame's stats were dropped
    CapacityDropped,

    /// The entry point closed; the transaction was aggregated, offered to the
    /// reservoir and merged. The caller should now reset the context.
    TransactionClosed {
        /// Whether the reservoir retained it
        sampled: bool,
    },

    /// The transaction is being ignored; nothing was recorded
    Ignored,

    /// The handle did not match the stack top; the transaction is now ignored
    StackMismatch,
}

/// The unit of hand-off between the store and the reporting layer
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub metrics: MetricMap,
    pub samples: Vec<TransactionSample>,
}

impl ReportData {
    pub fn new(metrics: MetricMap, samples: Vec<TransactionSample>) -> Self {
        Self { metrics, samples }
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.samples.is_empty()
    }
}
