//! Txn Metrics
//!
//! In-process metrics aggregation and slow-transaction sampling for a
//! request-tracing agent.
//!
//! An interception layer opens and closes frames on a
//! [`TransactionContext`](transaction::TransactionContext) through a shared
//! [`Store`](store::Store). When a transaction's entry point closes, its
//! metrics are rolled up by category, offered to the slow-transaction
//! reservoir and merged into the process-wide metric set, which a reporting
//! layer drains each cycle with `merge_data_and_clear`.
//!
//! ```ignore
//! let store = Store::default();
//! let mut ctx = TransactionContext::new();
//!
//! let root = store.record(&mut ctx, "Controller/Home#index");
//! let find = store.record(&mut ctx, "ActiveRecord/find");
//! store.stop_recording(&mut ctx, find, StopOptions::default());
//! store.stop_recording(&mut ctx, root, StopOptions::entry_point());
//! ctx.reset_transaction();
//!
//! let report = store.merge_data_and_clear(ReportData::default());
//! ```

pub mod aggregator;
pub mod commands;
pub mod metrics;
pub mod output;
pub mod sampler;
pub mod store;
pub mod transaction;
pub mod utils;

pub use metrics::{MetricKey, MetricMap, MetricStats};
pub use sampler::{SampleReservoir, TransactionSample};
pub use store::{ReportData, SampledOptions, StopOptions, StopOutcome, Store};
pub use transaction::{FrameHandle, FrameKind, TransactionContext};
pub use utils::config::StoreConfig;
