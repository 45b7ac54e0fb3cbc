//! Aggregation of a transaction's metrics into derived roll-ups.
//!
//! This module turns a finished transaction's raw metric set into:
//! - Per-category `<category>/all` totals scoped to the entry point

pub mod rollup;

// Re-export main types and functions
pub use rollup::{aggregate_calls, rollup_name, ROLLUP_SUFFIX};
