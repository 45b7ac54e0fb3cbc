//! The process-wide metric store.
//!
//! This module handles:
//! - Timing nested frames of a transaction
//! - Completing transactions (roll-ups, sampling, merge)
//! - Handing accumulated data to the reporting layer

pub mod backtrace;
pub mod engine;
pub mod types;

pub use engine::Store;
pub use types::{ReportData, SampledOptions, StopOptions, StopOutcome};
