//! Slow-transaction sampling.
//!
//! This module handles:
//! - Snapshotting completed transactions
//! - Keeping the slowest one for the reporting layer
//! - Bounding the memory of the recent-samples list

pub mod reservoir;
pub mod sample;

pub use reservoir::SampleReservoir;
pub use sample::TransactionSample;
