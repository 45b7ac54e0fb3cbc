//! Output writers for drained metric data.
//!
//! This module handles:
//! - The serializable report schema
//! - Writing and reading JSON reports

pub mod json;
pub mod report;

// Re-export main functions
pub use json::{read_report, report_to_string, validate_path, write_report};
pub use report::{MetricRecord, ReportFile, SampleRecord};
