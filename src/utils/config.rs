//! Configuration and constants for the metrics engine.
//!
//! Defaults live here as constants; `StoreConfig` carries them at runtime and
//! can be overridden from a TOML file.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Maximum number of distinct metrics kept in any one metric set
pub const MAX_SIZE: usize = 1000;

/// Samples at or beyond this index lose their per-metric breakdown on merge
pub const MAX_SAMPLES_TO_STORE_METRICS: usize = 10;

/// Transactions at least this slow are retained as samples
pub const SLOW_TRANSACTION_THRESHOLD: Duration = Duration::from_secs(2);

/// Nested calls slower than this get a call-site backtrace attached
pub const BACKTRACE_THRESHOLD: Duration = Duration::from_millis(500);

/// Frames kept from a captured backtrace
pub const MAX_BACKTRACE_FRAMES: usize = 20;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// What `merge_samples` does with samples beyond the metric-retention cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleTrimPolicy {
    /// Keep every sample, but drop the metric breakdown of the older ones
    #[default]
    ClearMetrics,

    /// Drop samples beyond the cap entirely
    Truncate,
}

/// Runtime configuration for a [`Store`](crate::store::Store)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Cap on distinct keys in the long-lived and per-transaction metric sets
    pub max_metrics: usize,

    /// Number of samples that keep their metric breakdown after a merge
    pub max_samples_to_store_metrics: usize,

    /// Minimum transaction time for slow-transaction retention
    pub slow_transaction_threshold: Duration,

    /// Minimum nested call time for backtrace capture
    pub backtrace_threshold: Duration,

    /// Frames kept per captured backtrace
    pub max_backtrace_frames: usize,

    /// Trimming behaviour for `samples`
    pub sample_trim_policy: SampleTrimPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_metrics: MAX_SIZE,
            max_samples_to_store_metrics: MAX_SAMPLES_TO_STORE_METRICS,
            slow_transaction_threshold: SLOW_TRANSACTION_THRESHOLD,
            backtrace_threshold: BACKTRACE_THRESHOLD,
            max_backtrace_frames: MAX_BACKTRACE_FRAMES,
            sample_trim_policy: SampleTrimPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Override the slow-transaction threshold
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_transaction_threshold = threshold;
        self
    }

    /// Override the sample trim policy
    pub fn with_trim_policy(mut self, policy: SampleTrimPolicy) -> Self {
        self.sample_trim_policy = policy;
        self
    }

    /// Check the configuration for values the store cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_metrics == 0 {
            return Err(ConfigError::Invalid(
                "max_metrics must be greater than 0".to_string(),
            ));
        }
        if self.max_backtrace_frames == 0 {
            return Err(ConfigError::Invalid(
                "max_backtrace_frames must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// On-disk shape of the configuration; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    max_metrics: Option<usize>,
    max_samples_to_store_metrics: Option<usize>,
    slow_transaction_threshold_ms: Option<u64>,
    backtrace_threshold_ms: Option<u64>,
    max_backtrace_frames: Option<usize>,
    sample_trim_policy: Option<SampleTrimPolicy>,
}

impl From<FileConfig> for StoreConfig {
    fn from(file: FileConfig) -> Self {
        let defaults = StoreConfig::default();
        Self {
            max_metrics: file.max_metrics.unwrap_or(defaults.max_metrics),
            max_samples_to_store_metrics: file
                .max_samples_to_store_metrics
                .unwrap_or(defaults.max_samples_to_store_metrics),
            slow_transaction_threshold: file
                .slow_transaction_threshold_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.slow_transaction_threshold),
            backtrace_threshold: file
                .backtrace_threshold_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.backtrace_threshold),
            max_backtrace_frames: file
                .max_backtrace_frames
                .unwrap_or(defaults.max_backtrace_frames),
            sample_trim_policy: file
                .sample_trim_policy
                .unwrap_or(defaults.sample_trim_policy),
        }
    }
}

/// Parse a configuration from TOML text
pub fn parse_config(contents: &str) -> Result<StoreConfig, ConfigError> {
    let file: FileConfig = toml::from_str(contents)?;
    let config = StoreConfig::from(file);
    config.validate()?;
    Ok(config)
}

/// Load a configuration from a TOML file
///
/// # Errors
/// * `ConfigError::Io` - If file cannot be read
/// * `ConfigError::Parse` - If TOML is invalid
/// * `ConfigError::Invalid` - If a value is out of range
///
/// # Example
/// ```ignore
/// let config = load_config("txn-metrics.toml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<StoreConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_parse_overrides() {
        let config = parse_config(
            r#"
            max_metrics = 50
            slow_transaction_threshold_ms = 250
            sample_trim_policy = "truncate"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_metrics, 50);
        assert_eq!(config.slow_transaction_threshold, Duration::from_millis(250));
        assert_eq!(config.sample_trim_policy, SampleTrimPolicy::Truncate);
        assert_eq!(config.backtrace_threshold, BACKTRACE_THRESHOLD);
    }

    #[test]
    fn test_zero_cap_rejected() {
        let result = parse_config("max_metrics = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = parse_config("max_sizes = 10");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
