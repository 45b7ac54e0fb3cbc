//! Utility modules for configuration, error handling, and time sources.

pub mod clock;
pub mod config;
pub mod error;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_config, parse_config, SampleTrimPolicy, StoreConfig};
pub use error::{ConfigError, OutputError};
