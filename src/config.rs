//! Pipeline configuration loaded from YAML

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::protocol::DEFAULT_PAIR_WINDOW_MS;
use crate::types::UpdateRate;
use crate::{MeterError, Result};

/// Default capacity of the record broadcast channel.
pub const DEFAULT_RECORD_CHANNEL_CAPACITY: usize = 64;

/// Tunables for a [`crate::DeviceSession`].
///
/// Every field is optional in YAML:
///
/// ```rust
/// use meterlink::{PipelineConfig, UpdateRate};
///
/// let config = PipelineConfig::from_yaml_str("pair_window_ms: 500\nupdate_rate: !Max 10\n")
///     .unwrap();
/// assert_eq!(config.pair_window_ms, 500);
/// assert_eq!(config.record_channel_capacity, 64);
/// assert_eq!(config.update_rate, UpdateRate::Max(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum gap between the two halves of a chunked reading
    pub pair_window_ms: u64,
    /// Records buffered per subscriber before the slowest one starts lagging
    pub record_channel_capacity: usize,
    /// Default rate for record subscriptions
    pub update_rate: UpdateRate,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pair_window_ms: DEFAULT_PAIR_WINDOW_MS,
            record_channel_capacity: DEFAULT_RECORD_CHANNEL_CAPACITY,
            update_rate: UpdateRate::Native,
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml).map_err(|e| {
                MeterError::parse_error("pipeline config", e.to_string())
            })?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| MeterError::file_error(path.to_path_buf(), e))?;
        debug!("Loaded pipeline config from {} ({} bytes)", path.display(), yaml.len());
        Self::from_yaml_str(&yaml)
    }

    /// Reject values that would stall the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.pair_window_ms == 0 {
            return Err(MeterError::parse_error(
                "pipeline config",
                "pair_window_ms must be greater than zero",
            ));
        }
        if self.record_channel_capacity == 0 {
            return Err(MeterError::parse_error(
                "pipeline config",
                "record_channel_capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}
