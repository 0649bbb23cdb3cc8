//! Update rate control for record streams

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Update rate for record streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum UpdateRate {
    /// Every decoded record, as it arrives
    #[default]
    Native,

    /// At most this many records per second, keeping the latest.
    /// `Max(0)` behaves like `Native`.
    Max(u32),
}

impl UpdateRate {
    /// Check if throttling is needed
    pub fn needs_throttle(self) -> bool {
        self.throttle_interval().is_some()
    }

    /// Get throttle interval if needed
    pub fn throttle_interval(self) -> Option<Duration> {
        match self {
            UpdateRate::Native | UpdateRate::Max(0) => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / f64::from(hz))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_and_zero_do_not_throttle() {
        assert!(!UpdateRate::Native.needs_throttle());
        assert!(!UpdateRate::Max(0).needs_throttle());
    }

    #[test]
    fn max_rate_maps_to_interval() {
        assert_eq!(UpdateRate::Max(4).throttle_interval(), Some(Duration::from_millis(250)));
        assert!(UpdateRate::Max(1).needs_throttle());
    }

    #[test]
    fn deserializes_from_yaml() {
        let rate: UpdateRate = serde_yaml_ng::from_str("!Max 5").unwrap();
        assert_eq!(rate, UpdateRate::Max(5));
        let rate: UpdateRate = serde_yaml_ng::from_str("Native").unwrap();
        assert_eq!(rate, UpdateRate::Native);
    }
}
