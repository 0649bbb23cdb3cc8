//! Recorded notification log replay
//!
//! A capture is a YAML sequence of notifications, each with its arrival time
//! in milliseconds and its payload as hex (whitespace ignored):
//!
//! ```yaml
//! - t_ms: 0
//!   bytes: "ff 55 01 01 00 04 d2 00 05 dc 00 07 3a 00 00 01 2c 00 00 7d"
//! - t_ms: 12
//!   bytes: "01 f4 03 84 00 1a 00 00 00 00 3c 00 00 00 00 00"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use tokio::time::{Duration, Instant, sleep_until};
use tracing::{debug, info, trace};

use crate::provider::PacketSource;
use crate::types::RawPacket;
use crate::{MeterError, Result};

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureEntry {
    pub t_ms: u64,
    #[serde(with = "hex_payload")]
    pub bytes: Vec<u8>,
}

mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        hex::decode(&compact).map_err(de::Error::custom)
    }
}

/// Replays a capture as a [`PacketSource`].
///
/// Unpaced replay hands out packets as fast as they are pulled. Paced replay
/// reproduces the recorded gaps between notifications.
#[derive(Debug)]
pub struct CaptureSource {
    entries: VecDeque<CaptureEntry>,
    paced: bool,
    origin: Option<(Instant, u64)>,
}

impl CaptureSource {
    /// Build from entries, which must be in non-decreasing time order.
    pub fn from_entries(entries: Vec<CaptureEntry>) -> Result<Self> {
        if let Some(pair) = entries.windows(2).find(|w| w[1].t_ms < w[0].t_ms) {
            return Err(MeterError::parse_error(
                "capture",
                format!("timestamps go backwards: {} ms after {} ms", pair[1].t_ms, pair[0].t_ms),
            ));
        }
        Ok(Self { entries: entries.into(), paced: false, origin: None })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let entries: Vec<CaptureEntry> = serde_yaml_ng::from_str(yaml)
            .map_err(|e| MeterError::parse_error("capture", e.to_string()))?;
        Self::from_entries(entries)
    }

    /// Load a capture file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| MeterError::file_error(path.to_path_buf(), e))?;
        let source = Self::from_yaml_str(&yaml)?;
        info!("Opened capture {}: {} packets", path.display(), source.remaining());
        Ok(source)
    }

    /// Reproduce recorded timing between packets.
    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait::async_trait]
impl PacketSource for CaptureSource {
    async fn next_packet(&mut self) -> Result<Option<RawPacket>> {
        let Some(entry) = self.entries.pop_front() else {
            debug!("Reached end of capture");
            return Ok(None);
        };

        if self.paced {
            let (start, first_t) = *self.origin.get_or_insert((Instant::now(), entry.t_ms));
            sleep_until(start + Duration::from_millis(entry.t_ms - first_t)).await;
        }

        trace!("Capture packet at {}ms: {} bytes", entry.t_ms, entry.bytes.len());
        Ok(Some(RawPacket::new(entry.bytes, entry.t_ms)))
    }
}
