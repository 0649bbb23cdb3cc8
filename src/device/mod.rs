//! Instrument capabilities: discovery identifiers, reassembly and decoding.
//!
//! Each supported instrument implements [`Device`]. A session is built around
//! one device chosen at construction; there is no runtime class hierarchy.
//!
//! ```rust
//! use meterlink::device::{Device, EnergyMeter};
//!
//! let discovery = EnergyMeter.discover(None).unwrap();
//! assert_eq!(
//!     discovery.ids.service.to_string(),
//!     "0000ffe0-0000-1000-8000-00805f9b34fb"
//! );
//! ```

mod energy_meter;
mod multimeter;
mod uuid_template;

pub use energy_meter::EnergyMeter;
pub use multimeter::Multimeter;
pub use uuid_template::UuidTemplate;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::Result;
use crate::config::PipelineConfig;
use crate::protocol::Reassembler;
use crate::types::{LogicalFrame, MeasurementRecord};

/// Supported instrument families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    EnergyMeter,
    Multimeter,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::EnergyMeter => f.write_str("energy meter"),
            DeviceKind::Multimeter => f.write_str("multimeter"),
        }
    }
}

/// GATT identifiers for the streaming measurement characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIds {
    /// Primary service to look up after connecting
    pub service: Uuid,
    /// Characteristic that streams measurement notifications
    pub characteristic: Uuid,
}

/// How a device picker should match this instrument.
///
/// A picker that the user dismisses reports `None` to the host rather than an
/// error; only genuine transport failures become [`crate::MeterError::Transport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFilter {
    /// Match devices advertising any of these services
    pub services: Vec<Uuid>,
    /// Match devices whose advertised name equals one of these
    pub names: Vec<String>,
    /// Services the host must be allowed to access once connected
    pub optional_services: Vec<Uuid>,
}

/// Everything a transport needs to find and subscribe to an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    pub kind: DeviceKind,
    pub ids: ServiceIds,
    pub filter: DeviceFilter,
}

/// Per-instrument capabilities.
pub trait Device: Send + Sync + fmt::Debug + 'static {
    fn kind(&self) -> DeviceKind;

    /// Discovery identifiers, optionally narrowed to a specific advertised name.
    fn discover(&self, name: Option<&str>) -> Result<Discovery>;

    /// Fresh reassembly state for one connection.
    fn reassembler(&self, config: &PipelineConfig) -> Box<dyn Reassembler>;

    /// Decode a validated frame. Unknown layouts yield `None`.
    fn decode(&self, frame: &LogicalFrame) -> Option<MeasurementRecord>;
}
