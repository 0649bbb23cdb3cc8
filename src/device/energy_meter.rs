//! HiDANCE USB energy meter

use super::{Device, DeviceFilter, DeviceKind, Discovery, ServiceIds, UuidTemplate};
use crate::Result;
use crate::config::PipelineConfig;
use crate::decode::decode_energy_meter;
use crate::protocol::{ChunkPairReassembler, Reassembler};
use crate::types::{LogicalFrame, MeasurementRecord};

const SERVICE_SHORT: u16 = 0xFFE0;
const CHARACTERISTIC_SHORT: u16 = 0xFFE1;

/// Advertised names of known energy meter modules.
pub const KNOWN_NAMES: &[&str] = &["JDY-19"];

/// USB energy meter that splits each reading across a 20-byte and a 16-byte
/// notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyMeter;

impl EnergyMeter {
    pub fn service_ids() -> Result<ServiceIds> {
        let template = UuidTemplate::new(UuidTemplate::BLUETOOTH_BASE)?;
        Ok(ServiceIds {
            service: template.expand(SERVICE_SHORT)?,
            characteristic: template.expand(CHARACTERISTIC_SHORT)?,
        })
    }
}

impl Device for EnergyMeter {
    fn kind(&self) -> DeviceKind {
        DeviceKind::EnergyMeter
    }

    fn discover(&self, name: Option<&str>) -> Result<Discovery> {
        let ids = Self::service_ids()?;
        // The module does not advertise its service, so match by name
        let names = match name {
            Some(name) => vec![name.to_string()],
            None => KNOWN_NAMES.iter().map(|n| n.to_string()).collect(),
        };

        Ok(Discovery {
            kind: self.kind(),
            ids,
            filter: DeviceFilter {
                services: Vec::new(),
                names,
                optional_services: vec![ids.service],
            },
        })
    }

    fn reassembler(&self, config: &PipelineConfig) -> Box<dyn Reassembler> {
        Box::new(ChunkPairReassembler::new(config.pair_window_ms))
    }

    fn decode(&self, frame: &LogicalFrame) -> Option<MeasurementRecord> {
        decode_energy_meter(frame.as_bytes()).map(MeasurementRecord::EnergyMeter)
    }
}
