//! EEVBlog 121GW multimeter

use uuid::Uuid;

use super::{Device, DeviceFilter, DeviceKind, Discovery, ServiceIds};
use crate::Result;
use crate::config::PipelineConfig;
use crate::decode::decode_multimeter;
use crate::protocol::{FixedFrameReassembler, FixedFrameSpec, Reassembler};
use crate::types::{LogicalFrame, MeasurementRecord};

/// Vendor service and characteristic.
pub const SERVICE_IDS: ServiceIds = ServiceIds {
    service: Uuid::from_u128(0x0bd51666_e7cb_469b_8e4d_2742f1ba77cc),
    characteristic: Uuid::from_u128(0xe7add780_b042_4876_aae1_112855353cc1),
};

/// Multimeter streaming self-delimited 19-byte frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multimeter;

impl Device for Multimeter {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Multimeter
    }

    fn discover(&self, name: Option<&str>) -> Result<Discovery> {
        Ok(Discovery {
            kind: self.kind(),
            ids: SERVICE_IDS,
            filter: DeviceFilter {
                services: vec![SERVICE_IDS.service],
                names: name.map(str::to_string).into_iter().collect(),
                optional_services: Vec::new(),
            },
        })
    }

    fn reassembler(&self, _config: &PipelineConfig) -> Box<dyn Reassembler> {
        Box::new(FixedFrameReassembler::new(FixedFrameSpec::MULTIMETER))
    }

    fn decode(&self, frame: &LogicalFrame) -> Option<MeasurementRecord> {
        decode_multimeter(frame.as_bytes()).map(MeasurementRecord::Multimeter)
    }
}
