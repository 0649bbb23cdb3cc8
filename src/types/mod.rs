//! Core types for packets, frames, layouts and decoded records.
//!
//! ## Architecture
//!
//! - [`RawPacket`] is one transport notification plus its arrival time
//! - [`LogicalFrame`] is one complete, integrity-checked measurement frame
//! - [`FieldLayout`] describes a big-endian field at a fixed offset with its scale
//! - [`FieldValue`] reads 8/16/24/32-bit big-endian values with bounds checks
//! - [`MeasurementRecord`] is the decoded, scaled result
//!
//! ## Usage Example
//!
//! ```rust
//! use meterlink::types::{FieldLayout, FieldWidth, Scale};
//!
//! let voltage = FieldLayout::new("voltage_v", 4, FieldWidth::U24, Scale::Div(10));
//! let frame = [0xFF, 0x55, 0x01, 0x01, 0x00, 0x04, 0xD2];
//! assert_eq!(voltage.read(&frame).unwrap(), 123.4);
//! ```

mod field_value;
mod layout;
mod packet;
mod record;
mod update_rate;

pub use field_value::{FieldValue, U24};
pub use layout::{FieldLayout, FieldWidth, Scale, read_fields};
pub use packet::{LogicalFrame, RawPacket};
pub use record::{
    AcReading, DcChargeReading, EnergyMeterRecord, MeasurementRecord, MultimeterRecord,
    UsbReading,
};
pub use update_rate::UpdateRate;
