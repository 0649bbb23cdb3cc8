//! HiDANCE USB energy meter frame layouts

use tracing::debug;

use crate::types::FieldWidth::{U8, U16, U24, U32};
use crate::types::{
    AcReading, DcChargeReading, EnergyMeterRecord, FieldLayout, Scale, UsbReading, read_fields,
};

/// Offset of the mode byte within a stitched frame.
pub const MODE_OFFSET: usize = 3;

/// Mode 1 (AC) layout.
pub const AC_LAYOUT: [FieldLayout; 9] = [
    FieldLayout::new("voltage_v", 4, U24, Scale::Div(10)),
    FieldLayout::new("current_a", 7, U24, Scale::Div(1000)),
    FieldLayout::new("power_w", 10, U24, Scale::Div(10)),
    FieldLayout::new("energy_wh", 13, U32, Scale::Mul(10)),
    FieldLayout::new("price_per_kwh", 17, U24, Scale::Div(100)),
    FieldLayout::new("frequency_hz", 20, U16, Scale::Div(10)),
    FieldLayout::new("power_factor", 22, U16, Scale::Div(1000)),
    FieldLayout::new("temp_c", 24, U16, Scale::Unit),
    FieldLayout::new("backlight_time_s", 30, U8, Scale::Unit),
];

/// Mode 2 (DC charge) layout.
pub const DC_CHARGE_LAYOUT: [FieldLayout; 7] = [
    FieldLayout::new("voltage_v", 4, U24, Scale::Div(10)),
    FieldLayout::new("current_a", 7, U24, Scale::Div(1000)),
    FieldLayout::new("charge_ah", 10, U24, Scale::Div(100)),
    FieldLayout::new("energy_wh", 13, U32, Scale::Mul(100)),
    FieldLayout::new("price_per_kwh", 17, U24, Scale::Div(100)),
    FieldLayout::new("temp_c", 24, U16, Scale::Unit),
    FieldLayout::new("backlight_time_s", 30, U8, Scale::Unit),
];

/// Mode 3 (USB) layout.
pub const USB_LAYOUT: [FieldLayout; 9] = [
    FieldLayout::new("voltage_v", 4, U24, Scale::Div(100)),
    FieldLayout::new("current_a", 7, U24, Scale::Div(100)),
    FieldLayout::new("charge_ah", 10, U24, Scale::Div(1000)),
    FieldLayout::new("energy_wh", 13, U32, Scale::Div(100)),
    FieldLayout::new("usb_dp_v", 17, U16, Scale::Div(100)),
    FieldLayout::new("usb_dm_v", 19, U16, Scale::Div(100)),
    FieldLayout::new("temp_c", 21, U16, Scale::Unit),
    FieldLayout::new("on_time_s", 23, U16, Scale::Unit),
    FieldLayout::new("backlight_time_s", 30, U8, Scale::Unit),
];

/// Layout table for a mode byte, if the mode is known.
pub fn layout_for_mode(mode: u8) -> Option<&'static [FieldLayout]> {
    match mode {
        1 => Some(&AC_LAYOUT),
        2 => Some(&DC_CHARGE_LAYOUT),
        3 => Some(&USB_LAYOUT),
        _ => None,
    }
}

/// Decode a stitched energy meter frame.
///
/// Returns `None` for unknown modes and for frames too short for their
/// layout; neither is an error.
pub fn decode_energy_meter(frame: &[u8]) -> Option<EnergyMeterRecord> {
    let Some(&mode) = frame.get(MODE_OFFSET) else {
        debug!(len = frame.len(), "Frame too short for mode byte");
        return None;
    };

    let decoded = match mode {
        1 => read_fields(frame, &AC_LAYOUT).map(
            |[
                voltage_v,
                current_a,
                power_w,
                energy_wh,
                price_per_kwh,
                frequency_hz,
                power_factor,
                temp_c,
                backlight_time_s,
            ]| {
                EnergyMeterRecord::Ac(AcReading {
                    voltage_v,
                    current_a,
                    power_w,
                    energy_wh,
                    price_per_kwh,
                    frequency_hz,
                    power_factor,
                    temp_c,
                    backlight_time_s,
                })
            },
        ),
        2 => read_fields(frame, &DC_CHARGE_LAYOUT).map(
            |[
                voltage_v,
                current_a,
                charge_ah,
                energy_wh,
                price_per_kwh,
                temp_c,
                backlight_time_s,
            ]| {
                EnergyMeterRecord::DcCharge(DcChargeReading {
                    voltage_v,
                    current_a,
                    charge_ah,
                    energy_wh,
                    price_per_kwh,
                    temp_c,
                    backlight_time_s,
                })
            },
        ),
        3 => read_fields(frame, &USB_LAYOUT).map(
            |[
                voltage_v,
                current_a,
                charge_ah,
                energy_wh,
                usb_dp_v,
                usb_dm_v,
                temp_c,
                on_time_s,
                backlight_time_s,
            ]| {
                EnergyMeterRecord::Usb(UsbReading {
                    voltage_v,
                    current_a,
                    charge_ah,
                    energy_wh,
                    usb_dp_v,
                    usb_dm_v,
                    temp_c,
                    on_time_s,
                    backlight_time_s,
                })
            },
        ),
        other => {
            debug!(mode = other, "Unrecognized energy meter mode");
            return None;
        }
    };

    match decoded {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(mode, error = %e, "Energy meter frame shorter than its layout");
            None
        }
    }
}
