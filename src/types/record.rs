//! Decoded measurement records

use serde::{Deserialize, Serialize};

/// One decoded measurement, tagged by the instrument that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(tag = "device", rename_all = "snake_case")]
pub enum MeasurementRecord {
    EnergyMeter(EnergyMeterRecord),
    Multimeter(MultimeterRecord),
}

impl MeasurementRecord {
    pub fn as_energy_meter(&self) -> Option<&EnergyMeterRecord> {
        match self {
            MeasurementRecord::EnergyMeter(r) => Some(r),
            MeasurementRecord::Multimeter(_) => None,
        }
    }

    pub fn as_multimeter(&self) -> Option<&MultimeterRecord> {
        match self {
            MeasurementRecord::Multimeter(r) => Some(r),
            MeasurementRecord::EnergyMeter(_) => None,
        }
    }
}

/// Energy meter reading. The variant is selected by the frame's mode byte and
/// fully determines which quantities are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EnergyMeterRecord {
    /// Mode 1
    Ac(AcReading),
    /// Mode 2
    DcCharge(DcChargeReading),
    /// Mode 3
    Usb(UsbReading),
}

impl EnergyMeterRecord {
    /// Wire value of the mode byte that produced this record.
    pub fn mode(&self) -> u8 {
        match self {
            EnergyMeterRecord::Ac(_) => 1,
            EnergyMeterRecord::DcCharge(_) => 2,
            EnergyMeterRecord::Usb(_) => 3,
        }
    }

    pub fn voltage_v(&self) -> f64 {
        match self {
            EnergyMeterRecord::Ac(r) => r.voltage_v,
            EnergyMeterRecord::DcCharge(r) => r.voltage_v,
            EnergyMeterRecord::Usb(r) => r.voltage_v,
        }
    }

    pub fn current_a(&self) -> f64 {
        match self {
            EnergyMeterRecord::Ac(r) => r.current_a,
            EnergyMeterRecord::DcCharge(r) => r.current_a,
            EnergyMeterRecord::Usb(r) => r.current_a,
        }
    }
}

/// AC mode reading (mode 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct AcReading {
    pub voltage_v: f64,
    pub current_a: f64,
    pub power_w: f64,
    pub energy_wh: f64,
    pub price_per_kwh: f64,
    pub frequency_hz: f64,
    pub power_factor: f64,
    pub temp_c: f64,
    pub backlight_time_s: f64,
}

/// DC charge mode reading (mode 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DcChargeReading {
    pub voltage_v: f64,
    pub current_a: f64,
    pub charge_ah: f64,
    pub energy_wh: f64,
    pub price_per_kwh: f64,
    pub temp_c: f64,
    pub backlight_time_s: f64,
}

/// USB mode reading (mode 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct UsbReading {
    pub voltage_v: f64,
    pub current_a: f64,
    pub charge_ah: f64,
    pub energy_wh: f64,
    pub usb_dp_v: f64,
    pub usb_dm_v: f64,
    pub temp_c: f64,
    pub on_time_s: f64,
    pub backlight_time_s: f64,
}

/// Multimeter display state.
///
/// Mode and range bytes are passed through undecoded; their meaning depends
/// on the meter firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct MultimeterRecord {
    /// Two digit manufacture year relative to 2000. `None` when the serial
    /// word has a hex letter in its first digit.
    pub mfg_year: Option<u8>,
    pub mfg_month: u8,
    /// User-configurable five digit serial number, read up to the first hex
    /// letter
    pub serial_number: Option<u32>,
    pub main_mode: u8,
    pub main_range: u8,
    /// Main display reading including the two high bits carried in the mode byte
    pub main_value: u32,
    pub sub_mode: u8,
    pub sub_range: u8,
    pub sub_value: u16,
    pub bar_status: u8,
    pub bar_value: u8,
    pub icon_status: [u8; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usb() -> EnergyMeterRecord {
        EnergyMeterRecord::Usb(UsbReading {
            voltage_v: 5.12,
            current_a: 1.5,
            charge_ah: 0.25,
            energy_wh: 1.28,
            usb_dp_v: 0.6,
            usb_dm_v: 0.6,
            temp_c: 28.0,
            on_time_s: 120.0,
            backlight_time_s: 30.0,
        })
    }

    #[test]
    fn mode_matches_variant() {
        assert_eq!(usb().mode(), 3);
        assert_eq!(usb().voltage_v(), 5.12);
        assert_eq!(usb().current_a(), 1.5);
    }

    #[test]
    fn records_serialize_with_tags() {
        let record = MeasurementRecord::EnergyMeter(usb());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["device"], "energy_meter");
        assert_eq!(json["mode"], "usb");
        assert_eq!(json["usb_dp_v"], 0.6);

        let back: MeasurementRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
