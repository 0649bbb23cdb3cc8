//! EEVBlog 121GW multimeter frame decoding

use tracing::debug;

use crate::Result;
use crate::types::{FieldValue, MultimeterRecord};

/// Offset of the packed serial number word.
pub const SERIAL_OFFSET: usize = 1;

/// Manufacture date and serial number unpacked from the serial word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialInfo {
    pub mfg_year: Option<u8>,
    pub mfg_month: u8,
    pub serial_number: Option<u32>,
}

/// Unpack a serial word laid out as the hex digits `YYMNNNNN`.
///
/// The month digit is read as hex. The year and serial fields are read as
/// decimal up to the first hex letter, so `1A` gives year 1; a field that
/// starts with a letter is `None`.
pub fn unpack_serial(word: u32) -> SerialInfo {
    let digits = format!("{word:08x}");
    SerialInfo {
        mfg_year: leading_decimal(&digits[..2]),
        // A single hex digit always parses
        mfg_month: u8::from_str_radix(&digits[2..3], 16).unwrap_or_default(),
        serial_number: leading_decimal(&digits[3..]),
    }
}

fn leading_decimal<T: std::str::FromStr>(digits: &str) -> Option<T> {
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse().ok()
}

fn read_record(frame: &[u8]) -> Result<MultimeterRecord> {
    let word = u32::read_at(frame, SERIAL_OFFSET)?;
    let serial = unpack_serial(word);
    if serial.mfg_year.is_none() || serial.serial_number.is_none() {
        debug!(
            word = format_args!("{word:#010x}"),
            "Serial word has a field without decimal digits"
        );
    }

    let main_mode_byte = u8::read_at(frame, 5)?;

    Ok(MultimeterRecord {
        mfg_year: serial.mfg_year,
        mfg_month: serial.mfg_month,
        serial_number: serial.serial_number,
        main_mode: main_mode_byte & 0x0F,
        main_range: u8::read_at(frame, 6)?,
        main_value: (u32::from(main_mode_byte & 0xC0) << 10) | u32::from(u16::read_at(frame, 7)?),
        sub_mode: u8::read_at(frame, 9)?,
        sub_range: u8::read_at(frame, 10)?,
        sub_value: u16::read_at(frame, 11)?,
        bar_status: u8::read_at(frame, 13)?,
        bar_value: u8::read_at(frame, 14)?,
        icon_status: [u8::read_at(frame, 15)?, u8::read_at(frame, 16)?, u8::read_at(frame, 17)?],
    })
}

/// Decode a validated multimeter frame.
///
/// The multimeter has no mode discriminant; every frame carries the same
/// fields. Only frames too short for the layout yield `None`.
pub fn decode_multimeter(frame: &[u8]) -> Option<MultimeterRecord> {
    match read_record(frame) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(error = %e, "Multimeter frame shorter than its layout");
            None
        }
    }
}
