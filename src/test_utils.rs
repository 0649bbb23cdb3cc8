//! Test utilities: frame builders and fixture lookup
//!
//! Shared by unit tests and the benchmarks. Builders produce byte-exact wire
//! payloads so tests can exercise the whole pipeline without hardware.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::protocol::{FIRST_CHUNK_LEN, FixedFrameSpec, PAIRED_FRAME_LEN, xor_checksum};

/// Error returned when a required fixture cannot be located.
#[derive(Debug, Clone)]
pub struct FixtureError {
    message: String,
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FixtureError {}

/// Resolve a file under `tests/fixtures`, failing if it does not exist.
pub fn require_fixture<P: AsRef<Path>>(name: P) -> Result<PathBuf, FixtureError> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name);
    if path.exists() {
        Ok(path)
    } else {
        Err(FixtureError { message: format!("Missing fixture: {}", path.display()) })
    }
}

/// A complete 19-byte multimeter frame.
///
/// `serial_word` is the packed `YYMNNNNN` serial, `main_value` the low 16 bits
/// of the main reading. Main mode is 3, everything else zero, and the trailing
/// byte makes the XOR of the frame zero.
pub fn multimeter_frame(serial_word: u32, main_value: u16) -> Vec<u8> {
    let spec = FixedFrameSpec::MULTIMETER;
    let mut frame = Vec::with_capacity(spec.frame_len);
    frame.push(spec.sentinel);
    frame.extend_from_slice(&serial_word.to_be_bytes());
    frame.push(0x03); // main mode
    frame.push(0x01); // main range
    frame.extend_from_slice(&main_value.to_be_bytes());
    frame.resize(spec.frame_len - 1, 0);
    frame.push(xor_checksum(&frame));
    frame
}

/// `count` back-to-back multimeter frames with increasing readings.
pub fn multimeter_stream(count: usize) -> Vec<u8> {
    (0..count).flat_map(|i| multimeter_frame(0x2171_2345, (i % 1000) as u16)).collect()
}

/// A stitched 36-byte energy meter frame with the given mode and raw voltage.
pub fn energy_meter_frame(mode: u8, voltage_raw: u32) -> [u8; PAIRED_FRAME_LEN] {
    let mut frame = [0u8; PAIRED_FRAME_LEN];
    frame[0] = 0xFF;
    frame[1] = 0x55;
    frame[2] = 0x01;
    frame[3] = mode;
    frame[4..7].copy_from_slice(&voltage_raw.to_be_bytes()[1..]);
    frame
}

/// The two notifications an energy meter sends for one reading.
pub fn energy_meter_chunks(mode: u8, voltage_raw: u32) -> (Vec<u8>, Vec<u8>) {
    let frame = energy_meter_frame(mode, voltage_raw);
    (frame[..FIRST_CHUNK_LEN].to_vec(), frame[FIRST_CHUNK_LEN..].to_vec())
}
