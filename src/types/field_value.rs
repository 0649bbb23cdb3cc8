//! Big-endian field reads from frame bytes

use crate::{MeterError, Result};

/// Trait for unsigned integers that can be read from a frame at a fixed offset.
///
/// All instrument layouts are big-endian. Reads are bounds-checked and never
/// panic on short frames.
pub trait FieldValue: Sized {
    /// Width of the encoded value in bytes.
    const WIDTH: usize;

    /// Parse this value from `data` starting at `offset`.
    fn read_at(data: &[u8], offset: usize) -> Result<Self>;
}

fn window<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(MeterError::OutOfBounds { offset, width: N, len: data.len() })
}

impl FieldValue for u8 {
    const WIDTH: usize = 1;

    fn read_at(data: &[u8], offset: usize) -> Result<Self> {
        let [byte] = window::<1>(data, offset)?;
        Ok(byte)
    }
}

impl FieldValue for u16 {
    const WIDTH: usize = 2;

    fn read_at(data: &[u8], offset: usize) -> Result<Self> {
        Ok(u16::from_be_bytes(window(data, offset)?))
    }
}

impl FieldValue for u32 {
    const WIDTH: usize = 4;

    fn read_at(data: &[u8], offset: usize) -> Result<Self> {
        Ok(u32::from_be_bytes(window(data, offset)?))
    }
}

/// 24-bit unsigned value read as three sequential bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct U24(pub u32);

impl FieldValue for U24 {
    const WIDTH: usize = 3;

    fn read_at(data: &[u8], offset: usize) -> Result<Self> {
        let [hi, mid, lo] = window::<3>(data, offset)?;
        Ok(U24(u32::from_be_bytes([0, hi, mid, lo])))
    }
}
