//! Fixed field layouts for decoding frames into physical quantities

use serde::Serialize;

use super::field_value::{FieldValue, U24};
use crate::Result;

/// Encoded width of a layout field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldWidth {
    U8,
    U16,
    U24,
    U32,
}

impl FieldWidth {
    /// Returns the size in bytes of this width.
    pub const fn size(&self) -> usize {
        match self {
            FieldWidth::U8 => u8::WIDTH,
            FieldWidth::U16 => u16::WIDTH,
            FieldWidth::U24 => U24::WIDTH,
            FieldWidth::U32 => u32::WIDTH,
        }
    }

    /// Read the raw unsigned value at `offset`.
    pub fn read(&self, data: &[u8], offset: usize) -> Result<u32> {
        match self {
            FieldWidth::U8 => u8::read_at(data, offset).map(u32::from),
            FieldWidth::U16 => u16::read_at(data, offset).map(u32::from),
            FieldWidth::U24 => U24::read_at(data, offset).map(|v| v.0),
            FieldWidth::U32 => u32::read_at(data, offset),
        }
    }
}

/// Power-of-ten scale applied to a raw field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scale {
    /// Raw value is already in the target unit
    Unit,
    /// Raw value is divided by the factor
    Div(u32),
    /// Raw value is multiplied by the factor
    Mul(u32),
}

impl Scale {
    pub fn apply(&self, raw: u32) -> f64 {
        let raw = f64::from(raw);
        match self {
            Scale::Unit => raw,
            Scale::Div(factor) => raw / f64::from(*factor),
            Scale::Mul(factor) => raw * f64::from(*factor),
        }
    }
}

/// A named field at a fixed byte offset within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldLayout {
    /// Field name as exposed on the decoded record
    pub name: &'static str,
    /// Byte offset within the logical frame
    pub offset: usize,
    /// Encoded width
    pub width: FieldWidth,
    /// Scale applied to produce the physical quantity
    pub scale: Scale,
}

impl FieldLayout {
    pub const fn new(name: &'static str, offset: usize, width: FieldWidth, scale: Scale) -> Self {
        Self { name, offset, width, scale }
    }

    /// First byte past the end of this field.
    pub const fn end(&self) -> usize {
        self.offset + self.width.size()
    }

    /// Read and scale this field from a frame.
    pub fn read(&self, data: &[u8]) -> Result<f64> {
        self.width.read(data, self.offset).map(|raw| self.scale.apply(raw))
    }
}

/// Read every field of a layout table in order.
pub fn read_fields<const N: usize>(data: &[u8], layout: &[FieldLayout; N]) -> Result<[f64; N]> {
    let mut values = [0.0; N];
    for (slot, field) in values.iter_mut().zip(layout) {
        *slot = field.read(data)?;
    }
    Ok(values)
}
