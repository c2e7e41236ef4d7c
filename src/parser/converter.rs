//! Per-field type converters
//!
//! Every column of a DataFlash format is tagged with one type character.
//! The character selects a converter from a fixed catalogue; the converter
//! knows how many bytes the column occupies in a binary frame and how to
//! turn either those bytes or a text field into a [`TypedValue`].

use crate::error::{DFError, Result};
use crate::parser::helpers::{le_to_i64, le_to_u64, nul_terminated};
use crate::parser::stream::DFDataStream;
use crate::types::TypedValue;
use crate::vehicle::{format_mode, VehicleType};

/// Scale applied by the `c`/`C`/`e`/`E` centi-unit types
pub const CENTI_SCALE: f64 = 0.01;
/// Scale applied to `L` latitude/longitude fields
pub const LATLON_SCALE: f64 = 1e-7;

/// Decoding strategy for one type character
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeConverter {
    Integer { width: usize, signed: bool },
    Scaled { width: usize, signed: bool, scale: f64 },
    Float32,
    Float64,
    FixedString { len: usize },
    Mode,
}

const fn int(width: usize, signed: bool) -> TypeConverter {
    TypeConverter::Integer { width, signed }
}

const fn scaled(width: usize, signed: bool, scale: f64) -> TypeConverter {
    TypeConverter::Scaled {
        width,
        signed,
        scale,
    }
}

/// The converter catalogue, keyed by type character
pub const CATALOGUE: &[(char, TypeConverter)] = &[
    ('b', int(1, true)),
    ('B', int(1, false)),
    ('h', int(2, true)),
    ('H', int(2, false)),
    ('i', int(4, true)),
    ('I', int(4, false)),
    ('q', int(8, true)),
    ('Q', int(8, false)),
    ('f', TypeConverter::Float32),
    ('d', TypeConverter::Float64),
    ('c', scaled(2, true, CENTI_SCALE)),
    ('C', scaled(2, false, CENTI_SCALE)),
    ('e', scaled(4, true, CENTI_SCALE)),
    ('E', scaled(4, false, CENTI_SCALE)),
    ('L', scaled(4, true, LATLON_SCALE)),
    ('n', TypeConverter::FixedString { len: 4 }),
    ('N', TypeConverter::FixedString { len: 16 }),
    ('Z', TypeConverter::FixedString { len: 64 }),
    ('M', TypeConverter::Mode),
];

impl TypeConverter {
    /// Look up the converter for a type character
    pub fn for_code(code: char) -> Result<TypeConverter> {
        CATALOGUE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, converter)| *converter)
            .ok_or(DFError::UnknownTypeCode(code))
    }

    /// Number of bytes this converter consumes from a binary frame
    pub fn width(&self) -> usize {
        match self {
            TypeConverter::Integer { width, .. } | TypeConverter::Scaled { width, .. } => *width,
            TypeConverter::Float32 => 4,
            TypeConverter::Float64 => 8,
            TypeConverter::FixedString { len } => *len,
            TypeConverter::Mode => 1,
        }
    }

    /// Parse a trimmed text field
    pub fn from_text(&self, text: &str, vehicle: Option<VehicleType>) -> Result<TypedValue> {
        match *self {
            TypeConverter::Integer { width, signed } => parse_int(text, width, signed),
            TypeConverter::Scaled { .. } | TypeConverter::Float32 | TypeConverter::Float64 => text
                .parse::<f64>()
                .map(TypedValue::Float)
                .map_err(|_| {
                    DFError::MalformedRecord(format!("bad floating point literal '{}'", text))
                }),
            TypeConverter::FixedString { .. } => Ok(TypedValue::Text(text.to_string())),
            TypeConverter::Mode => Ok(match text.parse::<u8>() {
                Ok(mode) => TypedValue::Text(format_mode(vehicle, mode)),
                Err(_) => TypedValue::Text(text.to_string()),
            }),
        }
    }

    /// Decode a field from exactly `self.width()` bytes
    pub fn from_bytes(&self, bytes: &[u8], vehicle: Option<VehicleType>) -> TypedValue {
        match *self {
            TypeConverter::Integer { signed: true, .. } => TypedValue::Int(le_to_i64(bytes)),
            TypeConverter::Integer { signed: false, .. } => TypedValue::UInt(le_to_u64(bytes)),
            TypeConverter::Scaled { signed, scale, .. } => {
                // integer first, then scale
                let raw = if signed {
                    le_to_i64(bytes) as f64
                } else {
                    le_to_u64(bytes) as f64
                };
                TypedValue::Float(raw * scale)
            }
            TypeConverter::Float32 => {
                TypedValue::Float(f32::from_bits(le_to_u64(bytes) as u32) as f64)
            }
            TypeConverter::Float64 => TypedValue::Float(f64::from_bits(le_to_u64(bytes))),
            TypeConverter::FixedString { .. } => TypedValue::Text(nul_terminated(bytes)),
            TypeConverter::Mode => TypedValue::Text(format_mode(vehicle, bytes[0])),
        }
    }

    /// Read one field from the stream, returning the value and bytes consumed
    pub fn from_binary(
        &self,
        stream: &mut DFDataStream,
        vehicle: Option<VehicleType>,
    ) -> Result<(TypedValue, usize)> {
        let width = self.width();
        let bytes = stream.read_bytes(width)?;
        Ok((self.from_bytes(bytes, vehicle), width))
    }
}

fn parse_int(text: &str, width: usize, signed: bool) -> Result<TypedValue> {
    let parsed = match (width, signed) {
        (1, true) => text.parse::<i8>().map(|v| TypedValue::Int(v as i64)),
        (1, false) => text.parse::<u8>().map(|v| TypedValue::UInt(v as u64)),
        (2, true) => text.parse::<i16>().map(|v| TypedValue::Int(v as i64)),
        (2, false) => text.parse::<u16>().map(|v| TypedValue::UInt(v as u64)),
        (4, true) => text.parse::<i32>().map(|v| TypedValue::Int(v as i64)),
        (4, false) => text.parse::<u32>().map(|v| TypedValue::UInt(v as u64)),
        (_, true) => text.parse::<i64>().map(TypedValue::Int),
        (_, false) => text.parse::<u64>().map(TypedValue::UInt),
    };
    parsed.map_err(|_| {
        DFError::MalformedRecord(format!(
            "bad {}-byte {} integer literal '{}'",
            width,
            if signed { "signed" } else { "unsigned" },
            text
        ))
    })
}
