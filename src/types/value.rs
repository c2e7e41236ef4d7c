use crate::error::{DFError, Result};
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Semantic kind of a decoded field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    Text,
}

/// A decoded field value.
///
/// Integers keep their signedness so that 64-bit unsigned fields survive
/// decoding without wrapping. Values are immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum TypedValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl TypedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Int(_) | TypedValue::UInt(_) => ValueKind::Integer,
            TypedValue::Float(_) => ValueKind::Float,
            TypedValue::Text(_) => ValueKind::Text,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind() {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
        }
    }

    fn mismatch(&self, expected: &'static str) -> DFError {
        DFError::TypeMismatch {
            expected,
            found: self.kind_name(),
        }
    }

    /// Signed view. Floats truncate toward zero; unsigned values must fit.
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            TypedValue::Int(v) => Ok(*v),
            TypedValue::UInt(v) => i64::try_from(*v).map_err(|_| self.mismatch("i64")),
            TypedValue::Float(v) if v.is_finite() => Ok(*v as i64),
            _ => Err(self.mismatch("integer")),
        }
    }

    /// Unsigned view. Negative values are rejected.
    pub fn as_u64(&self) -> Result<u64> {
        match self {
            TypedValue::UInt(v) => Ok(*v),
            TypedValue::Int(v) => u64::try_from(*v).map_err(|_| self.mismatch("u64")),
            TypedValue::Float(v) if v.is_finite() && *v >= 0.0 => Ok(*v as u64),
            _ => Err(self.mismatch("unsigned integer")),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            TypedValue::Int(v) => Ok(*v as f64),
            TypedValue::UInt(v) => Ok(*v as f64),
            TypedValue::Float(v) => Ok(*v),
            TypedValue::Text(_) => Err(self.mismatch("float")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            TypedValue::Text(s) => Ok(s),
            _ => Err(self.mismatch("text")),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Int(v) => write!(f, "{}", v),
            TypedValue::UInt(v) => write!(f, "{}", v),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        TypedValue::Int(v)
    }
}

impl From<u64> for TypedValue {
    fn from(v: u64) -> Self {
        TypedValue::UInt(v)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        TypedValue::Float(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::Text(v.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        TypedValue::Text(v)
    }
}
