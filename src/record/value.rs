use std::fmt;

use crate::schema::TypeTag;

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String value
    Text(String),
    /// 16-bit integer
    I16(i16),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
}

impl Value {
    /// Numeric value widened to `f64`; `None` for text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Text(_) => None,
            Value::I16(v) => Some(f64::from(*v)),
            Value::I32(v) => Some(f64::from(*v)),
            Value::I64(v) => Some(*v as f64),
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
        }
    }

    /// Numeric value as `i64`, truncating floats; `None` for text
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Text(_) => None,
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            Value::F32(v) => Some(*v as i64),
            Value::F64(v) => Some(*v as i64),
        }
    }

    /// String value; `None` for numbers
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Tag matching the value's own representation
    pub fn natural_tag(&self) -> TypeTag {
        match self {
            Value::Text(s) => TypeTag::FixedString(s.len().min(u16::MAX as usize) as u16),
            Value::I16(_) => TypeTag::I16,
            Value::I32(_) => TypeTag::I32,
            Value::I64(_) => TypeTag::I64,
            Value::F32(_) => TypeTag::F32,
            Value::F64(_) => TypeTag::F64,
        }
    }

    /// Zero (or the empty string) of a tag
    pub fn zero(tag: TypeTag) -> Self {
        match tag {
            TypeTag::FixedString(_) => Value::Text(String::new()),
            TypeTag::I16 => Value::I16(0),
            TypeTag::I32 => Value::I32(0),
            TypeTag::I64 => Value::I64(0),
            TypeTag::F32 => Value::F32(0.0),
            TypeTag::F64 => Value::F64(0.0),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}
