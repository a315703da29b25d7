use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;

use crate::record::Value;
use crate::schema::TypeTag;

use super::StoreError;

/// A contiguous slice of one column, typed by storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Strings
    Text(Vec<String>),
    /// 16-bit integers
    I16(Vec<i16>),
    /// 32-bit integers
    I32(Vec<i32>),
    /// 64-bit integers
    I64(Vec<i64>),
    /// 32-bit floats
    F32(Vec<f32>),
    /// 64-bit floats
    F64(Vec<f64>),
}

impl ColumnData {
    /// Empty slice of a tag's storage class
    pub fn with_capacity(tag: TypeTag, capacity: usize) -> Self {
        match tag {
            TypeTag::FixedString(_) => ColumnData::Text(Vec::with_capacity(capacity)),
            TypeTag::I16 => ColumnData::I16(Vec::with_capacity(capacity)),
            TypeTag::I32 => ColumnData::I32(Vec::with_capacity(capacity)),
            TypeTag::I64 => ColumnData::I64(Vec::with_capacity(capacity)),
            TypeTag::F32 => ColumnData::F32(Vec::with_capacity(capacity)),
            TypeTag::F64 => ColumnData::F64(Vec::with_capacity(capacity)),
        }
    }

    /// `len` zeros (or empty strings) of a tag's storage class
    pub fn zeros(tag: TypeTag, len: usize) -> Self {
        match tag {
            TypeTag::FixedString(_) => ColumnData::Text(vec![String::new(); len]),
            TypeTag::I16 => ColumnData::I16(vec![0; len]),
            TypeTag::I32 => ColumnData::I32(vec![0; len]),
            TypeTag::I64 => ColumnData::I64(vec![0; len]),
            TypeTag::F32 => ColumnData::F32(vec![0.0; len]),
            TypeTag::F64 => ColumnData::F64(vec![0.0; len]),
        }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::I16(v) => v.len(),
            ColumnData::I32(v) => v.len(),
            ColumnData::I64(v) => v.len(),
            ColumnData::F32(v) => v.len(),
            ColumnData::F64(v) => v.len(),
        }
    }

    /// Whether the slice holds no value
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether values of `tag` are stored in this class
    pub fn matches(&self, tag: TypeTag) -> bool {
        self.ordinal() == tag.ordinal()
    }

    fn ordinal(&self) -> usize {
        match self {
            ColumnData::Text(_) => 0,
            ColumnData::I16(_) => 1,
            ColumnData::I32(_) => 2,
            ColumnData::I64(_) => 3,
            ColumnData::F32(_) => 4,
            ColumnData::F64(_) => 5,
        }
    }

    /// Storage class name, for error messages
    pub fn class_name(&self) -> &'static str {
        match self {
            ColumnData::Text(_) => "Utf8",
            ColumnData::I16(_) => "Int16",
            ColumnData::I32(_) => "Int32",
            ColumnData::I64(_) => "Int64",
            ColumnData::F32(_) => "Float32",
            ColumnData::F64(_) => "Float64",
        }
    }

    /// Value at a 0-based position
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            ColumnData::Text(v) => v.get(index).map(|s| Value::Text(s.clone())),
            ColumnData::I16(v) => v.get(index).map(|x| Value::I16(*x)),
            ColumnData::I32(v) => v.get(index).map(|x| Value::I32(*x)),
            ColumnData::I64(v) => v.get(index).map(|x| Value::I64(*x)),
            ColumnData::F32(v) => v.get(index).map(|x| Value::F32(*x)),
            ColumnData::F64(v) => v.get(index).map(|x| Value::F64(*x)),
        }
    }

    /// Append one value; the classes must match
    pub(crate) fn push(&mut self, value: Value) -> bool {
        match (self, value) {
            (ColumnData::Text(v), Value::Text(x)) => v.push(x),
            (ColumnData::I16(v), Value::I16(x)) => v.push(x),
            (ColumnData::I32(v), Value::I32(x)) => v.push(x),
            (ColumnData::I64(v), Value::I64(x)) => v.push(x),
            (ColumnData::F32(v), Value::F32(x)) => v.push(x),
            (ColumnData::F64(v), Value::F64(x)) => v.push(x),
            _ => return false,
        }
        true
    }

    /// Append another slice of the same class
    pub fn append(&mut self, other: ColumnData) -> Result<(), ColumnData> {
        match (self, other) {
            (ColumnData::Text(a), ColumnData::Text(b)) => a.extend(b),
            (ColumnData::I16(a), ColumnData::I16(b)) => a.extend(b),
            (ColumnData::I32(a), ColumnData::I32(b)) => a.extend(b),
            (ColumnData::I64(a), ColumnData::I64(b)) => a.extend(b),
            (ColumnData::F32(a), ColumnData::F32(b)) => a.extend(b),
            (ColumnData::F64(a), ColumnData::F64(b)) => a.extend(b),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    /// Remove and return the first `n` values
    pub(crate) fn take_front(&mut self, n: usize) -> ColumnData {
        fn split<T>(v: &mut Vec<T>, n: usize) -> Vec<T> {
            let rest = v.split_off(n.min(v.len()));
            std::mem::replace(v, rest)
        }
        match self {
            ColumnData::Text(v) => ColumnData::Text(split(v, n)),
            ColumnData::I16(v) => ColumnData::I16(split(v, n)),
            ColumnData::I32(v) => ColumnData::I32(split(v, n)),
            ColumnData::I64(v) => ColumnData::I64(split(v, n)),
            ColumnData::F32(v) => ColumnData::F32(split(v, n)),
            ColumnData::F64(v) => ColumnData::F64(split(v, n)),
        }
    }

    /// Values widened to `f64`; strings yield `None`
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            ColumnData::Text(_) => None,
            ColumnData::I16(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
            ColumnData::I32(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
            ColumnData::I64(v) => Some(v.iter().map(|x| *x as f64).collect()),
            ColumnData::F32(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
            ColumnData::F64(v) => Some(v.clone()),
        }
    }

    /// Convert to an Arrow array
    pub fn to_array(&self) -> ArrayRef {
        match self {
            ColumnData::Text(v) => Arc::new(StringArray::from_iter_values(v.iter())),
            ColumnData::I16(v) => Arc::new(Int16Array::from(v.clone())),
            ColumnData::I32(v) => Arc::new(Int32Array::from(v.clone())),
            ColumnData::I64(v) => Arc::new(Int64Array::from(v.clone())),
            ColumnData::F32(v) => Arc::new(Float32Array::from(v.clone())),
            ColumnData::F64(v) => Arc::new(Float64Array::from(v.clone())),
        }
    }

    /// Convert an Arrow array; nulls read back as zero or the empty string
    pub fn from_array(array: &dyn Array) -> Result<Self, StoreError> {
        fn downcast<'a, T: 'static>(array: &'a dyn Array) -> Result<&'a T, StoreError> {
            array
                .as_any()
                .downcast_ref::<T>()
                .ok_or_else(|| StoreError::TypeMismatch {
                    table: String::new(),
                    column: String::new(),
                    expected: std::any::type_name::<T>().to_string(),
                    found: array.data_type().to_string(),
                })
        }

        let data = match array.data_type() {
            DataType::Utf8 => {
                let a = downcast::<StringArray>(array)?;
                ColumnData::Text(
                    (0..a.len())
                        .map(|i| if a.is_null(i) { String::new() } else { a.value(i).to_string() })
                        .collect(),
                )
            }
            DataType::LargeUtf8 => {
                let a = downcast::<LargeStringArray>(array)?;
                ColumnData::Text(
                    (0..a.len())
                        .map(|i| if a.is_null(i) { String::new() } else { a.value(i).to_string() })
                        .collect(),
                )
            }
            DataType::Int16 => ColumnData::I16(downcast::<Int16Array>(array)?.values().to_vec()),
            DataType::Int32 => ColumnData::I32(downcast::<Int32Array>(array)?.values().to_vec()),
            DataType::Int64 => ColumnData::I64(downcast::<Int64Array>(array)?.values().to_vec()),
            DataType::Float32 => {
                ColumnData::F32(downcast::<Float32Array>(array)?.values().to_vec())
            }
            DataType::Float64 => {
                ColumnData::F64(downcast::<Float64Array>(array)?.values().to_vec())
            }
            other => {
                return Err(StoreError::TypeMismatch {
                    table: String::new(),
                    column: String::new(),
                    expected: "Utf8, Int16, Int32, Int64, Float32 or Float64".to_string(),
                    found: other.to_string(),
                })
            }
        };
        Ok(data)
    }
}
