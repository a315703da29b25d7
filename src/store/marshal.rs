//! Typed value marshalling between records and table columns.
//!
//! Every write and read of a single column goes through here, dispatched on the
//! column's [`TypeTag`]. Numeric values are coerced to the column's width; strings
//! longer than a fixed-width column are truncated.

use crate::record::Value;
use crate::schema::{ColumnDescriptor, TypeTag};

use super::{ColumnData, RowRange, StoreError, TableSink, TableSource};

/// Why a value cannot be stored in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// A string for a numeric column or a number for a string column
    WrongClass,
    /// An integer outside the range of the column's width
    OutOfRange(i64),
}

/// Convert a value to the storage class of `tag`.
///
/// Integers that do not fit the column's width are rejected rather than wrapped.
pub fn coerce(tag: TypeTag, value: &Value) -> Result<Value, Rejection> {
    let integer = || value.as_i64().ok_or(Rejection::WrongClass);
    let coerced = match tag {
        TypeTag::FixedString(width) => {
            let text = value.as_str().ok_or(Rejection::WrongClass)?;
            Value::Text(truncate(text, usize::from(width)).to_string())
        }
        TypeTag::I16 => {
            let n = integer()?;
            Value::I16(i16::try_from(n).map_err(|_| Rejection::OutOfRange(n))?)
        }
        TypeTag::I32 => {
            let n = integer()?;
            Value::I32(i32::try_from(n).map_err(|_| Rejection::OutOfRange(n))?)
        }
        TypeTag::I64 => Value::I64(integer()?),
        TypeTag::F32 => Value::F32(value.as_f64().ok_or(Rejection::WrongClass)? as f32),
        TypeTag::F64 => match value {
            // keep doubles bit-exact
            Value::F64(v) => Value::F64(*v),
            other => Value::F64(other.as_f64().ok_or(Rejection::WrongClass)?),
        },
    };
    Ok(coerced)
}

/// Longest prefix of `text` that fits `width` bytes without splitting a character.
/// A zero width means unbounded.
fn truncate(text: &str, width: usize) -> &str {
    if width == 0 || text.len() <= width {
        return text;
    }
    let mut end = width;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    log::warn!("truncating '{}' to {} bytes", text, width);
    &text[..end]
}

/// Encode one value for a column, reporting the column on failure
pub fn encode(table: &str, column: &ColumnDescriptor, value: &Value) -> Result<Value, StoreError> {
    coerce(column.tag, value).map_err(|rejection| match rejection {
        Rejection::WrongClass => StoreError::TypeMismatch {
            table: table.to_string(),
            column: column.name.clone(),
            expected: column.form(),
            found: value.natural_tag().form(),
        },
        Rejection::OutOfRange(value) => StoreError::ValueOutOfRange {
            table: table.to_string(),
            column: column.name.clone(),
            form: column.form(),
            value,
        },
    })
}

/// Write one value at a 1-based row of a column
pub fn write_value<S: TableSink + ?Sized>(
    sink: &mut S,
    table: &str,
    column: &ColumnDescriptor,
    row: usize,
    value: &Value,
) -> Result<(), StoreError> {
    let mut data = ColumnData::with_capacity(column.tag, 1);
    data.push(encode(table, column, value)?);
    sink.write_column(column.number, row, data)
}

/// Read a row range of a column, checking its storage class against `tag`
pub fn read_values<S: TableSource + ?Sized>(
    source: &S,
    column: usize,
    tag: TypeTag,
    rows: RowRange,
) -> Result<ColumnData, StoreError> {
    let data = source.read_column(column, rows.start, rows.len())?;
    if !data.matches(tag) {
        return Err(StoreError::TypeMismatch {
            table: source.table_name()?.to_string(),
            column: source.column_name(column)?.to_string(),
            expected: tag.form(),
            found: data.class_name().to_string(),
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion_follows_column_width() {
        assert_eq!(coerce(TypeTag::I16, &Value::I32(7)), Ok(Value::I16(7)));
        assert_eq!(coerce(TypeTag::F32, &Value::F64(0.5)), Ok(Value::F32(0.5)));
        assert_eq!(
            coerce(TypeTag::F64, &Value::F64(60000.123456789)),
            Ok(Value::F64(60000.123456789))
        );
        assert_eq!(coerce(TypeTag::I32, &Value::from("12")), Err(Rejection::WrongClass));
        assert_eq!(coerce(TypeTag::FixedString(4), &Value::I32(1)), Err(Rejection::WrongClass));
    }

    #[test]
    fn test_integers_outside_the_width_are_rejected() {
        assert_eq!(coerce(TypeTag::I16, &Value::I32(40_000)), Err(Rejection::OutOfRange(40_000)));
        assert_eq!(coerce(TypeTag::I16, &Value::I64(-32_768)), Ok(Value::I16(-32_768)));
        assert_eq!(
            coerce(TypeTag::I32, &Value::I64(1 << 40)),
            Err(Rejection::OutOfRange(1 << 40))
        );
        assert_eq!(coerce(TypeTag::I32, &Value::F64(3.9)), Ok(Value::I32(3)));

        let column = ColumnDescriptor::new("NOBS", TypeTag::I16, 1);
        match encode("HEADER", &column, &Value::I64(70_000)) {
            Err(StoreError::ValueOutOfRange { column, value, .. }) => {
                assert_eq!(column, "NOBS");
                assert_eq!(value, 70_000);
            }
            other => panic!("expected an out-of-range error, got {other:?}"),
        }
    }

    #[test]
    fn test_strings_are_truncated_to_width() {
        assert_eq!(
            coerce(TypeTag::FixedString(4), &Value::from("ABCDEFG")),
            Ok(Value::from("ABCD"))
        );
        assert_eq!(truncate("é", 1), "");
        assert_eq!(truncate("abc", 0), "abc");
    }

    #[test]
    fn test_write_value_checks_the_column() {
        use crate::store::ContainerWriter;
        use parquet::file::properties::WriterProperties;

        let mut sink = ContainerWriter::scratch(WriterProperties::default());
        let column = ColumnDescriptor::new("NOBS", TypeTag::I32, 1);
        sink.create_table("HEADER", std::slice::from_ref(&column)).unwrap();

        write_value(&mut sink, "HEADER", &column, 1, &Value::I64(4)).unwrap();
        assert_eq!(sink.current_rows(), 1);
        assert!(matches!(
            write_value(&mut sink, "HEADER", &column, 2, &Value::from("four")),
            Err(StoreError::TypeMismatch { .. })
        ));
    }
}
