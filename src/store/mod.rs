//! # Table Store
//!
//! The binary table storage capability the writer and reader are built on:
//! create a table with named, typed columns; write or read a rectangular slice of
//! a column; move to the next table of a container. The traits are the seam; the
//! shipped implementation keeps each table as a Parquet file inside a ZIP container.
//!
//! ## Container Structure
//!
//! ```text
//! SURVEY_SPEC.SNPACK
//! ├── mimetype                          # "application/vnd.snpack" (stored, first)
//! ├── metadata.json                     # global metadata keys
//! └── tables/
//!     ├── 00_SPECTRO_LAMINDEX.parquet
//!     ├── 01_SPECTRO_HEADER.parquet
//!     └── 02_SPECTRO_FLUX.parquet
//! ```
//!
//! Rows and columns are 1-based throughout this module, matching the column
//! numbers handed out by [`crate::schema::ColumnRegistry`].

mod column_data;
mod container_reader;
mod container_writer;
mod error;
pub mod marshal;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::ColumnDescriptor;

pub use column_data::ColumnData;
pub use container_reader::ContainerReader;
pub use container_writer::{ContainerStats, ContainerWriter, StagedTable};
pub use error::StoreError;

/// Value of a global metadata key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Integer key
    Int(i64),
    /// Floating-point key
    Float(f64),
    /// String key
    Text(String),
}

impl MetaValue {
    /// Integer value; floats are truncated and numeric strings parsed
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Int(v) => Some(*v),
            MetaValue::Float(v) => Some(*v as i64),
            MetaValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// String value, only for string keys
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Int(v) => write!(f, "{}", v),
            MetaValue::Float(v) => write!(f, "{}", v),
            MetaValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<i32> for MetaValue {
    fn from(v: i32) -> Self {
        MetaValue::Int(i64::from(v))
    }
}

impl From<usize> for MetaValue {
    fn from(v: usize) -> Self {
        MetaValue::Int(v as i64)
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Int(i64::from(v))
    }
}

impl From<f32> for MetaValue {
    fn from(v: f32) -> Self {
        MetaValue::Float(f64::from(v))
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Text(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Text(v)
    }
}

/// Inclusive, 1-based range of rows owned by one record in another table.
///
/// An empty range has `end == start - 1`, so `start` still names the row the
/// block would have begun at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRange {
    /// First row
    pub start: usize,
    /// Last row
    pub end: usize,
}

impl RowRange {
    /// `len` rows beginning at `start`
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            end: (start + len).saturating_sub(1),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    /// Whether the range holds no row
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows in order
    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Global metadata keys of a container
pub type GlobalKeys = BTreeMap<String, MetaValue>;

/// Write half of a table container.
///
/// Writes always go to the current table, which is the one created last.
pub trait TableSink {
    /// Set a global metadata key
    fn set_key(&mut self, key: &str, value: MetaValue);

    /// Finalize a named, empty table with these columns and make it current
    fn create_table(&mut self, name: &str, columns: &[ColumnDescriptor])
        -> Result<(), StoreError>;

    /// Write a slice of one column of the current table, starting at `first_row`
    fn write_column(
        &mut self,
        column: usize,
        first_row: usize,
        data: ColumnData,
    ) -> Result<(), StoreError>;
}

/// Read half of a table container.
pub trait TableSource {
    /// Global metadata keys
    fn global_keys(&self) -> &GlobalKeys;

    /// Number of tables in the container
    fn table_count(&self) -> usize;

    /// Select a table by 0-based position
    fn move_to_table(&mut self, index: usize) -> Result<(), StoreError>;

    /// 0-based position of the current table
    fn current_table(&self) -> Option<usize>;

    /// Select the table after the current one
    fn next_table(&mut self) -> Result<(), StoreError> {
        let next = self.current_table().map_or(0, |i| i + 1);
        self.move_to_table(next)
    }

    /// Name of the current table
    fn table_name(&self) -> Result<&str, StoreError>;

    /// Rows in the current table
    fn num_rows(&self) -> Result<usize, StoreError>;

    /// Columns in the current table
    fn num_columns(&self) -> Result<usize, StoreError>;

    /// Stored name of a 1-based column
    fn column_name(&self, column: usize) -> Result<&str, StoreError>;

    /// Stored type-form string of a 1-based column
    fn column_form(&self, column: usize) -> Result<String, StoreError>;

    /// Read `nrows` values of a column starting at 1-based `first_row`
    fn read_column(
        &self,
        column: usize,
        first_row: usize,
        nrows: usize,
    ) -> Result<ColumnData, StoreError>;
}
