//! Read-side bulk loader.
//!
//! Buffers are column-major, grouped by type tag and 1-based: row 0 of every
//! buffer is an unused placeholder so that store rows index them directly.

use crate::record::Value;
use crate::schema::{TableKind, TypeTag};
use crate::store::{marshal, ColumnData, RowRange, StoreError, TableSource};

use super::{ColumnIndex, ReadError};

/// Column buffers of one table kind.
#[derive(Debug)]
pub struct TableBuffers {
    kind: TableKind,
    allocated_len: usize,
    loaded: usize,
    by_tag: [Vec<ColumnData>; TypeTag::COUNT],
}

impl TableBuffers {
    /// Unallocated buffers
    pub fn new(kind: TableKind) -> Self {
        Self {
            kind,
            allocated_len: 0,
            loaded: 0,
            by_tag: Default::default(),
        }
    }

    /// Buffer length including the placeholder row; zero when nothing is allocated
    pub fn allocated_len(&self) -> usize {
        self.allocated_len
    }

    /// Rows filled by the last [`TableBuffers::fill`]
    pub fn loaded_rows(&self) -> usize {
        self.loaded
    }

    /// Allocate `capacity + 1` slots for every column of `index`
    pub fn allocate(&mut self, index: &ColumnIndex, capacity: usize) -> Result<(), ReadError> {
        if self.allocated_len != 0 {
            return Err(ReadError::BuffersInUse { table: self.kind });
        }
        let len = capacity + 1;
        self.by_tag = Default::default();
        // columns arrive in order, so each push lands on the column's slot
        for (_, _, tag) in index.iter() {
            self.by_tag[tag.ordinal()].push(ColumnData::zeros(tag, len));
        }
        self.allocated_len = len;
        self.loaded = 0;
        log::debug!("allocated {} buffers for {} rows", self.kind, capacity);
        Ok(())
    }

    /// Read `rows` of every column from the store into buffer rows `1..=rows.len()`,
    /// one request per column
    pub fn fill<S: TableSource + ?Sized>(
        &mut self,
        source: &S,
        index: &ColumnIndex,
        rows: RowRange,
    ) -> Result<(), ReadError> {
        let capacity = self.allocated_len.saturating_sub(1);
        if rows.len() > capacity {
            return Err(StoreError::RowOutOfRange {
                table: self.kind.to_string(),
                first_row: rows.start,
                nrows: rows.len(),
                num_rows: capacity,
            }
            .into());
        }
        for (column, _, tag) in index.iter() {
            let mut data = ColumnData::zeros(tag, 1);
            let appended = if rows.is_empty() {
                Ok(())
            } else {
                data.append(marshal::read_values(source, column, tag, rows)?)
            };
            if appended.is_err()
                || data
                    .append(ColumnData::zeros(tag, capacity - rows.len()))
                    .is_err()
            {
                return Err(ReadError::CorruptColumn {
                    table: self.kind,
                    column,
                    form: tag.form(),
                });
            }
            let slot = index.slot_of(column).unwrap_or_default();
            if let Some(buffer) = self.by_tag[tag.ordinal()].get_mut(slot) {
                *buffer = data;
            }
        }
        self.loaded = rows.len();
        Ok(())
    }

    /// Value at a 1-based buffer row
    pub fn value(&self, index: &ColumnIndex, column: usize, row: usize) -> Option<Value> {
        if row == 0 || row > self.loaded {
            return None;
        }
        let tag = index.tag(column)?;
        let slot = index.slot_of(column)?;
        self.by_tag[tag.ordinal()].get(slot)?.get(row)
    }

    /// Rows `1..=loaded` of a column
    pub fn column(&self, index: &ColumnIndex, column: usize) -> Option<ColumnData> {
        let tag = index.tag(column)?;
        let slot = index.slot_of(column)?;
        let mut data = self.by_tag[tag.ordinal()].get(slot)?.clone();
        let _ = data.take_front(1);
        Some(data.take_front(self.loaded))
    }

    /// Release every buffer; a no-op when nothing is allocated
    pub fn free(&mut self) {
        if self.allocated_len == 0 {
            return;
        }
        self.by_tag = Default::default();
        self.allocated_len = 0;
        self.loaded = 0;
        log::debug!("freed {} buffers", self.kind);
    }
}
