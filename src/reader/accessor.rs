//! Lookup cache and epoch mask behind the generic parameter accessor.

use std::collections::HashMap;

use crate::record::Value;
use crate::schema::{TableKind, TypeTag, MAX_EPOCHS};
use crate::store::marshal;

use super::{ColumnIndex, ReadError, SnPackReader};

/// Outcome of a parameter read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadCount {
    /// No column of that name in the open partition
    NotFound,
    /// The column exists but no epoch was kept, either because the epoch mask
    /// excluded every epoch or because the record has none
    AllMasked,
    /// Number of values returned
    Values(usize),
}

impl ReadCount {
    /// Sentinel of [`ReadCount::AllMasked`] in [`ReadCount::count`]
    pub const ALL_MASKED: i32 = -9;

    /// Count as a signed number: 0 when not found, -9 when all epochs were masked
    pub fn count(self) -> i32 {
        match self {
            ReadCount::NotFound => 0,
            ReadCount::AllMasked => Self::ALL_MASKED,
            ReadCount::Values(n) => n as i32,
        }
    }

    /// Whether the parameter exists
    pub fn is_found(self) -> bool {
        !matches!(self, ReadCount::NotFound)
    }
}

/// Where a parameter name resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No such column
    NotFound,
    /// A column of one of the tables
    Column {
        /// Header or photometry
        table: TableKind,
        /// 1-based column
        column: usize,
        /// Value type
        tag: TypeTag,
    },
}

/// Resolve-once memo of parameter names, keyed by partition.
///
/// The first request for a name in a partition searches the header columns, then
/// the photometry columns; later requests are answered from the memo, including
/// negative answers. Moving to another partition clears the memo.
#[derive(Debug, Default)]
pub struct ParamCache {
    partition: usize,
    entries: HashMap<String, Resolution>,
    searches: usize,
}

impl ParamCache {
    /// Forget every resolution and bind the cache to `partition`
    pub fn reset(&mut self, partition: usize) {
        if !self.entries.is_empty() {
            log::debug!("clearing {} cached parameter lookups", self.entries.len());
        }
        self.entries.clear();
        self.partition = partition;
    }

    /// Partition the cached resolutions belong to
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Name searches performed so far, over the cache's lifetime
    pub fn searches(&self) -> usize {
        self.searches
    }

    /// Resolution of `name` in `partition`, searching only on first use
    pub fn resolve(
        &mut self,
        partition: usize,
        name: &str,
        header: &ColumnIndex,
        photometry: &ColumnIndex,
    ) -> Resolution {
        if partition != self.partition {
            self.reset(partition);
        }
        if let Some(found) = self.entries.get(name) {
            return *found;
        }

        self.searches += 1;
        let found = [header, photometry]
            .into_iter()
            .find_map(|index| {
                let column = index.find(name)?;
                Some(Resolution::Column {
                    table: index.kind(),
                    column,
                    tag: index.tag(column)?,
                })
            })
            .unwrap_or(Resolution::NotFound);
        log::debug!("resolved {} in partition {}: {:?}", name, partition, found);
        self.entries.insert(name.to_string(), found);
        found
    }
}

/// Inclusion mask over the epochs of each queried record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpochMask {
    keep: Option<Vec<bool>>,
}

impl EpochMask {
    /// Set the mask from 0/1 flags; an empty slice removes it
    pub fn set(&mut self, flags: &[i32]) -> Result<(), ReadError> {
        if flags.len() > MAX_EPOCHS {
            return Err(ReadError::MaskTooLong {
                len: flags.len(),
                max: MAX_EPOCHS,
            });
        }
        if let Some((index, value)) = flags.iter().enumerate().find(|(_, v)| !matches!(v, 0 | 1)) {
            return Err(ReadError::InvalidMask {
                index,
                value: *value,
            });
        }
        self.keep = (!flags.is_empty()).then(|| flags.iter().map(|v| *v == 1).collect());
        Ok(())
    }

    /// Remove the mask
    pub fn clear(&mut self) {
        self.keep = None;
    }

    /// Whether a mask is set
    pub fn is_set(&self) -> bool {
        self.keep.is_some()
    }

    /// Per-epoch inclusion flags for a record with `epochs` epochs
    pub fn flags(&self, epochs: usize, name: &str, isn: usize) -> Result<Vec<bool>, ReadError> {
        match &self.keep {
            None => Ok(vec![true; epochs]),
            Some(keep) if keep.len() == epochs => Ok(keep.clone()),
            Some(keep) => Err(ReadError::MaskSizeMismatch {
                name: name.to_string(),
                isn,
                mask: keep.len(),
                epochs,
            }),
        }
    }
}

/// Values of one parameter read, before conversion to the caller's type
struct Fetched {
    count: ReadCount,
    table: Option<TableKind>,
    values: Vec<Value>,
}

impl SnPackReader {
    /// Set the epoch mask applied to photometry parameters; an empty slice removes it
    pub fn set_epoch_mask(&mut self, flags: &[i32]) -> Result<(), ReadError> {
        self.mask.set(flags)
    }

    /// Remove the epoch mask
    pub fn clear_epoch_mask(&mut self) {
        self.mask.clear();
    }

    /// Values of a parameter for a 1-based record index.
    ///
    /// A header parameter yields one value. A photometry parameter yields one value
    /// per epoch kept by the epoch mask, in epoch order.
    pub fn read_param(
        &mut self,
        isn: usize,
        name: &str,
    ) -> Result<(ReadCount, Vec<Value>), ReadError> {
        let fetched = self.fetch(isn, name)?;
        Ok((fetched.count, fetched.values))
    }

    fn fetch(&mut self, isn: usize, name: &str) -> Result<Fetched, ReadError> {
        let local = self.ensure_partition(isn)?;
        let Some(part) = self.current.as_ref() else {
            return Err(ReadError::RecordOutOfRange {
                isn,
                total: self.partitions.total(),
            });
        };

        match self
            .cache
            .resolve(part.number, name, &part.header_index, &part.phot_index)
        {
            Resolution::NotFound => Ok(Fetched {
                count: ReadCount::NotFound,
                table: None,
                values: Vec::new(),
            }),
            Resolution::Column {
                table: TableKind::Header,
                column,
                ..
            } => {
                let value = self
                    .header_buf
                    .value(&part.header_index, column, local)
                    .ok_or(ReadError::RecordOutOfRange {
                        isn,
                        total: self.partitions.total(),
                    })?;
                Ok(Fetched {
                    count: ReadCount::Values(1),
                    table: Some(TableKind::Header),
                    values: vec![value],
                })
            }
            Resolution::Column { table, column, tag } => {
                let block = part.epoch_block(&self.header_buf, local)?;
                let keep = self.mask.flags(block.len(), name, isn)?;
                // no epochs counts as every epoch masked
                if block.is_empty() {
                    return Ok(Fetched {
                        count: ReadCount::AllMasked,
                        table: Some(table),
                        values: Vec::new(),
                    });
                }

                let data = marshal::read_values(&part.phot, column, tag, block)?;
                let values: Vec<Value> = keep
                    .iter()
                    .enumerate()
                    .filter(|(_, keep)| **keep)
                    .filter_map(|(i, _)| data.get(i))
                    .collect();
                let count = if values.is_empty() {
                    ReadCount::AllMasked
                } else {
                    ReadCount::Values(values.len())
                };
                Ok(Fetched {
                    count,
                    table: Some(table),
                    values,
                })
            }
        }
    }

    fn read_numeric<T>(
        &mut self,
        isn: usize,
        name: &str,
        out: &mut Vec<T>,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<ReadCount, ReadError> {
        out.clear();
        let fetched = self.fetch(isn, name)?;
        for value in &fetched.values {
            let converted = convert(value).ok_or_else(|| ReadError::NotNumeric {
                name: name.to_string(),
                table: fetched.table.unwrap_or(TableKind::Header),
            })?;
            out.push(converted);
        }
        Ok(fetched.count)
    }

    /// [`SnPackReader::read_param`] converted to `f64`
    pub fn read_f64(
        &mut self,
        isn: usize,
        name: &str,
        out: &mut Vec<f64>,
    ) -> Result<ReadCount, ReadError> {
        self.read_numeric(isn, name, out, Value::as_f64)
    }

    /// [`SnPackReader::read_param`] converted to `f32`
    pub fn read_f32(
        &mut self,
        isn: usize,
        name: &str,
        out: &mut Vec<f32>,
    ) -> Result<ReadCount, ReadError> {
        self.read_numeric(isn, name, out, |v| v.as_f64().map(|x| x as f32))
    }

    /// [`SnPackReader::read_param`] converted to `i64`; floats are truncated
    pub fn read_i64(
        &mut self,
        isn: usize,
        name: &str,
        out: &mut Vec<i64>,
    ) -> Result<ReadCount, ReadError> {
        self.read_numeric(isn, name, out, Value::as_i64)
    }

    /// [`SnPackReader::read_param`] converted to `i32`; floats are truncated
    pub fn read_i32(
        &mut self,
        isn: usize,
        name: &str,
        out: &mut Vec<i32>,
    ) -> Result<ReadCount, ReadError> {
        self.read_numeric(isn, name, out, |v| v.as_i64().map(|x| x as i32))
    }

    /// [`SnPackReader::read_param`] converted to `i16`; floats are truncated
    pub fn read_i16(
        &mut self,
        isn: usize,
        name: &str,
        out: &mut Vec<i16>,
    ) -> Result<ReadCount, ReadError> {
        self.read_numeric(isn, name, out, |v| v.as_i64().map(|x| x as i16))
    }

    /// [`SnPackReader::read_param`] joined into one comma-separated string
    pub fn read_str(
        &mut self,
        isn: usize,
        name: &str,
        out: &mut String,
    ) -> Result<ReadCount, ReadError> {
        out.clear();
        let fetched = self.fetch(isn, name)?;
        for (i, value) in fetched.values.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&value.to_string());
        }
        Ok(fetched.count)
    }
}
