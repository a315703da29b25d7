//! # snpack Reader Module
//!
//! Reads runs of light curves spread over one or more partitions. A partition is
//! one `_HEAD` container plus its `_PHOT` sibling and, optionally, its `_SPEC`
//! sibling. Only one partition is open at a time; requesting a record of another
//! partition closes the current one first.
//!
//! ## Features
//!
//! - **Introspection**: column names and types are recovered from what is stored,
//!   so containers written with other column sets open alike
//! - **Bulk loading**: the header table of the open partition is loaded once
//! - **Parameter access**: any column by name, with a resolve-once lookup cache
//!   and an optional epoch mask
//! - **Events**: whole records, in the shape the writer consumes
//!
//! ## Example
//!
//! ```rust,no_run
//! use snpack::reader::{Prepared, ReaderConfig, SnPackReader};
//!
//! let Prepared::Ready(mut reader) = SnPackReader::prepare("run.LIST", ReaderConfig::default())? else {
//!     panic!("not an snpack list");
//! };
//!
//! let mut mjd = Vec::new();
//! for isn in 1..=reader.record_count() {
//!     let count = reader.read_f64(isn, "MJD", &mut mjd)?;
//!     println!("record {}: {} epochs", isn, count.count());
//! }
//! println!("{}", reader.stats());
//! # Ok::<(), snpack::reader::ReadError>(())
//! ```

mod accessor;
mod buffers;
mod config;
mod error;
mod event;
mod globals;
mod introspect;
mod open;
mod partition;
mod spectra;

#[cfg(test)]
mod tests;

use std::fmt;

pub use accessor::{EpochMask, ParamCache, ReadCount, Resolution};
pub use buffers::TableBuffers;
pub use config::ReaderConfig;
pub use error::ReadError;
pub use globals::GlobalInfo;
pub use introspect::ColumnIndex;
pub use open::Prepared;
pub use partition::{has_snpack_suffix, read_list_file, PartitionList};
pub use spectra::SpectrumSource;

use crate::schema::TableKind;
use crate::store::{MetaValue, TableSource};

use open::OpenPartition;

/// Access counters of a reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Partitions opened
    pub partition_opens: usize,
    /// Partitions closed
    pub partition_closes: usize,
    /// Parameter names searched for in the column lists
    pub name_searches: usize,
}

impl fmt::Display for ReadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} partition opens, {} closes, {} name searches",
            self.partition_opens, self.partition_closes, self.name_searches
        )
    }
}

/// Reader over the partitions of a run
pub struct SnPackReader {
    config: ReaderConfig,
    partitions: PartitionList,
    current: Option<OpenPartition>,
    header_buf: TableBuffers,
    phot_buf: TableBuffers,
    cache: ParamCache,
    mask: EpochMask,
    opens: usize,
    closes: usize,
}

impl SnPackReader {
    fn new(partitions: PartitionList, config: ReaderConfig) -> Self {
        Self {
            config,
            partitions,
            current: None,
            header_buf: TableBuffers::new(TableKind::Header),
            phot_buf: TableBuffers::new(TableKind::Photometry),
            cache: ParamCache::default(),
            mask: EpochMask::default(),
            opens: 0,
            closes: 0,
        }
    }

    /// Reader configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Partitions and their record counts
    pub fn partitions(&self) -> &PartitionList {
        &self.partitions
    }

    /// Records across every partition
    pub fn record_count(&self) -> usize {
        self.partitions.total()
    }

    /// 1-based number of the open partition
    pub fn current_partition(&self) -> Option<usize> {
        self.current.as_ref().map(|p| p.number)
    }

    /// Global keys of the open partition, parsed
    pub fn globals(&self) -> Option<&GlobalInfo> {
        self.current.as_ref().map(|p| &p.globals)
    }

    /// Header columns of the open partition
    pub fn header_columns(&self) -> Option<&ColumnIndex> {
        self.current.as_ref().map(|p| &p.header_index)
    }

    /// Photometry columns of the open partition
    pub fn photometry_columns(&self) -> Option<&ColumnIndex> {
        self.current.as_ref().map(|p| &p.phot_index)
    }

    /// Raw value of a global key of the open partition's header container
    pub fn read_global(&self, key: &str) -> Result<MetaValue, ReadError> {
        let part = self.current.as_ref().ok_or(ReadError::RecordOutOfRange {
            isn: 0,
            total: self.partitions.total(),
        })?;
        part.head
            .global_keys()
            .get(key)
            .cloned()
            .ok_or_else(|| ReadError::UnknownGlobalKey {
                key: key.to_string(),
                path: part.path().display().to_string(),
            })
    }

    /// Access counters
    pub fn stats(&self) -> ReadStats {
        ReadStats {
            partition_opens: self.opens,
            partition_closes: self.closes,
            name_searches: self.cache.searches(),
        }
    }

    /// Close the open partition, releasing its buffers
    pub fn close(mut self) -> ReadStats {
        self.close_partition();
        self.stats()
    }
}

impl fmt::Debug for SnPackReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnPackReader")
            .field("partitions", &self.partitions.len())
            .field("records", &self.partitions.total())
            .field("current", &self.current_partition())
            .field("mask", &self.mask)
            .finish()
    }
}
