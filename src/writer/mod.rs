//! # snpack Writer Module
//!
//! Produces the containers of one run from in-memory records.
//!
//! ## Design Principles
//!
//! 1. **One schema value per table**: columns are declared by evaluating the
//!    rules against the snapshot, and rows are filled by walking the same
//!    evaluated [`Schema`](crate::schema::Schema). Declaration and fill order
//!    cannot disagree.
//!
//! 2. **Row ranges as values**: appending a block returns the
//!    [`RowRange`](crate::store::RowRange) it occupies, and the owning row stores
//!    that range as its `PTROBS_*` / `PTRSPEC_*` pointers.
//!
//! 3. **Checks before writes**: epoch bookkeeping errors are caught before any
//!    row of the record reaches a table.
//!
//! 4. **Configurable Compression**: ZSTD (default), Snappy or uncompressed
//!    Parquet tables.

mod config;
mod error;
mod globals;
mod stats;
mod table;
mod writer_impl;


pub use config::{CompressionType, WriterConfig};
pub use error::WriteError;
pub use stats::WriterStats;
pub use table::TableWriter;
pub use writer_impl::{EventRows, SnPackWriter};
