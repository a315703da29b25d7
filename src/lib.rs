//! # snpack - Columnar Storage for Supernova Light Curves
//!
//! `snpack` writes and reads runs of astronomical transients: one header row per
//! object, one photometry row per observation epoch and, optionally, spectra with
//! their wavelength bins. Each table lives in a Parquet file inside a single-file
//! ZIP container.
//!
//! ## Key Features
//!
//! - **Schema from configuration**: the column set of every table is derived from a
//!   [`schema::ConfigSnapshot`] by evaluating a declarative list of gated columns,
//!   so the writer and any test harness walk the same [`schema::Schema`] value.
//!
//! - **Row pointers as values**: each record owns a contiguous block of photometry
//!   rows, recorded in its header row as `PTROBS_MIN`/`PTROBS_MAX` and handed back
//!   to the caller as a [`store::RowRange`].
//!
//! - **Self-describing containers**: every column carries its type form, so readers
//!   classify columns from what is stored. Older containers without newer optional
//!   columns open as long as the required header columns are present.
//!
//! - **Partitioned reads**: a list file names any number of header containers; the
//!   reader opens one partition at a time and moves between them transparently.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snpack::prelude::*;
//!
//! let snapshot = ConfigSnapshot::data("LSST", "ugrizY");
//! let mut writer = SnPackWriter::create("out", "LSST_0001", snapshot, WriterConfig::default())?;
//!
//! let mut event = SnEvent::new("SN2026xyz");
//! event.header.set("IAUC", "2026xyz");
//! event.header.set("RA", 150.1);
//! event.push_epoch(
//!     FieldBag::new()
//!         .with("MJD", 61000.1)
//!         .with("BAND", "r")
//!         .with("FIELD", "WIDE")
//!         .with("FLUXCAL", 250.0f32)
//!         .with("FLUXCALERR", 12.0f32),
//! );
//! writer.write_event(&event)?;
//! writer.finish()?;
//!
//! let mut reader = SnPackReader::open_partitions(
//!     vec!["out/LSST_0001_HEAD.SNPACK".into()],
//!     ReaderConfig::default(),
//! )?;
//! let mut flux = Vec::new();
//! reader.read_f32(1, "FLUXCAL", &mut flux)?;
//! assert_eq!(flux, vec![250.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Containers of a Run
//!
//! | Container | Tables |
//! |-----------|--------|
//! | `{prefix}_HEAD.SNPACK` | HEADER |
//! | `{prefix}_PHOT.SNPACK` | PHOTOMETRY |
//! | `{prefix}_SPEC.SNPACK` | SPECTRO_LAMINDEX, SPECTRO_HEADER, SPECTRO_FLUX |
//!
//! The header container also carries the global keys of the run (survey, filters,
//! data kind, sibling file names and the parameter-name lists of simulations).

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod reader;
pub mod record;
pub mod schema;
pub mod store;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::reader::{
        GlobalInfo, Prepared, ReadCount, ReadError, ReadStats, ReaderConfig, SnPackReader,
    };
    pub use crate::record::{Epoch, FieldBag, SnEvent, SpectrumEpoch, Value};
    pub use crate::schema::{
        columns, ConfigSnapshot, DataKind, Schema, SchemaError, SimModel, SpectrographOptions,
        TableKind, TypeTag, WavelengthBin,
    };
    pub use crate::store::{MetaValue, RowRange};
    pub use crate::writer::{
        CompressionType, EventRows, SnPackWriter, WriteError, WriterConfig, WriterStats,
    };
}
