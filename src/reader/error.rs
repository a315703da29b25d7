use crate::schema::{SchemaError, TableKind};
use crate::store::StoreError;

/// Errors that can occur during reading.
///
/// Recoverable outcomes (an unknown parameter, a fully masked record, a list of
/// containers in another format) are values, not errors.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The table store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored table is not a valid snpack table
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The list file could not be used
    #[error("invalid list file {path}\n  {reason}")]
    InvalidList {
        /// List file path
        path: String,
        /// What was wrong
        reason: String,
    },

    /// The list file names more partitions than supported
    #[error("list file {path} names {count} containers\n  at most {max} are supported")]
    TooManyPartitions {
        /// List file path
        path: String,
        /// Names found
        count: usize,
        /// Limit
        max: usize,
    },

    /// A required global key is absent
    #[error("missing global key {key}\n  in {path}")]
    MissingGlobalKey {
        /// Key name
        key: &'static str,
        /// Container path
        path: String,
    },

    /// A global key was requested that the container does not carry
    #[error("unknown global key {key}\n  container {path} does not define it")]
    UnknownGlobalKey {
        /// Key name
        key: String,
        /// Container path
        path: String,
    },

    /// A global key holds a value of the wrong kind
    #[error("invalid global key {key} = '{value}'\n  in {path}")]
    InvalidGlobalKey {
        /// Key name
        key: &'static str,
        /// Stored value
        value: String,
        /// Container path
        path: String,
    },

    /// Record index outside every partition
    #[error("record {isn} out of range\n  the list holds {total} records")]
    RecordOutOfRange {
        /// Requested 1-based record index
        isn: usize,
        /// Records across all partitions
        total: usize,
    },

    /// Epoch mask longer than supported
    #[error("epoch mask has {len} entries\n  at most {max} are supported")]
    MaskTooLong {
        /// Entries given
        len: usize,
        /// Limit
        max: usize,
    },

    /// Epoch mask entry other than 0 or 1
    #[error("invalid epoch mask value {value} at entry {index}\n  entries must be 0 or 1")]
    InvalidMask {
        /// 0-based entry
        index: usize,
        /// Offending value
        value: i32,
    },

    /// Epoch mask size differs from the epochs of the record
    #[error("epoch mask has {mask} entries but record {isn} has {epochs} epochs\n  while reading {name}")]
    MaskSizeMismatch {
        /// Parameter being read
        name: String,
        /// 1-based record index
        isn: usize,
        /// Mask entries
        mask: usize,
        /// Epochs of the record
        epochs: usize,
    },

    /// A string parameter was requested as a number
    #[error("parameter {name} is a string column in {table}\n  read it with read_str")]
    NotNumeric {
        /// Parameter name
        name: String,
        /// Table holding it
        table: TableKind,
    },

    /// A table column holds a different class than its declared form
    #[error("column {column} of {table} does not match its form {form}\n  the container is corrupt")]
    CorruptColumn {
        /// Table kind
        table: TableKind,
        /// 1-based column
        column: usize,
        /// Declared form
        form: String,
    },

    /// The photometry table does not end with the end-of-event row
    #[error("no end-of-event row at row {row} of {path}\n  the photometry table holds {rows} rows")]
    MissingEndOfEvents {
        /// Photometry container path
        path: String,
        /// Row where the marker was expected
        row: usize,
        /// Rows in the photometry table
        rows: usize,
    },

    /// Buffers were allocated twice without being freed
    #[error("buffers of {table} are still allocated\n  free them before loading another partition")]
    BuffersInUse {
        /// Table kind
        table: TableKind,
    },

    /// Spectra were requested but no spectrum container is open
    #[error("no spectrum container for partition {partition}\n  the run has no SPECFILE or spectra reading is disabled")]
    SpectraUnavailable {
        /// 1-based partition
        partition: usize,
    },

    /// Spectrum summary row outside the table
    #[error("spectrum row {row} out of range\n  partition {partition} holds {count} spectra")]
    SpectrumOutOfRange {
        /// Requested 1-based row
        row: usize,
        /// 1-based partition
        partition: usize,
        /// Rows in the summary table
        count: usize,
    },

    /// Invalid reader configuration
    #[error("invalid reader configuration\n  {0}")]
    InvalidConfig(String),
}
