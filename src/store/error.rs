/// Errors raised by the table store.
///
/// Low-level library errors are wrapped by [`StoreError::Operation`] so that the
/// message names the operation and table that failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Parquet error
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Arrow error
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// JSON error in the global metadata entry
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An operation on a named table failed
    #[error("{op} failed on table {table}\n  {source}")]
    Operation {
        /// Operation name (create, write, read, close, ...)
        op: &'static str,
        /// Table name
        table: String,
        /// Underlying failure
        #[source]
        source: Box<StoreError>,
    },

    /// Refusing to overwrite an existing container
    #[error("container already exists: {0}\n  remove it or choose another output prefix")]
    AlreadyExists(String),

    /// Invalid or malformed container path
    #[error("invalid container path: {0}")]
    InvalidPath(String),

    /// The file is not an snpack container
    #[error("not a valid snpack container: {path}\n  {reason}")]
    InvalidContainer {
        /// Container path
        path: String,
        /// What was wrong
        reason: String,
    },

    /// No table has been created or selected
    #[error("no current table for {op}\n  create or move to a table first")]
    NoCurrentTable {
        /// Operation attempted
        op: &'static str,
    },

    /// Table index past the last table of a container
    #[error("table index {index} out of range\n  container {path} holds {count} tables")]
    TableOutOfRange {
        /// Container path
        path: String,
        /// Requested 0-based index
        index: usize,
        /// Number of tables
        count: usize,
    },

    /// Column number outside the table
    #[error("column {column} out of range in table {table}\n  table has {count} columns")]
    ColumnOutOfRange {
        /// Table name
        table: String,
        /// Requested 1-based column
        column: usize,
        /// Number of columns
        count: usize,
    },

    /// Row range outside the table
    #[error("rows {first_row}..+{nrows} out of range in table {table}\n  table has {num_rows} rows")]
    RowOutOfRange {
        /// Table name
        table: String,
        /// First 1-based row requested
        first_row: usize,
        /// Number of rows requested
        nrows: usize,
        /// Rows in the table
        num_rows: usize,
    },

    /// Column slices must be appended in row order
    #[error("non-sequential write to column {column} of table {table}\n  expected first row {expected}, got {got}")]
    NonSequentialWrite {
        /// Table name
        table: String,
        /// 1-based column
        column: usize,
        /// Next row the column expects
        expected: usize,
        /// Row passed by the caller
        got: usize,
    },

    /// Data type does not match the column
    #[error("type mismatch in column {column} of table {table}\n  expected {expected}, found {found}")]
    TypeMismatch {
        /// Table name
        table: String,
        /// Column name
        column: String,
        /// Declared type
        expected: String,
        /// Supplied type
        found: String,
    },

    /// An integer does not fit the column's width
    #[error("value {value} out of range for column {column} of table {table}\n  the column is {form}")]
    ValueOutOfRange {
        /// Table name
        table: String,
        /// Column name
        column: String,
        /// Declared type
        form: String,
        /// Rejected value
        value: i64,
    },

    /// A table was closed with columns of different lengths
    #[error("ragged table {table}: column {column} has {rows} rows\n  other columns have {expected} rows")]
    RaggedTable {
        /// Table name
        table: String,
        /// Column name
        column: String,
        /// Rows in that column
        rows: usize,
        /// Rows in the first column
        expected: usize,
    },

    /// A scratch container has no file of its own
    #[error("scratch container cannot be finished as a file\n  adopt its tables into another container instead")]
    Detached,
}

impl StoreError {
    /// Attach the failing operation and table name
    pub(crate) fn during(self, op: &'static str, table: &str) -> Self {
        StoreError::Operation {
            op,
            table: table.to_string(),
            source: Box::new(self),
        }
    }
}
