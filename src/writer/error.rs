use crate::schema::{SchemaError, TableKind};
use crate::store::StoreError;

/// Errors that can occur during writing.
///
/// Every message has two lines: what failed, then the context needed to find
/// the caller bug.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Column declaration failed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The table store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Empty string for a column that must not be blank
    #[error("blank string for column {column} of table {table}\n  record {snid}: only SUBSURVEY may be empty")]
    BlankString {
        /// Table kind
        table: TableKind,
        /// Column name
        column: String,
        /// Identifier of the record being written
        snid: String,
    },

    /// Written epochs disagree with the declared observation count
    #[error("epoch count mismatch for record {snid}\n  NOBS declares {declared} epochs but {written} are flagged for writing")]
    EpochCountMismatch {
        /// Record identifier
        snid: String,
        /// Declared `NOBS`
        declared: i64,
        /// Epochs flagged for writing
        written: usize,
    },

    /// A produced container path is too long
    #[error("container path is {len} bytes long\n  {path} must be shorter than {max} bytes")]
    PathTooLong {
        /// Offending path
        path: String,
        /// Its length in bytes
        len: usize,
        /// Limit
        max: usize,
    },

    /// A spectrum was given to a writer whose snapshot has no spectrograph
    #[error("record {snid} carries spectra\n  the snapshot declares no spectrograph")]
    SpectraDisabled {
        /// Record identifier
        snid: String,
    },

    /// Invalid writer configuration
    #[error("invalid writer configuration\n  {0}")]
    InvalidConfig(String),
}
