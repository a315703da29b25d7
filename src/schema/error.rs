use super::TableKind;

/// Errors raised while declaring or classifying columns.
///
/// These are programmer errors in the column rules or a corrupt container; every
/// message carries what failed on the first line and the context on the second.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Declaring one more column would exceed the per-table maximum
    #[error("cannot declare column '{name}' in {table}\n  table already holds {count} columns (maximum {max})")]
    TooManyColumns {
        /// Table being declared
        table: TableKind,
        /// Column that did not fit
        name: String,
        /// Columns already declared
        count: usize,
        /// Per-table maximum
        max: usize,
    },

    /// A column was declared without a name
    #[error("empty column name declared in {table}\n  would have been column {number}")]
    EmptyName {
        /// Table being declared
        table: TableKind,
        /// Column number it would have received
        number: usize,
    },

    /// A column name was declared twice in one table
    #[error("duplicate column '{name}' in {table}\n  first declared as column {existing}")]
    DuplicateColumn {
        /// Table being declared
        table: TableKind,
        /// Repeated name
        name: String,
        /// Column number of the first declaration
        existing: usize,
    },

    /// A stored type-form string is not part of the vocabulary
    #[error("unrecognized type form '{form}' for column '{column}'\n  expected '<w>A', 1I, 1J, 1K, 1E or 1D")]
    UnknownForm {
        /// Stored form string
        form: String,
        /// Column carrying it
        column: String,
    },

    /// Required columns are absent from a stored table
    #[error("missing required columns: {}\n  table {table} is not a valid snpack table", missing.join(", "))]
    MissingRequired {
        /// Table that was checked
        table: TableKind,
        /// Every missing column name
        missing: Vec<String>,
    },

    /// The configuration snapshot could not be loaded
    #[error("invalid configuration snapshot\n  {0}")]
    InvalidConfig(String),
}
