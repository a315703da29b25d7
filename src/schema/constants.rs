/// MIME type stored as the first entry of every snpack container
pub const SNPACK_MIMETYPE: &str = "application/vnd.snpack";

/// Container file extension (upper case spelling)
pub const SNPACK_EXTENSION: &str = ".SNPACK";

/// Container file extension (lower case spelling)
pub const SNPACK_EXTENSION_LOWER: &str = ".snpack";

/// Arrow field metadata key holding the stored type-form string of a column
pub const KEY_FORM: &str = "snpack:form";

/// Parquet footer key holding the table name
pub const KEY_TABLE_NAME: &str = "snpack:table";

/// Format version written as `CODE_IVERSION`
pub const CODE_VERSION: i64 = 10;

/// Containers older than this number their model parameter keys from 1
pub const FIRST_ZERO_BASED_PARAM_VERSION: i64 = 8;

/// Maximum number of columns in one table
pub const MAX_COLUMNS: usize = 400;

/// Maximum length of a produced container path, in bytes
pub const MAX_PATH_LEN: usize = 400;

/// Maximum number of partitions listed in one list file
pub const MAX_PARTITIONS: usize = 1000;

/// Maximum number of entries in an epoch mask
pub const MAX_EPOCHS: usize = 5000;

/// Reserved value carried by end-of-event rows
pub const EOE_MARKER: f64 = 999.0;

/// Reserved wavelength-bin index of the per-spectrum end-of-event flux row
pub const EOE_LAMINDEX: i32 = 777;

/// Placeholder written to the band column of an end-of-event row
pub const EOE_BAND: &str = "-";

/// Placeholder written to every other string column of an end-of-event row
pub const EOE_TEXT: &str = "XXXX";

/// Largest warp value stored in the flux table before scaling
pub const MAX_WARP: f64 = 30.0;
