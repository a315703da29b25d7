use std::path::Path;

use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::schema::types::ColumnPath;
use serde::{Deserialize, Serialize};

use crate::schema::columns;

use super::WriteError;

/// Compression options for snpack tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// ZSTD compression (best compression ratio)
    Zstd(i32),
    /// Snappy compression (faster, slightly larger files)
    Snappy,
    /// No compression
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(3)
    }
}

impl CompressionType {
    /// Maximum compression (slower write, smallest files)
    pub fn max_compression() -> Self {
        Self::Zstd(22)
    }

    /// Fast compression (faster write, larger files)
    pub fn fast() -> Self {
        Self::Snappy
    }
}

/// Configuration for the snpack writer
///
/// ```toml
/// compression = { zstd = 9 }
/// row_group_size = 50000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Compression type to use
    pub compression: CompressionType,

    /// Target row group size (number of rows per group)
    /// Smaller = better random access to epoch blocks, larger = better compression
    pub row_group_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write statistics for columns
    pub write_statistics: bool,

    /// Dictionary page size limit in bytes
    pub dictionary_page_size_limit: usize,

    /// Enable BYTE_STREAM_SPLIT encoding for the flux and time columns
    pub use_byte_stream_split: bool,

    /// Tool version written as `SNANA_VERSION`
    pub tool_version: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::Zstd(9),
            // light-curve blocks are small; keep groups modest for row-range reads
            row_group_size: 16 * 1024,
            data_page_size: 1024 * 1024,
            write_statistics: true,
            dictionary_page_size_limit: 1024 * 1024,
            use_byte_stream_split: true,
            tool_version: format!("snpack-{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl WriterConfig {
    /// Configuration optimized for maximum compression (slower write)
    pub fn max_compression() -> Self {
        Self {
            compression: CompressionType::max_compression(),
            row_group_size: 128 * 1024,
            data_page_size: 2 * 1024 * 1024,
            dictionary_page_size_limit: 2 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Configuration optimized for fast writing (larger files)
    pub fn fast_write() -> Self {
        Self {
            compression: CompressionType::fast(),
            data_page_size: 512 * 1024,
            dictionary_page_size_limit: 512 * 1024,
            ..Self::default()
        }
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, WriteError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WriteError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, WriteError> {
        toml::from_str(content).map_err(|e| WriteError::InvalidConfig(e.to_string()))
    }

    /// Create writer properties from this configuration
    pub fn to_writer_properties(&self) -> WriterProperties {
        let compression = match self.compression {
            CompressionType::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Snappy => Compression::SNAPPY,
            CompressionType::Uncompressed => Compression::UNCOMPRESSED,
        };

        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(compression)
            .set_data_page_size_limit(self.data_page_size)
            .set_dictionary_page_size_limit(self.dictionary_page_size_limit)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size.max(1))
            .set_created_by(self.tool_version.clone());

        // high-cardinality measurements: plain values compress better split by byte
        let float_columns = [
            columns::MJD,
            columns::FLUXCAL,
            columns::FLUXCALERR,
            columns::FLAM,
            columns::FLAMERR,
        ];
        for col in float_columns {
            let path = ColumnPath::new(vec![col.to_string()]);
            builder = builder.set_column_dictionary_enabled(path.clone(), false);
            if self.use_byte_stream_split {
                builder = builder.set_column_encoding(path, Encoding::BYTE_STREAM_SPLIT);
            }
        }

        builder.build()
    }
}
