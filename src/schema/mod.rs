//! # snpack Schema Definition
//!
//! Column layout for the tables of a light-curve container. The column set is not
//! fixed: it is assembled from a [`ConfigSnapshot`] by evaluating a declarative list
//! of (gate, column) rules, once per table kind.
//!
//! ## Tables
//!
//! | Table | Container | Rows |
//! |-------|-----------|------|
//! | HEADER | `_HEAD` | one per record |
//! | PHOTOMETRY | `_PHOT` | one per epoch, plus one end-of-event row |
//! | SPECTRO_LAMINDEX | `_SPEC` | one per wavelength bin |
//! | SPECTRO_HEADER | `_SPEC` | one per spectrum |
//! | SPECTRO_FLUX | `_SPEC` | one per valid bin, plus one marker row per spectrum |
//!
//! ## Type forms
//!
//! | Tag | Form | Arrow |
//! |-----|------|-------|
//! | FixedString(w) | `wA` | Utf8 |
//! | I16 | `1I` | Int16 |
//! | I32 | `1J` | Int32 |
//! | I64 | `1K` | Int64 |
//! | F32 | `1E` | Float32 |
//! | F64 | `1D` | Float64 |
//!
//! The form string is stored on every field so that a reader can classify columns
//! without knowing which rules produced them.

mod builders;
/// Column and global key name constants.
pub mod columns;
mod constants;
mod error;
mod registry;
mod snapshot;
mod validation;

#[cfg(test)]
mod tests;

use std::fmt;

use arrow::datatypes::DataType;

pub use builders::{ColumnSpec, Schema, Source};
pub use columns::*;
pub use constants::*;
pub use error::SchemaError;
pub use registry::ColumnRegistry;
pub use snapshot::{
    ConfigSnapshot, DataKind, PhotometryOptions, SimModel, SimOptions, SpectrographOptions,
    WavelengthBin,
};
pub use validation::{validate_required, RequiredColumns};

/// Closed vocabulary of column value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Fixed-width string; the payload is the declared width in bytes
    FixedString(u16),
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl TypeTag {
    /// Number of distinct tags, ignoring string width
    pub const COUNT: usize = 6;

    /// Position of this tag in per-tag arrays, ignoring string width
    pub fn ordinal(self) -> usize {
        match self {
            TypeTag::FixedString(_) => 0,
            TypeTag::I16 => 1,
            TypeTag::I32 => 2,
            TypeTag::I64 => 3,
            TypeTag::F32 => 4,
            TypeTag::F64 => 5,
        }
    }

    /// Whether values of this tag are strings
    pub fn is_string(self) -> bool {
        matches!(self, TypeTag::FixedString(_))
    }

    /// Stored type-form string
    pub fn form(self) -> String {
        match self {
            TypeTag::FixedString(width) => format!("{}A", width),
            TypeTag::I16 => "1I".to_string(),
            TypeTag::I32 => "1J".to_string(),
            TypeTag::I64 => "1K".to_string(),
            TypeTag::F32 => "1E".to_string(),
            TypeTag::F64 => "1D".to_string(),
        }
    }

    /// Classifies a stored form string.
    ///
    /// A form ending in `A` is a string whose width is the leading count (1 when
    /// omitted). Anything else must match one of the numeric tokens exactly.
    pub fn from_form(form: &str) -> Option<Self> {
        let form = form.trim();
        if let Some(width) = form.strip_suffix('A') {
            if width.is_empty() {
                return Some(TypeTag::FixedString(1));
            }
            return width.parse::<u16>().ok().map(TypeTag::FixedString);
        }
        match form {
            "1I" => Some(TypeTag::I16),
            "1J" => Some(TypeTag::I32),
            "1K" => Some(TypeTag::I64),
            "1E" => Some(TypeTag::F32),
            "1D" => Some(TypeTag::F64),
            _ => None,
        }
    }

    /// Classifies an Arrow type, for fields written without a form string
    pub fn from_arrow(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 => Some(TypeTag::FixedString(0)),
            DataType::Int16 => Some(TypeTag::I16),
            DataType::Int32 => Some(TypeTag::I32),
            DataType::Int64 => Some(TypeTag::I64),
            DataType::Float32 => Some(TypeTag::F32),
            DataType::Float64 => Some(TypeTag::F64),
            _ => None,
        }
    }

    /// Arrow type used to store this tag
    pub fn arrow_type(self) -> DataType {
        match self {
            TypeTag::FixedString(_) => DataType::Utf8,
            TypeTag::I16 => DataType::Int16,
            TypeTag::I32 => DataType::Int32,
            TypeTag::I64 => DataType::Int64,
            TypeTag::F32 => DataType::Float32,
            TypeTag::F64 => DataType::Float64,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.form())
    }
}

/// Container files produced by one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Header container
    Head,
    /// Photometry container
    Phot,
    /// Spectrum container
    Spec,
}

impl ContainerKind {
    /// Suffix appended to the output prefix
    pub fn suffix(self) -> &'static str {
        match self {
            ContainerKind::Head => "HEAD",
            ContainerKind::Phot => "PHOT",
            ContainerKind::Spec => "SPEC",
        }
    }

    /// File name for an output prefix, e.g. `SURVEY_HEAD.SNPACK`
    pub fn file_name(self, prefix: &str) -> String {
        format!("{}_{}{}", prefix, self.suffix(), SNPACK_EXTENSION)
    }
}

/// Logical tables; each owns its own registry and row counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    /// One row per record
    Header,
    /// One row per epoch
    Photometry,
    /// Wavelength grid; written once, then its registry is reused for the summary
    SpectrumIndex,
    /// One row per spectrum
    SpectrumSummary,
    /// One row per wavelength bin of each spectrum
    SpectrumFlux,
}

impl TableKind {
    /// Every table kind in container order
    pub const ALL: [TableKind; 5] = [
        TableKind::Header,
        TableKind::Photometry,
        TableKind::SpectrumIndex,
        TableKind::SpectrumSummary,
        TableKind::SpectrumFlux,
    ];

    /// Stored table name
    pub fn table_name(self) -> &'static str {
        match self {
            TableKind::Header => "HEADER",
            TableKind::Photometry => "PHOTOMETRY",
            TableKind::SpectrumIndex => "SPECTRO_LAMINDEX",
            TableKind::SpectrumSummary => "SPECTRO_HEADER",
            TableKind::SpectrumFlux => "SPECTRO_FLUX",
        }
    }

    /// Container the table ends up in
    pub fn container(self) -> ContainerKind {
        match self {
            TableKind::Header => ContainerKind::Head,
            TableKind::Photometry => ContainerKind::Phot,
            _ => ContainerKind::Spec,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A declared column: name, type and 1-based position within its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name, unique within the table
    pub name: String,
    /// Value type
    pub tag: TypeTag,
    /// 1-based column number
    pub number: usize,
}

impl ColumnDescriptor {
    /// Descriptor for column `number` (1-based)
    pub fn new(name: &str, tag: TypeTag, number: usize) -> Self {
        Self {
            name: name.to_string(),
            tag,
            number,
        }
    }

    /// Stored type-form string
    pub fn form(&self) -> String {
        self.tag.form()
    }
}
