//! Read-side schema introspection.
//!
//! Columns are classified from what the container stores, never from the rules
//! the writer used, so older and newer containers open alike.

use crate::schema::{validate_required, RequiredColumns, SchemaError, TableKind, TypeTag};
use crate::store::TableSource;

use super::ReadError;

/// Column layout of one stored table, grouped by type tag.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    kind: TableKind,
    names: Vec<String>,
    tags: Vec<TypeTag>,
    by_tag: [Vec<usize>; TypeTag::COUNT],
    slots: Vec<usize>,
}

impl ColumnIndex {
    /// Classify every column of the source's current table
    pub fn introspect<S: TableSource + ?Sized>(
        source: &S,
        kind: TableKind,
    ) -> Result<Self, ReadError> {
        let count = source.num_columns()?;
        let mut names = Vec::with_capacity(count);
        let mut tags = Vec::with_capacity(count);
        for column in 1..=count {
            let name = source.column_name(column)?.to_string();
            let form = source.column_form(column)?;
            let tag = TypeTag::from_form(&form).ok_or_else(|| SchemaError::UnknownForm {
                form: form.clone(),
                column: name.clone(),
            })?;
            names.push(name);
            tags.push(tag);
        }
        let index = Self::from_parts(kind, names, tags);
        log::debug!("introspected {} with {} columns", kind, index.len());
        Ok(index)
    }

    /// Index over already classified columns, in column order
    pub fn from_parts(kind: TableKind, names: Vec<String>, tags: Vec<TypeTag>) -> Self {
        let mut by_tag: [Vec<usize>; TypeTag::COUNT] = Default::default();
        let mut slots = Vec::with_capacity(tags.len());
        for (i, tag) in tags.iter().enumerate() {
            let list = &mut by_tag[tag.ordinal()];
            slots.push(list.len());
            list.push(i + 1);
        }
        Self {
            kind,
            names,
            tags,
            by_tag,
            slots,
        }
    }

    /// Table kind
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table has no column
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 1-based column number of a name, by linear scan
    pub fn find(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name).map(|i| i + 1)
    }

    /// Name of a 1-based column
    pub fn name(&self, column: usize) -> Option<&str> {
        self.names.get(column.checked_sub(1)?).map(String::as_str)
    }

    /// Tag of a 1-based column
    pub fn tag(&self, column: usize) -> Option<TypeTag> {
        self.tags.get(column.checked_sub(1)?).copied()
    }

    /// Columns of one tag, in column order
    pub fn columns_of(&self, tag: TypeTag) -> &[usize] {
        &self.by_tag[tag.ordinal()]
    }

    /// Position of a 1-based column within its tag's list
    pub fn slot_of(&self, column: usize) -> Option<usize> {
        self.slots.get(column.checked_sub(1)?).copied()
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// `(column, name, tag)` in column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, TypeTag)> {
        self.names
            .iter()
            .zip(&self.tags)
            .enumerate()
            .map(|(i, (n, t))| (i + 1, n.as_str(), *t))
    }

    /// Look up the required header columns, reporting every missing one
    pub fn required(&self) -> Result<RequiredColumns, SchemaError> {
        validate_required(|name| self.find(name))
    }
}
