use super::{ColumnDescriptor, SchemaError, TableKind, TypeTag, MAX_COLUMNS};

/// Ordered list of the columns declared so far for one table kind.
///
/// Column numbers are 1-based and stable until [`ColumnRegistry::reset`].
#[derive(Debug, Clone)]
pub struct ColumnRegistry {
    kind: TableKind,
    columns: Vec<ColumnDescriptor>,
}

impl ColumnRegistry {
    /// Create an empty registry
    pub fn new(kind: TableKind) -> Self {
        Self {
            kind,
            columns: Vec::new(),
        }
    }

    /// Table kind this registry belongs to
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Append a column and return its 1-based number
    pub fn declare(&mut self, name: &str, tag: TypeTag) -> Result<usize, SchemaError> {
        let number = self.columns.len() + 1;
        if name.is_empty() {
            return Err(SchemaError::EmptyName {
                table: self.kind,
                number,
            });
        }
        if self.columns.len() >= MAX_COLUMNS {
            return Err(SchemaError::TooManyColumns {
                table: self.kind,
                name: name.to_string(),
                count: self.columns.len(),
                max: MAX_COLUMNS,
            });
        }
        if let Some(existing) = self.find(name) {
            return Err(SchemaError::DuplicateColumn {
                table: self.kind,
                name: name.to_string(),
                existing,
            });
        }
        self.columns.push(ColumnDescriptor {
            name: name.to_string(),
            tag,
            number,
        });
        Ok(number)
    }

    /// Clear every declaration, keeping the table kind.
    ///
    /// Only the wavelength index table is reset, so that the spectrum summary can
    /// reuse the same slot.
    pub fn reset(&mut self) {
        self.columns.clear();
    }

    /// Retarget an empty registry to another table kind
    pub(crate) fn reuse_for(&mut self, kind: TableKind) {
        self.reset();
        self.kind = kind;
    }

    /// Linear scan by name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.number)
    }

    /// Descriptor for a 1-based column number
    pub fn get(&self, number: usize) -> Option<&ColumnDescriptor> {
        number.checked_sub(1).and_then(|i| self.columns.get(i))
    }

    /// Declared columns in order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Number of declared columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether nothing has been declared
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
