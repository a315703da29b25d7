//! Write-side row filler for one table.

use crate::record::{FieldBag, Value};
use crate::schema::{
    columns, ColumnRegistry, ColumnSpec, Schema, Source, TableKind, TypeTag, EOE_BAND,
    EOE_MARKER, EOE_TEXT, MAX_WARP,
};
use crate::store::{marshal, ColumnData, RowRange, TableSink};

use super::WriteError;

/// Values feeding one row.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Row<'a> {
    /// A row filled from a field bag
    Fields {
        /// The row's own fields
        fields: &'a FieldBag,
        /// Fields of the record owning the row, for [`Source::Owner`] columns
        owner: Option<&'a FieldBag>,
        /// Block in another table this row points to
        block: Option<RowRange>,
    },
    /// Synthetic end-of-event row
    EndOfEvent,
}

impl<'a> Row<'a> {
    /// Plain row with no owner and no block
    pub(crate) fn of(fields: &'a FieldBag) -> Self {
        Row::Fields {
            fields,
            owner: None,
            block: None,
        }
    }
}

/// Encoded rows waiting to be written
#[derive(Debug)]
pub(crate) struct PendingRows {
    /// Rows the block will occupy
    pub(crate) range: RowRange,
    data: Vec<(usize, ColumnData)>,
}

/// One table being filled: its evaluated schema, the registry it was declared
/// through and its row counter.
///
/// Columns are filled by walking the schema, so fill order matches declaration
/// order by construction.
#[derive(Debug)]
pub struct TableWriter {
    schema: Schema,
    registry: ColumnRegistry,
    rows: usize,
}

impl TableWriter {
    /// Declare `schema` into a fresh registry and finalize the empty table
    pub(crate) fn create<S: TableSink + ?Sized>(
        sink: &mut S,
        schema: Schema,
    ) -> Result<Self, WriteError> {
        let registry = ColumnRegistry::new(schema.kind());
        Self::create_with(sink, schema, registry)
    }

    /// Like [`TableWriter::create`], recycling a registry emptied by the caller
    pub(crate) fn create_with<S: TableSink + ?Sized>(
        sink: &mut S,
        schema: Schema,
        mut registry: ColumnRegistry,
    ) -> Result<Self, WriteError> {
        schema.declare_into(&mut registry)?;
        sink.create_table(schema.kind().table_name(), registry.columns())?;
        Ok(Self {
            schema,
            registry,
            rows: 0,
        })
    }

    /// Table kind
    pub fn kind(&self) -> TableKind {
        self.schema.kind()
    }

    /// Rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Evaluated schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Give the registry back, e.g. to reuse it for the next table of the container
    pub(crate) fn into_registry(self) -> ColumnRegistry {
        self.registry
    }

    /// Append rows and return the range they occupy.
    ///
    /// An empty slice writes nothing and returns the empty range at the next row.
    pub(crate) fn append_block<S: TableSink + ?Sized>(
        &mut self,
        sink: &mut S,
        rows: &[Row<'_>],
        snid: &str,
    ) -> Result<RowRange, WriteError> {
        let pending = self.stage_block(rows, snid)?;
        self.commit(sink, pending)
    }

    /// Encode rows without touching the sink.
    ///
    /// Every value is checked here, so a failing record leaves no partial row.
    pub(crate) fn stage_block(
        &self,
        rows: &[Row<'_>],
        snid: &str,
    ) -> Result<PendingRows, WriteError> {
        self.stage_at(self.rows + 1, rows, snid)
    }

    /// Like [`TableWriter::stage_block`] for rows that will start at `first_row`,
    /// after other staged blocks of the same table are committed
    pub(crate) fn stage_at(
        &self,
        first_row: usize,
        rows: &[Row<'_>],
        snid: &str,
    ) -> Result<PendingRows, WriteError> {
        let range = RowRange::new(first_row, rows.len());
        let mut data = Vec::new();
        if rows.is_empty() {
            return Ok(PendingRows { range, data });
        }

        let table = self.kind().table_name();
        for (spec, column) in self.schema.columns().iter().zip(self.registry.columns()) {
            let mut values = ColumnData::with_capacity(column.tag, rows.len());
            for row in rows {
                let value = self.value_for(spec, row, snid)?;
                values.push(marshal::encode(table, column, &value)?);
            }
            data.push((column.number, values));
        }
        Ok(PendingRows { range, data })
    }

    /// Write rows staged by [`TableWriter::stage_block`], in staging order
    pub(crate) fn commit<S: TableSink + ?Sized>(
        &mut self,
        sink: &mut S,
        pending: PendingRows,
    ) -> Result<RowRange, WriteError> {
        for (column, values) in pending.data {
            sink.write_column(column, pending.range.start, values)?;
        }
        self.rows += pending.range.len();
        Ok(pending.range)
    }

    /// Append one row and return its number
    pub(crate) fn append_row<S: TableSink + ?Sized>(
        &mut self,
        sink: &mut S,
        row: Row<'_>,
        snid: &str,
    ) -> Result<usize, WriteError> {
        Ok(self.append_block(sink, &[row], snid)?.start)
    }

    fn value_for(&self, spec: &ColumnSpec, row: &Row<'_>, snid: &str) -> Result<Value, WriteError> {
        let (fields, owner, block) = match row {
            Row::EndOfEvent => return Ok(end_of_event_value(spec)),
            Row::Fields {
                fields,
                owner,
                block,
            } => (*fields, *owner, *block),
        };

        let found = match spec.source {
            Source::Field => fields.get(&spec.name).cloned(),
            Source::Alias(name) => fields.get(name).cloned(),
            Source::Owner(name) => owner.and_then(|o| o.get(name)).cloned(),
            Source::BlockFirst => block.map(|b| Value::I64(b.start as i64)),
            Source::BlockLast => block.map(|b| Value::I64(b.end as i64)),
            Source::BlockLen => block.map(|b| Value::I64(b.len() as i64)),
            Source::WarpMilli => fields.f64(columns::SIM_WARP).map(|w| Value::I64(warp_milli(w))),
        };
        let value = found.unwrap_or_else(|| Value::zero(spec.tag));

        let blank = value.as_str().is_some_and(str::is_empty);
        if spec.tag.is_string() && blank && spec.name != columns::SUBSURVEY {
            return Err(WriteError::BlankString {
                table: self.kind(),
                column: spec.name.clone(),
                snid: snid.to_string(),
            });
        }
        Ok(value)
    }
}

/// Warp factor capped at [`MAX_WARP`], in thousandths
pub(crate) fn warp_milli(warp: f64) -> i64 {
    (warp.min(MAX_WARP) * 1000.0 + 0.5) as i64
}

fn end_of_event_value(spec: &ColumnSpec) -> Value {
    match spec.tag {
        TypeTag::FixedString(_) if spec.name == columns::BAND => Value::from(EOE_BAND),
        TypeTag::FixedString(_) => Value::from(EOE_TEXT),
        TypeTag::F32 | TypeTag::F64 => Value::F64(EOE_MARKER),
        TypeTag::I16 | TypeTag::I32 | TypeTag::I64 => Value::I64(EOE_MARKER as i64),
    }
}
