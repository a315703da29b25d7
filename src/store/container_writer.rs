use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::datatypes::{Field, Schema as ArrowSchema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::schema::{ColumnDescriptor, KEY_FORM, KEY_TABLE_NAME, SNPACK_MIMETYPE};

use super::{ColumnData, GlobalKeys, MetaValue, StoreError, TableSink};

/// A closed table waiting to be packed into a container.
///
/// The encoded Parquet bytes live in an anonymous temporary file.
#[derive(Debug)]
pub struct StagedTable {
    name: String,
    rows: usize,
    file: File,
}

impl StagedTable {
    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rows written to the table
    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Summary of a finished container
#[derive(Debug, Clone, Default)]
pub struct ContainerStats {
    /// Container path
    pub path: PathBuf,
    /// Table names and row counts, in container order
    pub tables: Vec<(String, usize)>,
    /// Size of the container on disk
    pub file_size_bytes: u64,
}

struct OpenTable {
    name: String,
    columns: Vec<ColumnDescriptor>,
    schema: SchemaRef,
    pending: Vec<ColumnData>,
    written: Vec<usize>,
    writer: ArrowWriter<File>,
}

impl OpenTable {
    fn new(
        name: &str,
        columns: &[ColumnDescriptor],
        props: &WriterProperties,
    ) -> Result<Self, StoreError> {
        let fields: Vec<Field> = columns
            .iter()
            .map(|c| {
                Field::new(&c.name, c.tag.arrow_type(), false).with_metadata(HashMap::from([(
                    KEY_FORM.to_string(),
                    c.form(),
                )]))
            })
            .collect();
        let schema = Arc::new(ArrowSchema::new_with_metadata(
            fields,
            HashMap::from([(KEY_TABLE_NAME.to_string(), name.to_string())]),
        ));
        let writer =
            ArrowWriter::try_new(tempfile::tempfile()?, schema.clone(), Some(props.clone()))?;

        Ok(Self {
            name: name.to_string(),
            columns: columns.to_vec(),
            schema,
            pending: columns
                .iter()
                .map(|c| ColumnData::with_capacity(c.tag, 0))
                .collect(),
            written: vec![0; columns.len()],
            writer,
        })
    }

    fn push(
        &mut self,
        column: usize,
        first_row: usize,
        data: ColumnData,
    ) -> Result<(), StoreError> {
        let count = self.columns.len();
        if column == 0 || column > count {
            return Err(StoreError::ColumnOutOfRange {
                table: self.name.clone(),
                column,
                count,
            });
        }
        let idx = column - 1;
        let descriptor = &self.columns[idx];
        if !data.matches(descriptor.tag) {
            return Err(StoreError::TypeMismatch {
                table: self.name.clone(),
                column: descriptor.name.clone(),
                expected: descriptor.form(),
                found: data.class_name().to_string(),
            });
        }
        let expected = self.written[idx] + 1;
        if first_row != expected {
            return Err(StoreError::NonSequentialWrite {
                table: self.name.clone(),
                column,
                expected,
                got: first_row,
            });
        }

        self.written[idx] += data.len();
        // classes were checked above
        let _ = self.pending[idx].append(data);
        Ok(())
    }

    /// Rows every column has reached
    fn complete_rows(&self) -> usize {
        self.pending.iter().map(ColumnData::len).min().unwrap_or(0)
    }

    fn flush(&mut self, rows: usize) -> Result<(), StoreError> {
        if rows == 0 || self.columns.is_empty() {
            return Ok(());
        }
        let arrays = self
            .pending
            .iter_mut()
            .map(|p| p.take_front(rows).to_array())
            .collect();
        let batch = RecordBatch::try_new(self.schema.clone(), arrays)?;
        self.writer.write(&batch)?;
        Ok(())
    }

    fn close(mut self) -> Result<StagedTable, StoreError> {
        let rows = self.written.first().copied().unwrap_or(0);
        for (c, written) in self.columns.iter().zip(&self.written) {
            if *written != rows {
                return Err(StoreError::RaggedTable {
                    table: self.name.clone(),
                    column: c.name.clone(),
                    rows: *written,
                    expected: rows,
                });
            }
        }
        let remaining = self.complete_rows();
        self.flush(remaining)?;

        let mut file = self.writer.into_inner()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(StagedTable {
            name: self.name,
            rows,
            file,
        })
    }
}

/// Writes a container of named tables.
///
/// Tables are created one after another; creating a table closes the previous
/// one. Column slices are buffered until every column of the table holds a full
/// row group, which is then encoded as one Parquet row group.
///
/// # Example
///
/// ```no_run
/// use snpack::schema::{ColumnDescriptor, TypeTag};
/// use snpack::store::{ColumnData, ContainerWriter, TableSink};
/// use parquet::file::properties::WriterProperties;
///
/// let path = "out/TEST_HEAD.SNPACK";
/// let mut container = ContainerWriter::create(path, WriterProperties::default())?;
/// container.create_table("HEADER", &[ColumnDescriptor::new("NOBS", TypeTag::I32, 1)])?;
/// container.write_column(1, 1, ColumnData::I32(vec![3, 5]))?;
/// container.finish()?;
/// # Ok::<(), snpack::store::StoreError>(())
/// ```
pub struct ContainerWriter {
    path: Option<PathBuf>,
    zip: Option<ZipWriter<BufWriter<File>>>,
    props: WriterProperties,
    row_group_size: usize,
    keys: GlobalKeys,
    staged: Vec<StagedTable>,
    current: Option<OpenTable>,
}

impl ContainerWriter {
    /// Create a container file; the file must not exist yet
    pub fn create<P: AsRef<Path>>(path: P, props: WriterProperties) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if path.as_os_str().is_empty() {
            return Err(StoreError::InvalidPath("empty container path".to_string()));
        }
        if path.exists() {
            return Err(StoreError::AlreadyExists(path.display().to_string()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&path)?;
        let mut zip = ZipWriter::new(BufWriter::new(file));

        // mimetype goes first and uncompressed
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);
        zip.start_file("mimetype", options)?;
        zip.write_all(SNPACK_MIMETYPE.as_bytes())?;

        log::debug!("created container {}", path.display());
        let mut writer = Self::scratch(props);
        writer.path = Some(path);
        writer.zip = Some(zip);
        Ok(writer)
    }

    /// Container with no file of its own; its tables are moved into another container
    pub fn scratch(props: WriterProperties) -> Self {
        let row_group_size = props.max_row_group_size().max(1);
        Self {
            path: None,
            zip: None,
            props,
            row_group_size,
            keys: GlobalKeys::new(),
            staged: Vec::new(),
            current: None,
        }
    }

    /// Container path, `None` for scratch containers
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Global keys set so far
    pub fn keys(&self) -> &GlobalKeys {
        &self.keys
    }

    /// Name of the current table
    pub fn current_table(&self) -> Option<&str> {
        self.current.as_ref().map(|t| t.name.as_str())
    }

    /// Rows written to the current table so far
    pub fn current_rows(&self) -> usize {
        self.current
            .as_ref()
            .and_then(|t| t.written.iter().max().copied())
            .unwrap_or(0)
    }

    fn close_current(&mut self) -> Result<(), StoreError> {
        if let Some(table) = self.current.take() {
            let name = table.name.clone();
            let staged = table.close().map_err(|e| e.during("close", &name))?;
            log::debug!("closed table {} with {} rows", staged.name, staged.rows);
            self.staged.push(staged);
        }
        Ok(())
    }

    /// Close the current table and hand over every closed table
    pub fn into_staged_tables(mut self) -> Result<Vec<StagedTable>, StoreError> {
        self.close_current()?;
        Ok(std::mem::take(&mut self.staged))
    }

    /// Close the current table and append tables staged by another container
    pub fn adopt_tables(&mut self, tables: Vec<StagedTable>) -> Result<(), StoreError> {
        self.close_current()?;
        self.staged.extend(tables);
        Ok(())
    }

    /// Close the current table and write the container
    pub fn finish(mut self) -> Result<ContainerStats, StoreError> {
        self.close_current()?;
        let (path, mut zip) = match (self.path.take(), self.zip.take()) {
            (Some(path), Some(zip)) => (path, zip),
            _ => return Err(StoreError::Detached),
        };

        let json = serde_json::to_string_pretty(&self.keys)?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);
        zip.start_file("metadata.json", options)?;
        zip.write_all(json.as_bytes())?;

        // Parquet entries stay uncompressed so they can be read in place
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644)
            .large_file(true);
        let mut tables = Vec::with_capacity(self.staged.len());
        for (i, mut table) in std::mem::take(&mut self.staged).into_iter().enumerate() {
            let entry = format!("tables/{:02}_{}.parquet", i, table.name);
            zip.start_file(entry.as_str(), options)?;
            io::copy(&mut table.file, &mut zip)
                .map_err(|e| StoreError::from(e).during("pack", &table.name))?;
            tables.push((table.name, table.rows));
        }

        let inner = zip.finish()?;
        inner
            .into_inner()
            .map_err(|e| StoreError::IoError(io::Error::other(e.to_string())))?;

        let file_size_bytes = fs::metadata(&path)?.len();
        log::info!(
            "wrote {} ({} tables, {} bytes)",
            path.display(),
            tables.len(),
            file_size_bytes
        );
        Ok(ContainerStats {
            path,
            tables,
            file_size_bytes,
        })
    }
}

impl TableSink for ContainerWriter {
    fn set_key(&mut self, key: &str, value: MetaValue) {
        self.keys.insert(key.to_string(), value);
    }

    fn create_table(
        &mut self,
        name: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<(), StoreError> {
        self.close_current()?;
        let table =
            OpenTable::new(name, columns, &self.props).map_err(|e| e.during("create", name))?;
        log::debug!("created table {} with {} columns", name, columns.len());
        self.current = Some(table);
        Ok(())
    }

    fn write_column(
        &mut self,
        column: usize,
        first_row: usize,
        data: ColumnData,
    ) -> Result<(), StoreError> {
        let row_group_size = self.row_group_size;
        let table = self
            .current
            .as_mut()
            .ok_or(StoreError::NoCurrentTable { op: "write_column" })?;
        table.push(column, first_row, data)?;

        let ready = table.complete_rows();
        if ready >= row_group_size {
            let name = table.name.clone();
            table.flush(ready).map_err(|e| e.during("write", &name))?;
        }
        Ok(())
    }
}
