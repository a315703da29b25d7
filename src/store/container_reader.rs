use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use arrow::array::new_empty_array;
use arrow::datatypes::SchemaRef;
use bytes::Bytes;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReaderBuilder, RowSelection, RowSelector};
use parquet::arrow::ProjectionMask;
use zip::ZipArchive;

use crate::schema::{TypeTag, KEY_FORM, KEY_TABLE_NAME, SNPACK_MIMETYPE};

use super::{ColumnData, GlobalKeys, StoreError, TableSource};

struct LoadedTable {
    index: usize,
    name: String,
    bytes: Bytes,
    schema: SchemaRef,
    num_rows: usize,
}

/// Reads the tables of a container.
///
/// One table is loaded at a time; moving to another table drops the previous
/// table's bytes.
pub struct ContainerReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    keys: GlobalKeys,
    entries: Vec<String>,
    current: Option<LoadedTable>,
}

impl ContainerReader {
    /// Open a container and read its global keys
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let invalid = |reason: String| StoreError::InvalidContainer {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(&path).map_err(|e| invalid(e.to_string()))?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut mimetype = String::new();
        archive
            .by_name("mimetype")
            .map_err(|_| invalid("missing mimetype entry".to_string()))?
            .read_to_string(&mut mimetype)?;
        if mimetype.trim() != SNPACK_MIMETYPE {
            return Err(invalid(format!("unexpected mimetype '{}'", mimetype.trim())));
        }

        let keys: GlobalKeys = match archive.by_name("metadata.json") {
            Ok(mut entry) => {
                let mut json = String::new();
                entry.read_to_string(&mut json)?;
                serde_json::from_str(&json)?
            }
            Err(_) => GlobalKeys::new(),
        };

        let mut entries: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("tables/") && name.ends_with(".parquet"))
            .map(str::to_string)
            .collect();
        entries.sort();

        log::debug!("opened {} with {} tables", path.display(), entries.len());
        Ok(Self {
            path,
            archive,
            keys,
            entries,
            current: None,
        })
    }

    /// Container path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn loaded(&self, op: &'static str) -> Result<&LoadedTable, StoreError> {
        self.current.as_ref().ok_or(StoreError::NoCurrentTable { op })
    }

    fn check_column(&self, column: usize) -> Result<&LoadedTable, StoreError> {
        let table = self.loaded("column access")?;
        let count = table.schema.fields().len();
        if column == 0 || column > count {
            return Err(StoreError::ColumnOutOfRange {
                table: table.name.clone(),
                column,
                count,
            });
        }
        Ok(table)
    }

    fn load(&mut self, index: usize) -> Result<LoadedTable, StoreError> {
        let entry = &self.entries[index];
        let mut raw = Vec::new();
        self.archive.by_name(entry)?.read_to_end(&mut raw)?;
        let bytes = Bytes::from(raw);

        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes.clone())?;
        let schema = builder.schema().clone();
        let num_rows = builder.metadata().file_metadata().num_rows().max(0) as usize;
        let name = schema
            .metadata()
            .get(KEY_TABLE_NAME)
            .cloned()
            .unwrap_or_else(|| table_name_from_entry(entry));

        Ok(LoadedTable {
            index,
            name,
            bytes,
            schema,
            num_rows,
        })
    }
}

/// `tables/03_PHOTOMETRY.parquet` -> `PHOTOMETRY`
fn table_name_from_entry(entry: &str) -> String {
    let stem = entry
        .trim_start_matches("tables/")
        .trim_end_matches(".parquet");
    match stem.split_once('_') {
        Some((prefix, rest)) if prefix.chars().all(|c| c.is_ascii_digit()) => rest.to_string(),
        _ => stem.to_string(),
    }
}

impl TableSource for ContainerReader {
    fn global_keys(&self) -> &GlobalKeys {
        &self.keys
    }

    fn table_count(&self) -> usize {
        self.entries.len()
    }

    fn move_to_table(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.entries.len() {
            return Err(StoreError::TableOutOfRange {
                path: self.path.display().to_string(),
                index,
                count: self.entries.len(),
            });
        }
        if self.current.as_ref().is_some_and(|t| t.index == index) {
            return Ok(());
        }
        let entry = self.entries[index].clone();
        let table = self.load(index).map_err(|e| e.during("open", &entry))?;
        self.current = Some(table);
        Ok(())
    }

    fn current_table(&self) -> Option<usize> {
        self.current.as_ref().map(|t| t.index)
    }

    fn table_name(&self) -> Result<&str, StoreError> {
        Ok(self.loaded("table_name")?.name.as_str())
    }

    fn num_rows(&self) -> Result<usize, StoreError> {
        Ok(self.loaded("num_rows")?.num_rows)
    }

    fn num_columns(&self) -> Result<usize, StoreError> {
        Ok(self.loaded("num_columns")?.schema.fields().len())
    }

    fn column_name(&self, column: usize) -> Result<&str, StoreError> {
        let table = self.check_column(column)?;
        Ok(table.schema.field(column - 1).name().as_str())
    }

    fn column_form(&self, column: usize) -> Result<String, StoreError> {
        let table = self.check_column(column)?;
        let field = table.schema.field(column - 1);
        if let Some(form) = field.metadata().get(KEY_FORM) {
            return Ok(form.clone());
        }
        // fields written by other tools carry no form string
        TypeTag::from_arrow(field.data_type())
            .map(TypeTag::form)
            .ok_or_else(|| StoreError::TypeMismatch {
                table: table.name.clone(),
                column: field.name().clone(),
                expected: "a numeric or string column".to_string(),
                found: field.data_type().to_string(),
            })
    }

    fn read_column(
        &self,
        column: usize,
        first_row: usize,
        nrows: usize,
    ) -> Result<ColumnData, StoreError> {
        let table = self.check_column(column)?;
        if first_row == 0 || first_row - 1 + nrows > table.num_rows {
            return Err(StoreError::RowOutOfRange {
                table: table.name.clone(),
                first_row,
                nrows,
                num_rows: table.num_rows,
            });
        }
        let field = table.schema.field(column - 1);
        if nrows == 0 {
            return ColumnData::from_array(new_empty_array(field.data_type()).as_ref());
        }

        let read = || -> Result<ColumnData, StoreError> {
            let builder = ParquetRecordBatchReaderBuilder::try_new(table.bytes.clone())?;
            let mask = ProjectionMask::roots(builder.parquet_schema(), [column - 1]);
            let mut selectors = Vec::with_capacity(2);
            if first_row > 1 {
                selectors.push(RowSelector::skip(first_row - 1));
            }
            selectors.push(RowSelector::select(nrows));

            let reader = builder
                .with_projection(mask)
                .with_row_selection(RowSelection::from(selectors))
                .with_batch_size(nrows)
                .build()?;

            let mut data: Option<ColumnData> = None;
            for batch in reader {
                let chunk = ColumnData::from_array(batch?.column(0).as_ref())?;
                match data.as_mut() {
                    Some(acc) => {
                        if let Err(chunk) = acc.append(chunk) {
                            return Err(StoreError::TypeMismatch {
                                table: table.name.clone(),
                                column: field.name().clone(),
                                expected: acc.class_name().to_string(),
                                found: chunk.class_name().to_string(),
                            });
                        }
                    }
                    None => data = Some(chunk),
                }
            }
            match data {
                Some(data) => Ok(data),
                None => ColumnData::from_array(new_empty_array(field.data_type()).as_ref()),
            }
        };
        read().map_err(|e| e.during("read", &table.name))
    }
}
