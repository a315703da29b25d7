use std::path::{Path, PathBuf};

use crate::schema::{columns, RequiredColumns, TableKind, TypeTag, EOE_MARKER};
use crate::store::{ContainerReader, RowRange, TableSource};

use super::partition::read_list_file;
use super::{
    ColumnIndex, GlobalInfo, PartitionList, ReadError, ReaderConfig, SnPackReader, SpectrumSource,
    TableBuffers,
};

/// Outcome of [`SnPackReader::prepare`]
#[derive(Debug)]
pub enum Prepared {
    /// The list names snpack containers; partition 1 is open
    Ready(Box<SnPackReader>),
    /// The list names containers of another format
    NotThisFormat,
}

/// Tables and layout of the partition currently open.
pub(crate) struct OpenPartition {
    pub number: usize,
    pub head: ContainerReader,
    pub phot: ContainerReader,
    pub spectra: Option<SpectrumSource>,
    pub header_index: ColumnIndex,
    pub phot_index: ColumnIndex,
    pub required: RequiredColumns,
    pub globals: GlobalInfo,
}

impl OpenPartition {
    /// `[PTROBS_MIN, PTROBS_MAX]` of a local record, taken from the header buffers
    pub fn epoch_block(&self, buffers: &TableBuffers, local: usize) -> Result<RowRange, ReadError> {
        Ok(RowRange {
            start: pointer_of(buffers, &self.header_index, self.required.ptrobs_min, local)?,
            end: pointer_of(buffers, &self.header_index, self.required.ptrobs_max, local)?,
        })
    }

    /// Container path of the header table
    pub fn path(&self) -> &Path {
        self.head.path()
    }
}

/// Row pointer stored in a header column
fn pointer_of(
    buffers: &TableBuffers,
    index: &ColumnIndex,
    column: usize,
    local: usize,
) -> Result<usize, ReadError> {
    buffers
        .value(index, column, local)
        .and_then(|v| v.as_i64())
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| ReadError::CorruptColumn {
            table: TableKind::Header,
            column,
            form: index.tag(column).map(|t| t.form()).unwrap_or_default(),
        })
}

/// Check that the photometry table ends with the end-of-event row, right after
/// the block of the last record
fn check_end_of_events(
    phot: &ContainerReader,
    index: &ColumnIndex,
    row: usize,
) -> Result<(), ReadError> {
    let rows = phot.num_rows()?;
    let column = index.find(columns::MJD).or_else(|| {
        index
            .iter()
            .find(|(_, _, tag)| matches!(tag, TypeTag::F32 | TypeTag::F64))
            .map(|(column, _, _)| column)
    });
    let marker = match column {
        Some(column) if rows == row => phot
            .read_column(column, row, 1)?
            .to_f64()
            .and_then(|v| v.first().copied()),
        _ => None,
    };
    if marker != Some(EOE_MARKER) {
        return Err(ReadError::MissingEndOfEvents {
            path: phot.path().display().to_string(),
            row,
            rows,
        });
    }
    log::debug!("end-of-event row found at {} in {}", row, phot.path().display());
    Ok(())
}

impl SnPackReader {
    /// Read a list file of header containers and open the first partition.
    ///
    /// Returns [`Prepared::NotThisFormat`] when the list names containers of
    /// another format, so the caller can fall back to another reader.
    pub fn prepare<P: AsRef<Path>>(list: P, config: ReaderConfig) -> Result<Prepared, ReadError> {
        let list = list.as_ref();
        match read_list_file(list)? {
            Some(paths) => {
                log::info!("{} lists {} partitions", list.display(), paths.len());
                Ok(Prepared::Ready(Box::new(Self::open_partitions(paths, config)?)))
            }
            None => Ok(Prepared::NotThisFormat),
        }
    }

    /// Count the records of every header container and open the first partition
    pub fn open_partitions(paths: Vec<PathBuf>, config: ReaderConfig) -> Result<Self, ReadError> {
        let partitions = PartitionList::scan(paths)?;
        let mut reader = Self::new(partitions, config);
        if !reader.partitions.is_empty() {
            reader.open_partition(1)?;
        }
        log::info!(
            "prepared {} records in {} partitions",
            reader.partitions.total(),
            reader.partitions.len()
        );
        Ok(reader)
    }

    /// Make sure the partition owning `isn` is open; returns the local row
    pub(crate) fn ensure_partition(&mut self, isn: usize) -> Result<usize, ReadError> {
        let total = self.partitions.total();
        let (partition, local) = self
            .partitions
            .locate(isn)
            .ok_or(ReadError::RecordOutOfRange { isn, total })?;
        if self.current.as_ref().map(|p| p.number) != Some(partition) {
            self.close_partition();
            self.open_partition(partition)?;
        }
        Ok(local)
    }

    pub(crate) fn open_partition(&mut self, number: usize) -> Result<(), ReadError> {
        match self.load_partition(number) {
            Ok(partition) => {
                log::info!(
                    "opened partition {} ({}, {} records)",
                    number,
                    partition.path().display(),
                    self.header_buf.loaded_rows()
                );
                self.current = Some(partition);
                self.cache.reset(number);
                self.opens += 1;
                Ok(())
            }
            Err(e) => {
                self.phot_buf.free();
                self.header_buf.free();
                Err(e)
            }
        }
    }

    fn load_partition(&mut self, number: usize) -> Result<OpenPartition, ReadError> {
        let path = self
            .partitions
            .path(number)
            .ok_or_else(|| ReadError::RecordOutOfRange {
                isn: self.partitions.cumulative(number).unwrap_or(0),
                total: self.partitions.total(),
            })?
            .to_path_buf();
        let dir = path.parent().unwrap_or_else(|| Path::new(""));

        let mut head = ContainerReader::open(&path)?;
        head.move_to_table(0)?;
        let header_index = ColumnIndex::introspect(&head, TableKind::Header)?;
        let required = header_index.required()?;
        let globals = GlobalInfo::from_keys(head.global_keys(), &path)?;

        let mut phot = ContainerReader::open(dir.join(&globals.photometry_file))?;
        phot.move_to_table(0)?;
        let phot_index = ColumnIndex::introspect(&phot, TableKind::Photometry)?;

        // header first: the photometry buffers are sized from its NOBS column
        let rows = head.num_rows()?;
        self.header_buf.allocate(&header_index, rows)?;
        self.header_buf
            .fill(&head, &header_index, RowRange::new(1, rows))?;
        let last_pointer = match rows {
            0 => 0,
            _ => pointer_of(&self.header_buf, &header_index, required.ptrobs_max, rows)?,
        };
        check_end_of_events(&phot, &phot_index, last_pointer + 1)?;

        let max_nobs = (1..=rows)
            .filter_map(|row| self.header_buf.value(&header_index, required.nobs, row))
            .filter_map(|v| v.as_i64())
            .max()
            .unwrap_or(0)
            .max(0) as usize;
        self.phot_buf.allocate(&phot_index, max_nobs)?;

        let spectra = match &globals.spectrum_file {
            Some(name) if self.config.read_spectra => {
                Some(SpectrumSource::open(&dir.join(name))?)
            }
            _ => None,
        };

        Ok(OpenPartition {
            number,
            head,
            phot,
            spectra,
            header_index,
            phot_index,
            required,
            globals,
        })
    }

    /// Release the open partition's buffers and tables, photometry before header
    pub(crate) fn close_partition(&mut self) {
        let Some(partition) = self.current.take() else {
            return;
        };
        self.phot_buf.free();
        self.header_buf.free();
        let OpenPartition {
            number,
            head,
            phot,
            spectra,
            ..
        } = partition;
        drop(spectra);
        drop(phot);
        log::info!("closed partition {} ({})", number, head.path().display());
        drop(head);
        self.closes += 1;
    }
}
