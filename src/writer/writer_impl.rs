use std::path::{Path, PathBuf};

use crate::record::{FieldBag, SnEvent};
use crate::schema::{
    columns, ConfigSnapshot, ContainerKind, Schema, TableKind, CODE_VERSION, EOE_LAMINDEX,
    EOE_MARKER, MAX_PATH_LEN,
};
use crate::schema::keys;
use crate::store::{ContainerWriter, MetaValue, RowRange, TableSink};

use super::globals::{write_globals, SiblingFiles};
use super::table::{PendingRows, Row, TableWriter};
use super::{WriteError, WriterConfig, WriterStats};

/// Rows a record occupies after [`SnPackWriter::write_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRows {
    /// Header row of the record
    pub header_row: usize,
    /// Photometry block `[PTROBS_MIN, PTROBS_MAX]`
    pub photometry: RowRange,
    /// Spectrum summary rows, when spectra are enabled
    pub spectra: Option<RowRange>,
}

struct SpectrumTables {
    container: ContainerWriter,
    flux_scratch: ContainerWriter,
    summary: TableWriter,
    flux: TableWriter,
    marker: FieldBag,
}

/// Spectrum rows of one record, encoded but not yet written
struct StagedSpectra {
    rows: RowRange,
    flux: Vec<PendingRows>,
    summary: Vec<PendingRows>,
}

/// Writes one run of records into `{prefix}_HEAD`, `{prefix}_PHOT` and, when the
/// snapshot declares a spectrograph, `{prefix}_SPEC` containers.
///
/// Records are appended in order; each owns one header row, a contiguous
/// photometry block and optionally a contiguous block of spectrum rows.
///
/// # Example
///
/// ```no_run
/// use snpack::prelude::*;
///
/// let snapshot = ConfigSnapshot::data("LSST", "gri");
/// let mut writer = SnPackWriter::create("out", "LSST_0001", snapshot, WriterConfig::default())?;
///
/// let mut event = SnEvent::new("SN2026abc");
/// event.header.set("IAUC", "2026abc");
/// event.push_epoch(
///     FieldBag::new()
///         .with("MJD", 60001.25)
///         .with("BAND", "g")
///         .with("FIELD", "DEEP")
///         .with("FLUXCAL", 12.5f32),
/// );
/// writer.write_event(&event)?;
///
/// let stats = writer.finish()?;
/// println!("{}", stats);
/// # Ok::<(), snpack::writer::WriteError>(())
/// ```
pub struct SnPackWriter {
    snapshot: ConfigSnapshot,
    head: ContainerWriter,
    phot: ContainerWriter,
    header: TableWriter,
    photometry: TableWriter,
    spectra: Option<SpectrumTables>,
    records: usize,
}

fn container_path(dir: &Path, kind: ContainerKind, prefix: &str) -> Result<PathBuf, WriteError> {
    let path = dir.join(kind.file_name(prefix));
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(WriteError::PathTooLong {
            path: path.display().to_string(),
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(path)
}

impl SnPackWriter {
    /// Create the containers of a run under `dir` and declare every table
    pub fn create<P: AsRef<Path>>(
        dir: P,
        prefix: &str,
        snapshot: ConfigSnapshot,
        config: WriterConfig,
    ) -> Result<Self, WriteError> {
        let dir = dir.as_ref();
        let head_path = container_path(dir, ContainerKind::Head, prefix)?;
        let phot_path = container_path(dir, ContainerKind::Phot, prefix)?;
        let spec_path = snapshot
            .has_spectra()
            .then(|| container_path(dir, ContainerKind::Spec, prefix))
            .transpose()?;

        let props = config.to_writer_properties();
        let files = SiblingFiles {
            photometry: ContainerKind::Phot.file_name(prefix),
            spectra: spec_path.as_ref().map(|_| ContainerKind::Spec.file_name(prefix)),
        };

        let mut head = ContainerWriter::create(&head_path, props.clone())?;
        write_globals(&mut head, &snapshot, &config, &files);
        let header = TableWriter::create(&mut head, Schema::build(TableKind::Header, &snapshot))?;

        let mut phot = ContainerWriter::create(&phot_path, props.clone())?;
        sibling_keys(&mut phot, &snapshot);
        let photometry =
            TableWriter::create(&mut phot, Schema::build(TableKind::Photometry, &snapshot))?;

        let spectra = match spec_path {
            Some(path) => {
                let mut container = ContainerWriter::create(&path, props.clone())?;
                sibling_keys(&mut container, &snapshot);
                Some(Self::create_spectrum_tables(container, &snapshot, props)?)
            }
            None => None,
        };

        log::info!(
            "writing {} ({} header columns, {} photometry columns)",
            head_path.display(),
            header.schema().len(),
            photometry.schema().len()
        );

        Ok(Self {
            snapshot,
            head,
            phot,
            header,
            photometry,
            spectra,
            records: 0,
        })
    }

    fn create_spectrum_tables(
        mut container: ContainerWriter,
        snapshot: &ConfigSnapshot,
        props: parquet::file::properties::WriterProperties,
    ) -> Result<SpectrumTables, WriteError> {
        let bins = snapshot
            .spectrograph
            .as_ref()
            .map(|s| s.wavelength_bins.as_slice())
            .unwrap_or_default();

        // wavelength grid goes first; its registry is then reused for the summary
        let mut index = TableWriter::create(
            &mut container,
            Schema::build(TableKind::SpectrumIndex, snapshot),
        )?;
        let grid: Vec<FieldBag> = bins
            .iter()
            .enumerate()
            .map(|(i, bin)| {
                FieldBag::new()
                    .with(columns::LAMINDEX, i as i32)
                    .with(columns::LAMMIN, bin.lammin)
                    .with(columns::LAMMAX, bin.lammax)
                    .with(columns::LAMCEN, bin.center())
            })
            .collect();
        let rows: Vec<Row<'_>> = grid.iter().map(Row::of).collect();
        index.append_block(&mut container, &rows, "")?;

        let mut registry = index.into_registry();
        registry.reuse_for(TableKind::SpectrumSummary);
        let summary = TableWriter::create_with(
            &mut container,
            Schema::build(TableKind::SpectrumSummary, snapshot),
            registry,
        )?;

        let mut flux_scratch = ContainerWriter::scratch(props);
        let flux = TableWriter::create(
            &mut flux_scratch,
            Schema::build(TableKind::SpectrumFlux, snapshot),
        )?;

        let marker = FieldBag::new()
            .with(columns::LAMINDEX, EOE_LAMINDEX)
            .with(columns::FLAM, EOE_MARKER)
            .with(columns::FLAMERR, EOE_MARKER)
            .with(columns::SIM_FLAM, EOE_MARKER);

        Ok(SpectrumTables {
            container,
            flux_scratch,
            summary,
            flux,
            marker,
        })
    }

    /// Snapshot the run was created with
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Records written so far
    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Photometry rows written so far
    pub fn photometry_rows(&self) -> usize {
        self.photometry.rows()
    }

    /// Append one record.
    ///
    /// The epoch count and every value of the record, spectra included, are
    /// checked before anything is written, so a refused record leaves the tables
    /// untouched.
    pub fn write_event(&mut self, event: &SnEvent) -> Result<EventRows, WriteError> {
        let snid = event.snid().unwrap_or_default();

        let written = event.written_epochs().count();
        let declared = event.declared_nobs();
        if written as i64 != declared {
            return Err(WriteError::EpochCountMismatch {
                snid: snid.to_string(),
                declared,
                written,
            });
        }
        if self.spectra.is_none() && event.spectra.iter().any(|s| !s.skip) {
            return Err(WriteError::SpectraDisabled {
                snid: snid.to_string(),
            });
        }

        let epochs: Vec<Row<'_>> = event.written_epochs().map(|e| Row::of(&e.fields)).collect();
        let epochs = self.photometry.stage_block(&epochs, snid)?;
        let header = self.header.stage_block(
            &[Row::Fields {
                fields: &event.header,
                owner: None,
                block: Some(epochs.range),
            }],
            snid,
        )?;
        let staged = self
            .spectra
            .as_ref()
            .map(|tables| tables.stage_spectra(event, snid))
            .transpose()?;

        let photometry = self.photometry.commit(&mut self.phot, epochs)?;
        let header_row = self.header.commit(&mut self.head, header)?.start;
        let spectra = match (self.spectra.as_mut(), staged) {
            (Some(tables), Some(staged)) => Some(tables.commit(staged)?),
            _ => None,
        };

        self.records += 1;
        log::trace!("record {} -> header row {}, photometry {}", snid, header_row, photometry);
        Ok(EventRows {
            header_row,
            photometry,
            spectra,
        })
    }

    /// Append the end-of-event row and write every container
    pub fn finish(mut self) -> Result<WriterStats, WriteError> {
        self.photometry
            .append_row(&mut self.phot, Row::EndOfEvent, "end-of-event")?;

        let mut stats = WriterStats {
            records_written: self.records,
            epochs_written: self.photometry.rows(),
            ..Default::default()
        };
        stats.containers.push(self.head.finish()?);
        stats.containers.push(self.phot.finish()?);

        if let Some(tables) = self.spectra {
            stats.spectra_written = tables.summary.rows();
            stats.flux_rows_written = tables.flux.rows();
            let mut container = tables.container;
            container.adopt_tables(tables.flux_scratch.into_staged_tables()?)?;
            stats.containers.push(container.finish()?);
        }

        log::info!("{}", stats);
        Ok(stats)
    }
}

impl SpectrumTables {
    fn stage_spectra(&self, event: &SnEvent, snid: &str) -> Result<StagedSpectra, WriteError> {
        let first = self.summary.rows() + 1;
        let mut next_flux = self.flux.rows() + 1;
        let mut flux = Vec::new();
        let mut summary = Vec::new();
        for spectrum in event.spectra.iter().filter(|s| !s.skip) {
            let bins: Vec<Row<'_>> = spectrum.valid_bins().map(Row::of).collect();
            let block = self.flux.stage_at(next_flux, &bins, snid)?;
            // marker row sits after the block, outside [PTRSPEC_MIN, PTRSPEC_MAX]
            let marker = self
                .flux
                .stage_at(block.range.end + 1, &[Row::of(&self.marker)], snid)?;
            next_flux = marker.range.end + 1;

            let row = self.summary.stage_at(
                first + summary.len(),
                &[Row::Fields {
                    fields: &spectrum.fields,
                    owner: Some(&event.header),
                    block: Some(block.range),
                }],
                snid,
            )?;
            summary.push(row);
            flux.push(block);
            flux.push(marker);
        }
        Ok(StagedSpectra {
            rows: RowRange::new(first, summary.len()),
            flux,
            summary,
        })
    }

    fn commit(&mut self, staged: StagedSpectra) -> Result<RowRange, WriteError> {
        for pending in staged.flux {
            self.flux.commit(&mut self.flux_scratch, pending)?;
        }
        for pending in staged.summary {
            self.summary.commit(&mut self.container, pending)?;
        }
        Ok(staged.rows)
    }
}

/// Keys identifying a sibling container's run
fn sibling_keys(sink: &mut ContainerWriter, snapshot: &ConfigSnapshot) {
    sink.set_key(keys::CODE_IVERSION, MetaValue::Int(CODE_VERSION));
    sink.set_key(keys::SURVEY, snapshot.survey.as_str().into());
}
