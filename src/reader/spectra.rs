//! Spectrum container access: wavelength grid, summary rows and flux blocks.

use std::path::Path;

use crate::record::{FieldBag, SpectrumEpoch};
use crate::schema::{columns, TableKind, TypeTag, WavelengthBin};
use crate::store::{marshal, ColumnData, ContainerReader, RowRange, TableSource};

use super::{ColumnIndex, ReadError};

const GRID_TABLE: usize = 0;
const SUMMARY_TABLE: usize = 1;
const FLUX_TABLE: usize = 2;

/// Warp factors are stored in thousandths
const WARP_SCALE: f64 = 1000.0;

/// Open spectrum container of one partition.
///
/// The summary and flux tables are held by two readers so that both stay
/// loaded while a spectrum is assembled.
pub struct SpectrumSource {
    summary: ContainerReader,
    flux: ContainerReader,
    summary_index: ColumnIndex,
    flux_index: ColumnIndex,
    grid: Vec<WavelengthBin>,
    snids: Vec<String>,
}

impl SpectrumSource {
    /// Open a spectrum container, read its wavelength grid and the SNID of every spectrum
    pub fn open(path: &Path) -> Result<Self, ReadError> {
        let mut summary = ContainerReader::open(path)?;
        summary.move_to_table(GRID_TABLE)?;
        let grid = read_grid(&summary)?;

        summary.move_to_table(SUMMARY_TABLE)?;
        let summary_index = ColumnIndex::introspect(&summary, TableKind::SpectrumSummary)?;
        let snids = match summary_index.find(columns::SNID) {
            Some(column) => text_column(&summary, &summary_index, column)?,
            None => Vec::new(),
        };

        let mut flux = ContainerReader::open(path)?;
        flux.move_to_table(FLUX_TABLE)?;
        let flux_index = ColumnIndex::introspect(&flux, TableKind::SpectrumFlux)?;

        log::debug!(
            "opened {} with {} spectra over {} wavelength bins",
            path.display(),
            snids.len(),
            grid.len()
        );
        Ok(Self {
            summary,
            flux,
            summary_index,
            flux_index,
            grid,
            snids,
        })
    }

    /// Number of spectra
    pub fn len(&self) -> usize {
        self.snids.len()
    }

    /// Whether the container holds no spectrum
    pub fn is_empty(&self) -> bool {
        self.snids.is_empty()
    }

    /// Wavelength grid, indexed by `LAMINDEX`
    pub fn grid(&self) -> &[WavelengthBin] {
        &self.grid
    }

    /// 1-based summary rows belonging to `snid`
    pub fn rows_of(&self, snid: &str) -> Vec<usize> {
        self.snids
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_str() == snid)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Summary fields and flux bins of a 1-based summary row
    pub fn read(&self, row: usize, partition: usize) -> Result<SpectrumEpoch, ReadError> {
        if row == 0 || row > self.snids.len() {
            return Err(ReadError::SpectrumOutOfRange {
                row,
                partition,
                count: self.snids.len(),
            });
        }

        let mut fields = FieldBag::new();
        for (column, name, tag) in self.summary_index.iter() {
            if name == columns::SNID {
                continue;
            }
            let data = marshal::read_values(&self.summary, column, tag, RowRange::new(row, 1))?;
            if let Some(value) = data.get(0) {
                fields.set(name, value);
            }
        }

        let block = RowRange {
            start: self.pointer(&fields, columns::PTRSPEC_MIN)?,
            end: self.pointer(&fields, columns::PTRSPEC_MAX)?,
        };
        Ok(SpectrumEpoch {
            fields,
            bins: self.read_bins(block)?,
            skip: false,
        })
    }

    fn pointer(&self, fields: &FieldBag, name: &str) -> Result<usize, ReadError> {
        fields
            .i64(name)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| ReadError::CorruptColumn {
                table: TableKind::SpectrumSummary,
                column: self.summary_index.find(name).unwrap_or(0),
                form: TypeTag::I32.form(),
            })
    }

    fn read_bins(&self, block: RowRange) -> Result<Vec<FieldBag>, ReadError> {
        let mut bins = vec![FieldBag::new(); block.len()];
        if block.is_empty() {
            return Ok(bins);
        }

        for (column, name, tag) in self.flux_index.iter() {
            let data = marshal::read_values(&self.flux, column, tag, block)?;
            for (i, bin) in bins.iter_mut().enumerate() {
                let Some(value) = data.get(i) else { continue };
                match name {
                    columns::LAMINDEX => {
                        let index = value.as_i64().unwrap_or(-1);
                        bin.set(columns::LAMINDEX, index as i32);
                        let edges = usize::try_from(index).ok().and_then(|i| self.grid.get(i));
                        if let Some(edges) = edges {
                            bin.set(columns::LAMMIN, edges.lammin);
                            bin.set(columns::LAMMAX, edges.lammax);
                        }
                    }
                    columns::SIM_WARP => {
                        let warp = value.as_f64().unwrap_or(0.0) / WARP_SCALE;
                        bin.set(columns::SIM_WARP, warp);
                    }
                    _ => {
                        bin.set(name, value);
                    }
                }
            }
        }
        Ok(bins)
    }
}

fn text_column(
    source: &ContainerReader,
    index: &ColumnIndex,
    column: usize,
) -> Result<Vec<String>, ReadError> {
    let rows = source.num_rows()?;
    let tag = index.tag(column).unwrap_or(TypeTag::FixedString(0));
    if rows == 0 {
        return Ok(Vec::new());
    }
    match marshal::read_values(source, column, tag, RowRange::new(1, rows))? {
        ColumnData::Text(values) => Ok(values),
        _ => Err(ReadError::CorruptColumn {
            table: index.kind(),
            column,
            form: tag.form(),
        }),
    }
}

/// Wavelength grid of the first table, stored as edges or as centres
fn read_grid(source: &ContainerReader) -> Result<Vec<WavelengthBin>, ReadError> {
    let rows = source.num_rows()?;
    let index = ColumnIndex::introspect(source, TableKind::SpectrumIndex)?;
    if rows == 0 {
        return Ok(Vec::new());
    }
    let floats = |name: &str| -> Result<Option<Vec<f64>>, ReadError> {
        let Some(column) = index.find(name) else {
            return Ok(None);
        };
        let tag = index.tag(column).unwrap_or(TypeTag::F32);
        let data = marshal::read_values(source, column, tag, RowRange::new(1, rows))?;
        Ok(data.to_f64())
    };

    if let (Some(lammin), Some(lammax)) = (floats(columns::LAMMIN)?, floats(columns::LAMMAX)?) {
        return Ok(lammin
            .iter()
            .zip(&lammax)
            .map(|(lo, hi)| WavelengthBin {
                lammin: *lo as f32,
                lammax: *hi as f32,
            })
            .collect());
    }
    match floats(columns::LAMCEN)? {
        Some(centers) => Ok(edges_from_centers(&centers)),
        None => Err(ReadError::CorruptColumn {
            table: TableKind::SpectrumIndex,
            column: 0,
            form: "LAMMIN/LAMMAX or LAMCEN".to_string(),
        }),
    }
}

/// Bin edges halfway between neighbouring centres; the outer bins mirror their
/// inner half-width
pub(crate) fn edges_from_centers(centers: &[f64]) -> Vec<WavelengthBin> {
    let half_step = |i: usize, j: usize| (centers[j] - centers[i]) * 0.5;
    (0..centers.len())
        .map(|i| {
            let below = match i {
                0 if centers.len() > 1 => half_step(0, 1),
                0 => 0.0,
                _ => half_step(i - 1, i),
            };
            let above = if i + 1 < centers.len() {
                half_step(i, i + 1)
            } else {
                below
            };
            WavelengthBin {
                lammin: (centers[i] - below) as f32,
                lammax: (centers[i] + above) as f32,
            }
        })
        .collect()
}

impl std::fmt::Debug for SpectrumSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumSource")
            .field("path", &self.summary.path())
            .field("spectra", &self.snids.len())
            .field("bins", &self.grid.len())
            .finish()
    }
}

