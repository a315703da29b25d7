use crate::record::{Epoch, FieldBag, SnEvent, SpectrumEpoch};
use crate::schema::{columns, DataKind};

use super::{ReadCount, ReadError, SnPackReader};

/// `FAKE` value reported for data-like simulations stored with `FAKE = 0`
const FAKES_OVERLAID: i16 = 2;

impl SnPackReader {
    /// Read one record into the same shape the writer consumes.
    ///
    /// Header fields go through the parameter accessor; epochs are bulk-loaded
    /// from the record's photometry block. Epochs excluded by the epoch mask are
    /// kept but flagged as not written. Spectra are attached when the partition
    /// has a spectrum container open.
    pub fn read_event(&mut self, isn: usize) -> Result<SnEvent, ReadError> {
        let local = self.ensure_partition(isn)?;
        let names: Vec<String> = match self.current.as_ref() {
            Some(part) => part.header_index.names().map(str::to_string).collect(),
            None => Vec::new(),
        };

        let mut event = SnEvent::default();
        for name in &names {
            let (count, values) = self.read_param(isn, name)?;
            if let (ReadCount::Values(_), Some(value)) = (count, values.into_iter().next()) {
                event.header.set(name, value);
            }
        }
        self.apply_header_fallbacks(&mut event.header);

        event.epochs = self.load_epochs(isn, local)?;

        let Some(part) = self.current.as_ref() else {
            return Ok(event);
        };
        let snid = event.snid().map(str::to_string);
        if let (Some(spectra), Some(snid)) = (part.spectra.as_ref(), snid) {
            for row in spectra.rows_of(&snid) {
                event.spectra.push(spectra.read(row, part.number)?);
            }
        }
        Ok(event)
    }

    fn apply_header_fallbacks(&self, header: &mut FieldBag) {
        if !header.contains(columns::REDSHIFT_FINAL) {
            let legacy = [
                (columns::REDSHIFT_CMB, columns::REDSHIFT_FINAL),
                (columns::REDSHIFT_CMB_ERR, columns::REDSHIFT_FINAL_ERR),
            ];
            for (old, new) in legacy {
                if let Some(value) = header.get(old).cloned() {
                    header.set(new, value);
                }
            }
        }

        let magobs = self
            .current
            .as_ref()
            .is_some_and(|p| p.globals.data_kind == DataKind::SimMagobs);
        if magobs && header.i64(columns::FAKE) == Some(0) {
            header.set(columns::FAKE, FAKES_OVERLAID);
        }
    }

    fn load_epochs(&mut self, isn: usize, local: usize) -> Result<Vec<Epoch>, ReadError> {
        let Some(part) = self.current.as_ref() else {
            return Ok(Vec::new());
        };
        let block = part.epoch_block(&self.header_buf, local)?;
        let keep = self.mask.flags(block.len(), columns::NOBS, isn)?;
        self.phot_buf.fill(&part.phot, &part.phot_index, block)?;

        let epochs = keep
            .iter()
            .enumerate()
            .map(|(i, write)| {
                let row = i + 1;
                let mut fields = FieldBag::new();
                for (column, name, _) in part.phot_index.iter() {
                    let name = if name == columns::FLT { columns::BAND } else { name };
                    if let Some(value) = self.phot_buf.value(&part.phot_index, column, row) {
                        fields.set(name, value);
                    }
                }
                Epoch {
                    fields,
                    write: *write,
                }
            })
            .collect();
        Ok(epochs)
    }

    /// 1-based spectrum summary rows of a record
    pub fn spectrum_rows(&mut self, isn: usize) -> Result<Vec<usize>, ReadError> {
        let local = self.ensure_partition(isn)?;
        let Some(part) = self.current.as_ref() else {
            return Ok(Vec::new());
        };
        let spectra = part
            .spectra
            .as_ref()
            .ok_or(ReadError::SpectraUnavailable {
                partition: part.number,
            })?;
        let snid = self
            .header_buf
            .value(&part.header_index, part.required.snid, local)
            .map(|v| v.to_string())
            .unwrap_or_default();
        Ok(spectra.rows_of(&snid))
    }

    /// Summary fields and flux bins of one spectrum in the partition owning `isn`
    pub fn read_spectrum(&mut self, isn: usize, row: usize) -> Result<SpectrumEpoch, ReadError> {
        self.ensure_partition(isn)?;
        let Some(part) = self.current.as_ref() else {
            return Err(ReadError::SpectraUnavailable { partition: 0 });
        };
        let spectra = part
            .spectra
            .as_ref()
            .ok_or(ReadError::SpectraUnavailable {
                partition: part.number,
            })?;
        spectra.read(row, part.number)
    }
}

