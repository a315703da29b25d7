//! In-memory records exchanged with the writer and reader.
//!
//! A record is a bag of named values: the core never interprets a field beyond
//! reading it by column name, so a bag keeps the column set open-ended.

mod value;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

pub use value::Value;

use crate::schema::columns;

/// Named values of one row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBag {
    fields: BTreeMap<String, Value>,
}

impl FieldBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Builder-style [`FieldBag::set`]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Remove a field
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Whether a field is present
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Numeric field widened to `f64`
    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Numeric field as `i64`
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// String field
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the bag holds no field
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One light-curve epoch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Epoch {
    /// Photometry fields
    pub fields: FieldBag,
    /// Whether the epoch is persisted; epochs held only in memory are skipped
    pub write: bool,
}

impl Epoch {
    /// Epoch that will be written
    pub fn new(fields: FieldBag) -> Self {
        Self {
            fields,
            write: true,
        }
    }

    /// Epoch kept in memory but not written
    pub fn skipped(fields: FieldBag) -> Self {
        Self {
            fields,
            write: false,
        }
    }
}

/// One spectrum of a record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumEpoch {
    /// Summary fields (`MJD`, `Texpose`, `SNR_COMPUTE`, ...)
    pub fields: FieldBag,
    /// Wavelength bins, each with `LAMINDEX`, `FLAM`, `FLAMERR` and optional sim fields
    pub bins: Vec<FieldBag>,
    /// Whether the spectrum is left out of the container
    pub skip: bool,
}

impl SpectrumEpoch {
    /// Spectrum observed at `mjd`
    pub fn new(mjd: f64) -> Self {
        Self {
            fields: FieldBag::new().with(columns::MJD, mjd),
            ..Default::default()
        }
    }

    /// Append a wavelength bin and return it for further fields
    pub fn push_bin(&mut self, lamindex: i32, flam: f32, flamerr: f32) -> &mut FieldBag {
        let bin = FieldBag::new()
            .with(columns::LAMINDEX, lamindex)
            .with(columns::FLAM, flam)
            .with(columns::FLAMERR, flamerr);
        self.bins.push(bin);
        let last = self.bins.len() - 1;
        &mut self.bins[last]
    }

    /// Bins with a positive error, the only ones persisted
    pub fn valid_bins(&self) -> impl Iterator<Item = &FieldBag> {
        self.bins
            .iter()
            .filter(|bin| bin.f64(columns::FLAMERR).is_some_and(|err| err > 0.0))
    }
}

/// One astronomical object: header fields, epochs and optional spectra
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnEvent {
    /// Header fields
    pub header: FieldBag,
    /// Light-curve epochs in time order
    pub epochs: Vec<Epoch>,
    /// Spectra in time order
    pub spectra: Vec<SpectrumEpoch>,
}

impl SnEvent {
    /// Event with the given identifier
    pub fn new(snid: &str) -> Self {
        Self {
            header: FieldBag::new().with(columns::SNID, snid),
            ..Default::default()
        }
    }

    /// Object identifier
    pub fn snid(&self) -> Option<&str> {
        self.header.str(columns::SNID)
    }

    /// Append an epoch that will be written and keep `NOBS` in step
    pub fn push_epoch(&mut self, fields: FieldBag) {
        self.epochs.push(Epoch::new(fields));
        self.sync_nobs();
    }

    /// Set `NOBS` to the number of epochs flagged for writing
    pub fn sync_nobs(&mut self) {
        let nobs = self.written_epochs().count() as i32;
        self.header.set(columns::NOBS, nobs);
    }

    /// Declared observation count
    pub fn declared_nobs(&self) -> i64 {
        self.header.i64(columns::NOBS).unwrap_or(0)
    }

    /// Epochs flagged for writing, in order
    pub fn written_epochs(&self) -> impl Iterator<Item = &Epoch> {
        self.epochs.iter().filter(|e| e.write)
    }
}
