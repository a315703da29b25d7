//! Configuration snapshot that decides which optional columns exist.
//!
//! A snapshot is captured once per production run and handed to the writer by
//! value; nothing mutates it afterwards. It is not stored verbatim: its effects are
//! recoverable from the stored columns plus the global keys.
//!
//! ```toml
//! survey = "LSST"
//! filters = "ugrizY"
//! data_kind = "SIM_SNANA"
//!
//! [sim]
//! model = "SALT2"
//! model_name = "SALT2.P22"
//!
//! [spectrograph]
//! instrument = "PRISM"
//! wavelength_bins = [{ lammin = 4000.0, lammax = 4010.0 }]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SchemaError;

/// Kind of records in a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataKind {
    /// Real observations
    #[default]
    Data,
    /// Simulation with full model metadata
    SimSnana,
    /// Data-like simulation carrying only observed magnitudes
    SimMagobs,
}

impl DataKind {
    /// Value of the `DATATYPE` global key
    pub fn tag(self) -> &'static str {
        match self {
            DataKind::Data => "DATA",
            DataKind::SimSnana => "SIM_SNANA",
            DataKind::SimMagobs => "SIM_MAGOBS",
        }
    }

    /// Parse a `DATATYPE` value
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "DATA" => Some(DataKind::Data),
            "SIM_SNANA" => Some(DataKind::SimSnana),
            "SIM_MAGOBS" => Some(DataKind::SimMagobs),
            _ => None,
        }
    }
}

/// Generative model of a simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimModel {
    /// SALT2 family
    Salt2,
    /// MLCS2k2
    Mlcs2k2,
    /// SNooPy
    Snoopy,
    /// Grid of spectral energy distributions
    Simsed,
    /// Python SED model BYOSED
    Byosed,
    /// Python SED model SNEMO
    Snemo,
    /// Light-curve library
    Lclib,
    /// Any model without dedicated columns
    #[default]
    Other,
}

impl SimModel {
    /// Whether the model is one of the Python SED models
    pub fn is_python_sed(self) -> bool {
        matches!(self, SimModel::Byosed | SimModel::Snemo)
    }
}

/// Simulation settings; ignored unless the data kind is [`DataKind::SimSnana`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Active generative model
    pub model: SimModel,
    /// Model name written to the global keys
    pub model_name: String,
    /// Column names of the model-specific parameters
    pub model_params: Vec<String>,
    /// Whether SIMSED and LCLIB parameters are written
    pub write_model_params: bool,
    /// Column names of the host-library parameters
    pub hostlib_params: Vec<String>,
    /// Whether per-filter host galaxy flux fractions are written
    pub galaxy_fraction: bool,
    /// Whether strong-lens columns are written
    pub strong_lens: bool,
    /// Magnitude at which the SNR is monitored, if any
    pub snr_monitor: Option<i32>,
    /// Number of subsample marks
    pub nsubsample_mark: i32,
    /// SIMLIB file name
    pub simlib_file: String,
    /// SIMLIB mask option
    pub simlib_mskopt: i32,
    /// HOSTLIB file name
    pub hostlib_file: String,
    /// Milky Way color law option
    pub mw_color_law: i32,
    /// Milky Way RV
    pub mw_rv: f32,
    /// Milky Way extinction option
    pub mwebv_option: i32,
    /// Flux error model option
    pub fluxerr_option: i32,
}

/// Photometry column toggles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotometryOptions {
    /// PSF given as a noise-equivalent area instead of sigma/ratio
    pub nea_psf: bool,
    /// Whether pixel coordinates are written
    pub pixel_coords: bool,
}

/// One wavelength bin of the spectrograph grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavelengthBin {
    /// Lower edge
    pub lammin: f32,
    /// Upper edge
    pub lammax: f32,
}

impl WavelengthBin {
    /// Bin centre
    pub fn center(&self) -> f32 {
        0.5 * (self.lammin + self.lammax)
    }
}

/// Spectrograph settings; spectra are written only when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrographOptions {
    /// Instrument name
    pub instrument: String,
    /// Wavelength grid
    pub wavelength_bins: Vec<WavelengthBin>,
    /// Store bin centres instead of edges in the wavelength index table
    pub center_format: bool,
    /// Whether the simulated warp factor is written
    pub warp: bool,
}

/// Capability flags and optional parameter groups for one production run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSnapshot {
    /// Survey name
    pub survey: String,
    /// Filter list, one character per filter
    pub filters: String,
    /// Kind of records
    pub data_kind: DataKind,
    /// Omit the full-mode-only photometry columns
    pub compact: bool,
    /// Records carry a sub-survey name
    pub subsurvey: bool,
    /// Host library provides a neighbor list
    pub neighbor_hosts: bool,
    /// Milky Way extinction was applied to fluxes
    pub mwebv_applied: bool,
    /// Column names of private variables
    pub private_vars: Vec<String>,
    /// Photometry toggles
    pub photometry: PhotometryOptions,
    /// Simulation settings
    pub sim: SimOptions,
    /// Spectrograph settings
    pub spectrograph: Option<SpectrographOptions>,
}

impl ConfigSnapshot {
    /// Snapshot for real data with the given survey and filters
    pub fn data(survey: &str, filters: &str) -> Self {
        Self {
            survey: survey.to_string(),
            filters: filters.to_string(),
            ..Default::default()
        }
    }

    /// Snapshot for a full simulation with the given survey and filters
    pub fn simulation(survey: &str, filters: &str) -> Self {
        Self {
            data_kind: DataKind::SimSnana,
            ..Self::data(survey, filters)
        }
    }

    /// Load a snapshot from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SchemaError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a snapshot from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, SchemaError> {
        toml::from_str(content).map_err(|e| SchemaError::InvalidConfig(e.to_string()))
    }

    /// Full simulation
    pub fn is_sim(&self) -> bool {
        self.data_kind == DataKind::SimSnana
    }

    /// Data-like simulation
    pub fn is_magobs(&self) -> bool {
        self.data_kind == DataKind::SimMagobs
    }

    /// Real data
    pub fn is_data(&self) -> bool {
        self.data_kind == DataKind::Data
    }

    /// Full-mode-only columns are written
    pub fn full_mode(&self) -> bool {
        !self.compact
    }

    /// Second host galaxy block is written
    pub fn has_neighbor_columns(&self) -> bool {
        !self.is_sim() || self.neighbor_hosts
    }

    /// Spectrum tables are written
    pub fn has_spectra(&self) -> bool {
        self.spectrograph.is_some()
    }

    /// Filter characters in list order
    pub fn filter_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.filters.chars().filter(|c| !c.is_whitespace())
    }
}
