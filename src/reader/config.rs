use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ReadError;

/// Configuration for reading snpack containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Open the spectrum container of each partition when the run has one
    pub read_spectra: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { read_spectra: true }
    }
}

impl ReaderConfig {
    /// Configuration that never opens spectrum containers
    pub fn without_spectra() -> Self {
        Self {
            read_spectra: false,
        }
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ReadError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReadError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| ReadError::InvalidConfig(e.to_string()))
    }
}
