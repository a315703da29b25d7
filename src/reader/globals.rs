//! Global keys of a header container, parsed into a typed view.

use std::path::Path;

use crate::schema::keys;
use crate::schema::{DataKind, FIRST_ZERO_BASED_PARAM_VERSION};
use crate::store::{GlobalKeys, MetaValue};

use super::ReadError;

const DEFAULT_CODE_VERSION: i64 = 1;
const UNKNOWN_VERSION: &str = "UNKNOWN";

/// Run-level description recovered from the global keys.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalInfo {
    /// `CODE_IVERSION`, 1 when absent
    pub code_version: i64,
    /// `SNANA_VERSION`, `UNKNOWN` when absent
    pub tool_version: String,
    /// `SURVEY`
    pub survey: String,
    /// `SUBSURVEY_FLAG`
    pub subsurvey: bool,
    /// `FILTERS`
    pub filters: String,
    /// `DATATYPE`
    pub data_kind: DataKind,
    /// `PHOTFILE`
    pub photometry_file: String,
    /// `SPECFILE`
    pub spectrum_file: Option<String>,
    /// Private variable names, in key order
    pub private_vars: Vec<String>,
    /// Key prefix of the model parameter list, if the run wrote one
    pub model_prefix: Option<String>,
    /// Model parameter names
    pub model_params: Vec<String>,
    /// Host library parameter names
    pub hostlib_params: Vec<String>,
}

impl GlobalInfo {
    /// Parse the keys of the header container at `path`
    pub fn from_keys(global: &GlobalKeys, path: &Path) -> Result<Self, ReadError> {
        let required = |key: &'static str| -> Result<String, ReadError> {
            global
                .get(key)
                .map(MetaValue::to_string)
                .ok_or_else(|| ReadError::MissingGlobalKey {
                    key,
                    path: path.display().to_string(),
                })
        };
        let text = |key: &str| global.get(key).map(MetaValue::to_string);
        let int = |key: &str| global.get(key).and_then(MetaValue::as_i64);

        let survey = required(keys::SURVEY)?;
        let filters = required(keys::FILTERS)?;
        let photometry_file = required(keys::PHOTFILE)?;
        let datatype = required(keys::DATATYPE)?;
        let data_kind =
            DataKind::from_tag(&datatype).ok_or_else(|| ReadError::InvalidGlobalKey {
                key: keys::DATATYPE,
                value: datatype.clone(),
                path: path.display().to_string(),
            })?;

        let code_version = int(keys::CODE_IVERSION).unwrap_or(DEFAULT_CODE_VERSION);
        let first = if code_version < FIRST_ZERO_BASED_PARAM_VERSION {
            1
        } else {
            0
        };

        let private_vars = (1..=int(keys::NPRIVATE).unwrap_or(0).max(0) as usize)
            .filter_map(|i| text(&keys::private(i)))
            .collect();

        let model_prefix = text(keys::PYSEDMODEL)
            .or_else(|| text(keys::SIMSED_MODEL).map(|_| keys::SIMSED.to_string()))
            .or_else(|| text(keys::LCLIB_MODEL).map(|_| keys::LCLIB.to_string()));
        let model_params = model_prefix
            .as_deref()
            .map(|prefix| param_list(global, prefix, first))
            .unwrap_or_default();

        Ok(Self {
            code_version,
            tool_version: text(keys::SNANA_VERSION).unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            survey,
            subsurvey: int(keys::SUBSURVEY_FLAG).unwrap_or(0) != 0,
            filters,
            data_kind,
            photometry_file,
            spectrum_file: text(keys::SPECFILE).filter(|name| !name.trim().is_empty()),
            private_vars,
            model_prefix,
            model_params,
            hostlib_params: param_list(global, keys::SIM_HOSTLIB, first),
        })
    }
}

/// Names stored under `{prefix}_PARnn`, numbered from `first`
fn param_list(global: &GlobalKeys, prefix: &str, first: usize) -> Vec<String> {
    let count = global
        .get(&keys::npar(prefix))
        .and_then(MetaValue::as_i64)
        .unwrap_or(0)
        .max(0) as usize;
    (first..first + count)
        .filter_map(|i| global.get(&keys::par(prefix, i)).map(MetaValue::to_string))
        .collect()
}
