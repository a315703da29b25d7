//! Global metadata keys written to the header container.
//!
//! The keys are the only durable description of the snapshot: a reader recovers
//! parameter-group names and counts from them, and everything else from the
//! stored columns.

use chrono::{SecondsFormat, Utc};

use crate::schema::keys;
use crate::schema::{ConfigSnapshot, SimModel, CODE_VERSION};
use crate::store::{MetaValue, TableSink};

use super::WriterConfig;

/// File names of the sibling containers of a run
#[derive(Debug, Clone)]
pub(crate) struct SiblingFiles {
    pub photometry: String,
    pub spectra: Option<String>,
}

/// Write the global keys of a run
pub(crate) fn write_globals<S: TableSink + ?Sized>(
    sink: &mut S,
    snapshot: &ConfigSnapshot,
    config: &WriterConfig,
    files: &SiblingFiles,
) {
    sink.set_key(keys::CODE_IVERSION, MetaValue::Int(CODE_VERSION));
    sink.set_key(keys::SNANA_VERSION, config.tool_version.as_str().into());
    sink.set_key(keys::SURVEY, snapshot.survey.as_str().into());
    sink.set_key(keys::SUBSURVEY_FLAG, snapshot.subsurvey.into());
    sink.set_key(keys::MWEBV_APPLYFLAG, snapshot.mwebv_applied.into());
    sink.set_key(keys::FILTERS, snapshot.filters.as_str().into());
    sink.set_key(keys::DATATYPE, snapshot.data_kind.tag().into());
    sink.set_key(keys::PHOTFILE, files.photometry.as_str().into());
    if let Some(spec) = &files.spectra {
        sink.set_key(keys::SPECFILE, spec.as_str().into());
    }
    sink.set_key(
        keys::CREATED,
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true).into(),
    );

    sink.set_key(keys::NPRIVATE, snapshot.private_vars.len().into());
    for (i, name) in snapshot.private_vars.iter().enumerate() {
        sink.set_key(&keys::private(i + 1), name.as_str().into());
    }

    if snapshot.is_sim() {
        write_simulation_keys(sink, snapshot);
    }
}

fn write_simulation_keys<S: TableSink + ?Sized>(sink: &mut S, snapshot: &ConfigSnapshot) {
    let sim = &snapshot.sim;
    sink.set_key(keys::SIMLIB_FILE, sim.simlib_file.as_str().into());
    sink.set_key(keys::SIMLIB_MSKOPT, sim.simlib_mskopt.into());
    sink.set_key(keys::HOSTLIB_FILE, sim.hostlib_file.as_str().into());
    sink.set_key(keys::SIMOPT_MWCOLORLAW, sim.mw_color_law.into());
    sink.set_key(keys::SIM_MWRV, sim.mw_rv.into());
    sink.set_key(keys::SIMOPT_MWEBV, sim.mwebv_option.into());
    sink.set_key(keys::SIMOPT_FLUXERR, sim.fluxerr_option.into());
    if let Some(spectrograph) = &snapshot.spectrograph {
        sink.set_key(
            keys::SPECTROGRAPH_INSTRUMENT,
            spectrograph.instrument.as_str().into(),
        );
    }

    match sim.model {
        SimModel::Simsed if sim.write_model_params => {
            sink.set_key(keys::SIMSED_MODEL, sim.model_name.as_str().into());
            write_param_list(sink, keys::SIMSED, &sim.model_params);
        }
        SimModel::Byosed | SimModel::Snemo => {
            let prefix = python_sed_prefix(sim.model);
            sink.set_key(keys::PYSEDMODEL, prefix.into());
            write_param_list(sink, prefix, &sim.model_params);
        }
        SimModel::Lclib if sim.write_model_params => {
            sink.set_key(keys::LCLIB_MODEL, sim.model_name.as_str().into());
            write_param_list(sink, keys::LCLIB, &sim.model_params);
        }
        _ => {}
    }

    write_param_list(sink, keys::SIM_HOSTLIB, &sim.hostlib_params);
    sink.set_key(keys::SIM_NSUBSAMPLE_MARK, sim.nsubsample_mark.into());
    if let Some(mag) = sim.snr_monitor {
        sink.set_key(keys::SIM_VARNAME_SNRMON, format!("SIM_SNRMAG{:02}", mag).into());
    }
    sink.set_key(keys::SIM_SL_FLAG, sim.strong_lens.into());
}

/// Key prefix of a Python SED model's parameter list
pub(crate) fn python_sed_prefix(model: SimModel) -> &'static str {
    match model {
        SimModel::Snemo => "SNEMO",
        _ => "BYOSED",
    }
}

/// `{prefix}_NPAR` and the 0-based `{prefix}_PARnn` keys.
///
/// The key value is the column name of the parameter.
fn write_param_list<S: TableSink + ?Sized>(sink: &mut S, prefix: &str, names: &[String]) {
    sink.set_key(&keys::npar(prefix), names.len().into());
    for (i, name) in names.iter().enumerate() {
        sink.set_key(&keys::par(prefix, i), name.as_str().into());
    }
}
