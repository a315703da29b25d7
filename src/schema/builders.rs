//! Declarative column rules.
//!
//! Each table kind has a static list of `(gate, column)` rules. Evaluating the list
//! against a [`ConfigSnapshot`] yields a canonical ordered [`Schema`]; the row filler
//! walks that same value, so declaration order and fill order cannot drift apart.

use super::{ColumnRegistry, ConfigSnapshot, SchemaError, SimModel, TableKind, TypeTag};

/// Where the row filler takes a column's value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The row's field of the same name
    Field,
    /// The row's field under another name
    Alias(&'static str),
    /// A field of the record that owns the row
    Owner(&'static str),
    /// First row of the block this row points to
    BlockFirst,
    /// Last row of the block this row points to
    BlockLast,
    /// Number of rows in the block this row points to
    BlockLen,
    /// Warp factor, capped and scaled to an integer in thousandths
    WarpMilli,
}

/// One column of an evaluated schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// Value type
    pub tag: TypeTag,
    /// Value source used by the row filler
    pub source: Source,
}

/// Ordered column list for one table kind, derived from a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: TableKind,
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Evaluate the rules of `kind` against a snapshot
    pub fn build(kind: TableKind, snapshot: &ConfigSnapshot) -> Self {
        let rules = match kind {
            TableKind::Header => HEADER_RULES,
            TableKind::Photometry => PHOTOMETRY_RULES,
            TableKind::SpectrumIndex => SPECTRUM_INDEX_RULES,
            TableKind::SpectrumSummary => SPECTRUM_SUMMARY_RULES,
            TableKind::SpectrumFlux => SPECTRUM_FLUX_RULES,
        };

        let mut columns = Vec::new();
        for rule in rules.iter().filter(|r| (r.gate)(snapshot)) {
            match rule.emit {
                Emit::One(name, tag, source) => columns.push(ColumnSpec {
                    name: name.to_string(),
                    tag,
                    source,
                }),
                Emit::PerFilter(prefix, tag) => {
                    for filter in snapshot.filter_chars() {
                        columns.push(ColumnSpec {
                            name: format!("{}{}", prefix, filter),
                            tag,
                            source: Source::Field,
                        });
                    }
                }
                Emit::Listed(names, tag) => {
                    for name in names(snapshot) {
                        columns.push(ColumnSpec {
                            name,
                            tag,
                            source: Source::Field,
                        });
                    }
                }
            }
        }

        log::debug!("{} schema has {} columns", kind, columns.len());
        Self { kind, columns }
    }

    /// Declare every column, in order, into a registry
    pub fn declare_into(&self, registry: &mut ColumnRegistry) -> Result<(), SchemaError> {
        for column in &self.columns {
            registry.declare(&column.name, column.tag)?;
        }
        Ok(())
    }

    /// Table kind
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Column names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Column spec by name
    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column passed its gate
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

type Gate = fn(&ConfigSnapshot) -> bool;
type Names = fn(&ConfigSnapshot) -> Vec<String>;

#[derive(Clone, Copy)]
enum Emit {
    One(&'static str, TypeTag, Source),
    PerFilter(&'static str, TypeTag),
    Listed(Names, TypeTag),
}

struct Rule {
    gate: Gate,
    emit: Emit,
}

const fn on(gate: Gate, emit: Emit) -> Rule {
    Rule { gate, emit }
}

const fn col(name: &'static str, tag: TypeTag) -> Emit {
    Emit::One(name, tag, Source::Field)
}

const fn computed(name: &'static str, tag: TypeTag, source: Source) -> Emit {
    Emit::One(name, tag, source)
}

const fn per_filter(prefix: &'static str, tag: TypeTag) -> Emit {
    Emit::PerFilter(prefix, tag)
}

const I16: TypeTag = TypeTag::I16;
const I32: TypeTag = TypeTag::I32;
const I64: TypeTag = TypeTag::I64;
const F32: TypeTag = TypeTag::F32;
const F64: TypeTag = TypeTag::F64;

const fn text(width: u16) -> TypeTag {
    TypeTag::FixedString(width)
}

// gates

fn always(_: &ConfigSnapshot) -> bool {
    true
}

fn subsurvey(c: &ConfigSnapshot) -> bool {
    c.subsurvey
}

fn not_sim(c: &ConfigSnapshot) -> bool {
    !c.is_sim()
}

fn data_only(c: &ConfigSnapshot) -> bool {
    c.is_data()
}

fn neighbors(c: &ConfigSnapshot) -> bool {
    c.has_neighbor_columns()
}

fn sim(c: &ConfigSnapshot) -> bool {
    c.is_sim()
}

fn sim_model(c: &ConfigSnapshot, model: SimModel) -> bool {
    c.is_sim() && c.sim.model == model
}

fn salt2(c: &ConfigSnapshot) -> bool {
    sim_model(c, SimModel::Salt2)
}

fn mlcs(c: &ConfigSnapshot) -> bool {
    sim_model(c, SimModel::Mlcs2k2)
}

fn snoopy(c: &ConfigSnapshot) -> bool {
    sim_model(c, SimModel::Snoopy)
}

fn simsed_params(c: &ConfigSnapshot) -> bool {
    sim_model(c, SimModel::Simsed) && c.sim.write_model_params
}

fn python_sed(c: &ConfigSnapshot) -> bool {
    c.is_sim() && c.sim.model.is_python_sed()
}

fn lclib(c: &ConfigSnapshot) -> bool {
    sim_model(c, SimModel::Lclib)
}

fn lclib_params(c: &ConfigSnapshot) -> bool {
    lclib(c) && c.sim.write_model_params
}

fn galaxy_fraction(c: &ConfigSnapshot) -> bool {
    c.is_sim() && c.sim.galaxy_fraction
}

fn strong_lens(c: &ConfigSnapshot) -> bool {
    c.is_sim() && c.sim.strong_lens
}

fn nea(c: &ConfigSnapshot) -> bool {
    c.photometry.nea_psf
}

fn not_nea(c: &ConfigSnapshot) -> bool {
    !c.photometry.nea_psf
}

fn full_mode(c: &ConfigSnapshot) -> bool {
    c.full_mode()
}

fn pixels(c: &ConfigSnapshot) -> bool {
    c.photometry.pixel_coords
}

fn observed_mag(c: &ConfigSnapshot) -> bool {
    c.is_sim() || c.is_magobs()
}

fn sim_full(c: &ConfigSnapshot) -> bool {
    c.is_sim() && c.full_mode()
}

fn lam_center(c: &ConfigSnapshot) -> bool {
    c.spectrograph.as_ref().is_some_and(|s| s.center_format)
}

fn lam_edges(c: &ConfigSnapshot) -> bool {
    !lam_center(c)
}

fn warp(c: &ConfigSnapshot) -> bool {
    c.spectrograph.as_ref().is_some_and(|s| s.warp)
}

// listed names

fn private_vars(c: &ConfigSnapshot) -> Vec<String> {
    c.private_vars.clone()
}

fn hostlib_params(c: &ConfigSnapshot) -> Vec<String> {
    c.sim.hostlib_params.clone()
}

fn model_params(c: &ConfigSnapshot) -> Vec<String> {
    c.sim.model_params.clone()
}

fn snr_monitor(c: &ConfigSnapshot) -> Vec<String> {
    c.sim
        .snr_monitor
        .map(|mag| format!("SIM_SNRMAG{:02}", mag))
        .into_iter()
        .collect()
}

static HEADER_RULES: &[Rule] = &[
    on(subsurvey, col("SUBSURVEY", text(40))),
    on(always, col("SNID", text(16))),
    on(always, col("IAUC", text(16))),
    on(always, col("FAKE", I16)),
    on(not_sim, col("MASK_FLUXCOR_SNANA", I16)),
    on(always, col("RA", F64)),
    on(always, col("DEC", F64)),
    on(always, col("PIXSIZE", F32)),
    on(always, col("NXPIX", I16)),
    on(always, col("NYPIX", I16)),
    on(always, col("SNTYPE", I32)),
    on(always, col("NOBS", I32)),
    on(always, computed("PTROBS_MIN", I32, Source::BlockFirst)),
    on(always, computed("PTROBS_MAX", I32, Source::BlockLast)),
    on(always, col("MWEBV", F32)),
    on(always, col("MWEBV_ERR", F32)),
    on(always, col("REDSHIFT_HELIO", F32)),
    on(always, col("REDSHIFT_HELIO_ERR", F32)),
    on(always, col("REDSHIFT_FINAL", F32)),
    on(always, col("REDSHIFT_FINAL_ERR", F32)),
    on(data_only, col("REDSHIFT_QUALITYFLAG", I16)),
    on(always, col("VPEC", F32)),
    on(always, col("VPEC_ERR", F32)),
    on(always, col("HOSTGAL_NMATCH", I16)),
    on(always, col("HOSTGAL_NMATCH2", I16)),
    on(always, col("HOSTGAL_OBJID", I64)),
    on(always, col("HOSTGAL_PHOTOZ", F32)),
    on(always, col("HOSTGAL_PHOTOZ_ERR", F32)),
    on(always, col("HOSTGAL_SPECZ", F32)),
    on(always, col("HOSTGAL_SPECZ_ERR", F32)),
    on(always, col("HOSTGAL_RA", F64)),
    on(always, col("HOSTGAL_DEC", F64)),
    on(always, col("HOSTGAL_SNSEP", F32)),
    on(always, col("HOSTGAL_DDLR", F32)),
    on(always, col("HOSTGAL_CONFUSION", F32)),
    on(always, col("HOSTGAL_LOGMASS", F32)),
    on(always, col("HOSTGAL_LOGMASS_ERR", F32)),
    on(always, col("HOSTGAL_sSFR", F32)),
    on(always, col("HOSTGAL_sSFR_ERR", F32)),
    on(always, per_filter("HOSTGAL_MAG_", F32)),
    on(always, per_filter("HOSTGAL_MAGERR_", F32)),
    on(neighbors, col("HOSTGAL2_OBJID", I64)),
    on(neighbors, col("HOSTGAL2_PHOTOZ", F32)),
    on(neighbors, col("HOSTGAL2_PHOTOZ_ERR", F32)),
    on(neighbors, col("HOSTGAL2_SPECZ", F32)),
    on(neighbors, col("HOSTGAL2_SPECZ_ERR", F32)),
    on(neighbors, col("HOSTGAL2_RA", F64)),
    on(neighbors, col("HOSTGAL2_DEC", F64)),
    on(neighbors, col("HOSTGAL2_SNSEP", F32)),
    on(neighbors, col("HOSTGAL2_DDLR", F32)),
    on(neighbors, col("HOSTGAL2_LOGMASS", F32)),
    on(neighbors, col("HOSTGAL2_LOGMASS_ERR", F32)),
    on(neighbors, col("HOSTGAL2_sSFR", F32)),
    on(neighbors, col("HOSTGAL2_sSFR_ERR", F32)),
    on(neighbors, per_filter("HOSTGAL2_MAG_", F32)),
    on(neighbors, per_filter("HOSTGAL2_MAGERR_", F32)),
    on(always, per_filter("HOSTGAL_SB_FLUXCAL_", F32)),
    on(always, col("PEAKMJD", F32)),
    on(always, col("SEARCH_TYPE", I32)),
    on(always, Emit::Listed(private_vars, F64)),
    on(sim, col("SIM_MODEL_NAME", text(32))),
    on(sim, col("SIM_MODEL_INDEX", I16)),
    on(sim, col("SIM_TYPE_INDEX", I16)),
    on(sim, col("SIM_TYPE_NAME", text(8))),
    on(sim, col("SIM_TEMPLATE_INDEX", I32)),
    on(sim, col("SIM_LIBID", I32)),
    on(sim, col("SIM_NGEN_LIBID", I32)),
    on(sim, col("SIM_NOBS_UNDEFINED", I32)),
    on(sim, col("SIM_SEARCHEFF_MASK", I32)),
    on(sim, col("SIM_REDSHIFT_HELIO", F32)),
    on(sim, col("SIM_REDSHIFT_CMB", F32)),
    on(sim, col("SIM_REDSHIFT_HOST", F32)),
    on(sim, col("SIM_REDSHIFT_FLAG", I16)),
    on(sim, col("SIM_VPEC", F32)),
    on(sim, col("SIM_HOSTLIB_GALID", I64)),
    on(sim, Emit::Listed(hostlib_params, F32)),
    on(sim, col("SIM_DLMU", F32)),
    on(sim, col("SIM_LENSDMU", F32)),
    on(sim, col("SIM_RA", F64)),
    on(sim, col("SIM_DEC", F64)),
    on(sim, col("SIM_MWEBV", F32)),
    on(sim, col("SIM_PEAKMJD", F32)),
    on(sim, col("SIM_MAGSMEAR_COH", F32)),
    on(sim, col("SIM_AV", F32)),
    on(sim, col("SIM_RV", F32)),
    on(salt2, col("SIM_SALT2x0", F32)),
    on(salt2, col("SIM_SALT2x1", F32)),
    on(salt2, col("SIM_SALT2c", F32)),
    on(salt2, col("SIM_SALT2mB", F32)),
    on(salt2, col("SIM_SALT2alpha", F32)),
    on(salt2, col("SIM_SALT2beta", F32)),
    on(salt2, col("SIM_SALT2gammaDM", F32)),
    on(mlcs, col("SIM_DELTA", F32)),
    on(snoopy, col("SIM_STRETCH", F32)),
    // SIMSED records keep their amplitude under SIM_SALT2x0 in memory
    on(simsed_params, computed("SIMSED_SALT2x0", F32, Source::Alias("SIM_SALT2x0"))),
    on(simsed_params, Emit::Listed(model_params, F32)),
    on(python_sed, Emit::Listed(model_params, F32)),
    on(lclib_params, Emit::Listed(model_params, F32)),
    on(sim, per_filter("SIM_PEAKMAG_", F32)),
    on(lclib, per_filter("SIM_TEMPLATEMAG_", F32)),
    on(sim, per_filter("SIM_EXPOSURE_", F32)),
    on(galaxy_fraction, per_filter("SIM_GALFRAC_", F32)),
    on(strong_lens, col("SIM_STRONGLENS_ID", I32)),
    on(strong_lens, col("SIM_STRONGLENS_z", F32)),
    on(strong_lens, col("SIM_STRONGLENS_TDELAY", F32)),
    on(strong_lens, col("SIM_STRONGLENS_MAGSHIFT", F32)),
    on(strong_lens, col("SIM_STRONGLENS_NIMG", I16)),
    on(strong_lens, col("SIM_STRONGLENS_IMGNUM", I16)),
    on(sim, col("SIM_SUBSAMPLE_INDEX", I16)),
];

static PHOTOMETRY_RULES: &[Rule] = &[
    on(always, col("MJD", F64)),
    on(always, col("BAND", text(2))),
    on(always, col("CCDNUM", I16)),
    on(always, col("FIELD", text(12))),
    on(always, col("PHOTFLAG", I32)),
    on(always, col("PHOTPROB", F32)),
    on(always, col("FLUXCAL", F32)),
    on(always, col("FLUXCALERR", F32)),
    on(nea, col("PSF_NEA", F32)),
    on(not_nea, col("PSF_SIG1", F32)),
    on(not_nea, col("PSF_SIG2", F32)),
    on(not_nea, col("PSF_RATIO", F32)),
    on(always, col("SKY_SIG", F32)),
    on(full_mode, col("SKY_SIG_T", F32)),
    on(full_mode, col("RDNOISE", F32)),
    on(always, col("ZEROPT", F32)),
    on(full_mode, col("ZEROPT_ERR", F32)),
    on(full_mode, col("GAIN", F32)),
    on(pixels, col("XPIX", F32)),
    on(pixels, col("YPIX", F32)),
    on(observed_mag, col("SIM_MAGOBS", F32)),
    on(sim_full, col("SIM_FLUXCAL_HOSTERR", F32)),
    on(sim, Emit::Listed(snr_monitor, F32)),
];

static SPECTRUM_INDEX_RULES: &[Rule] = &[
    on(always, col("LAMINDEX", I32)),
    on(lam_center, col("LAMCEN", F32)),
    on(lam_edges, col("LAMMIN", F32)),
    on(lam_edges, col("LAMMAX", F32)),
];

static SPECTRUM_SUMMARY_RULES: &[Rule] = &[
    on(always, computed("SNID", text(16), Source::Owner("SNID"))),
    on(always, col("MJD", F64)),
    on(always, col("Texpose", F32)),
    on(always, col("SNR_COMPUTE", F32)),
    on(always, col("LAMMIN_SNR", F32)),
    on(always, col("LAMMAX_SNR", F32)),
    on(always, computed("NBIN_LAM", I16, Source::BlockLen)),
    on(always, computed("PTRSPEC_MIN", I32, Source::BlockFirst)),
    on(always, computed("PTRSPEC_MAX", I32, Source::BlockLast)),
];

static SPECTRUM_FLUX_RULES: &[Rule] = &[
    on(always, col("LAMINDEX", I16)),
    on(always, col("FLAM", F32)),
    on(always, col("FLAMERR", F32)),
    on(sim, col("SIM_FLAM", F32)),
    on(warp, computed("SIM_WARP", I16, Source::WarpMilli)),
];
