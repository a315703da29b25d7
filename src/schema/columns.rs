//! Column and global key names shared by the writer and the reader.
//!
//! Only names that code refers to directly live here. Optional columns that are
//! emitted purely by the declarative rules in the builder are spelled out there.

/// Sub-survey name, the only string column allowed to be blank
pub const SUBSURVEY: &str = "SUBSURVEY";
/// Object identifier
pub const SNID: &str = "SNID";
/// Fake/real flag
pub const FAKE: &str = "FAKE";
/// Number of photometry epochs owned by a record
pub const NOBS: &str = "NOBS";
/// First photometry row of a record (1-based)
pub const PTROBS_MIN: &str = "PTROBS_MIN";
/// Last photometry row of a record (1-based)
pub const PTROBS_MAX: &str = "PTROBS_MAX";
/// Current redshift column
pub const REDSHIFT_FINAL: &str = "REDSHIFT_FINAL";
/// Current redshift uncertainty column
pub const REDSHIFT_FINAL_ERR: &str = "REDSHIFT_FINAL_ERR";
/// Legacy redshift column, read only when `REDSHIFT_FINAL` is absent
pub const REDSHIFT_CMB: &str = "REDSHIFT_CMB";
/// Legacy redshift uncertainty column
pub const REDSHIFT_CMB_ERR: &str = "REDSHIFT_CMB_ERR";
/// Simulated SALT2 amplitude
pub const SIM_SALT2X0: &str = "SIM_SALT2x0";

/// Observation date
pub const MJD: &str = "MJD";
/// Filter band
pub const BAND: &str = "BAND";
/// Legacy spelling of the filter band column
pub const FLT: &str = "FLT";
/// Field name
pub const FIELD: &str = "FIELD";
/// Calibrated flux
pub const FLUXCAL: &str = "FLUXCAL";
/// Calibrated flux uncertainty
pub const FLUXCALERR: &str = "FLUXCALERR";

/// Wavelength bin index
pub const LAMINDEX: &str = "LAMINDEX";
/// Wavelength bin lower edge
pub const LAMMIN: &str = "LAMMIN";
/// Wavelength bin upper edge
pub const LAMMAX: &str = "LAMMAX";
/// Wavelength bin centre
pub const LAMCEN: &str = "LAMCEN";
/// Number of valid wavelength bins in one spectrum
pub const NBIN_LAM: &str = "NBIN_LAM";
/// First flux row of a spectrum (1-based)
pub const PTRSPEC_MIN: &str = "PTRSPEC_MIN";
/// Last flux row of a spectrum (1-based)
pub const PTRSPEC_MAX: &str = "PTRSPEC_MAX";
/// Spectral flux density
pub const FLAM: &str = "FLAM";
/// Spectral flux density uncertainty
pub const FLAMERR: &str = "FLAMERR";
/// Simulated true flux density
pub const SIM_FLAM: &str = "SIM_FLAM";
/// Simulated warp factor
pub const SIM_WARP: &str = "SIM_WARP";

/// Columns every header table must carry
pub const REQUIRED_HEADER_COLUMNS: [&str; 5] = [SNID, FAKE, NOBS, PTROBS_MIN, PTROBS_MAX];

/// Global metadata key names
pub mod keys {
    /// Format version integer
    pub const CODE_IVERSION: &str = "CODE_IVERSION";
    /// Producing tool version string
    pub const SNANA_VERSION: &str = "SNANA_VERSION";
    /// Survey name
    pub const SURVEY: &str = "SURVEY";
    /// Whether records carry a sub-survey name
    pub const SUBSURVEY_FLAG: &str = "SUBSURVEY_FLAG";
    /// Whether Milky Way extinction was applied to fluxes
    pub const MWEBV_APPLYFLAG: &str = "MWEBV_APPLYFLAG";
    /// Filter list, one character per filter
    pub const FILTERS: &str = "FILTERS";
    /// Data kind tag
    pub const DATATYPE: &str = "DATATYPE";
    /// Photometry container file name
    pub const PHOTFILE: &str = "PHOTFILE";
    /// Spectrum container file name
    pub const SPECFILE: &str = "SPECFILE";
    /// Creation timestamp
    pub const CREATED: &str = "CREATED";
    /// Number of private variables
    pub const NPRIVATE: &str = "NPRIVATE";
    /// Prefix of the 1-based private variable keys
    pub const PRIVATE: &str = "PRIVATE";
    /// SIMLIB file name
    pub const SIMLIB_FILE: &str = "SIMLIB_FILE";
    /// SIMLIB mask option
    pub const SIMLIB_MSKOPT: &str = "SIMLIB_MSKOPT";
    /// HOSTLIB file name
    pub const HOSTLIB_FILE: &str = "HOSTLIB_FILE";
    /// Milky Way color law option
    pub const SIMOPT_MWCOLORLAW: &str = "SIMOPT_MWCOLORLAW";
    /// Milky Way RV
    pub const SIM_MWRV: &str = "SIM_MWRV";
    /// Milky Way extinction option
    pub const SIMOPT_MWEBV: &str = "SIMOPT_MWEBV";
    /// Flux error model option
    pub const SIMOPT_FLUXERR: &str = "SIMOPT_FLUXERR";
    /// Spectrograph instrument name
    pub const SPECTROGRAPH_INSTRUMENT: &str = "SPECTROGRAPH_INSTRUMENT";
    /// SIMSED model name
    pub const SIMSED_MODEL: &str = "SIMSED_MODEL";
    /// Python SED model name
    pub const PYSEDMODEL: &str = "PySEDMODEL";
    /// LCLIB model name
    pub const LCLIB_MODEL: &str = "LCLIB_MODEL";
    /// Prefix of the SIMSED parameter list
    pub const SIMSED: &str = "SIMSED";
    /// Prefix of the LCLIB parameter list
    pub const LCLIB: &str = "LCLIB";
    /// Prefix of the HOSTLIB parameter list
    pub const SIM_HOSTLIB: &str = "SIM_HOSTLIB";
    /// Number of subsample marks
    pub const SIM_NSUBSAMPLE_MARK: &str = "SIM_NSUBSAMPLE_MARK";
    /// Name of the SNR monitor column
    pub const SIM_VARNAME_SNRMON: &str = "SIM_VARNAME_SNRMON";
    /// Strong lens flag
    pub const SIM_SL_FLAG: &str = "SIM_SL_FLAG";

    /// `{prefix}_NPAR`
    pub fn npar(prefix: &str) -> String {
        format!("{}_NPAR", prefix)
    }

    /// `{prefix}_PAR{index:02}`
    pub fn par(prefix: &str, index: usize) -> String {
        format!("{}_PAR{:02}", prefix, index)
    }

    /// `PRIVATE{index}`, 1-based
    pub fn private(index: usize) -> String {
        format!("{}{}", PRIVATE, index)
    }
}
