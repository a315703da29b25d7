use super::*;
use std::collections::BTreeSet;

fn names(kind: TableKind, snapshot: &ConfigSnapshot) -> Vec<String> {
    Schema::build(kind, snapshot)
        .columns()
        .iter()
        .map(|c| c.name.clone())
        .collect()
}

fn difference(a: &[String], b: &[String]) -> BTreeSet<String> {
    let a: BTreeSet<_> = a.iter().cloned().collect();
    let b: BTreeSet<_> = b.iter().cloned().collect();
    a.symmetric_difference(&b).cloned().collect()
}

#[test]
fn test_form_classification() {
    assert_eq!(TypeTag::from_form("16A"), Some(TypeTag::FixedString(16)));
    assert_eq!(TypeTag::from_form("A"), Some(TypeTag::FixedString(1)));
    assert_eq!(TypeTag::from_form("1I"), Some(TypeTag::I16));
    assert_eq!(TypeTag::from_form("1J"), Some(TypeTag::I32));
    assert_eq!(TypeTag::from_form("1K"), Some(TypeTag::I64));
    assert_eq!(TypeTag::from_form("1E"), Some(TypeTag::F32));
    assert_eq!(TypeTag::from_form(" 1D "), Some(TypeTag::F64));
    assert_eq!(TypeTag::from_form("2J"), None);
    assert_eq!(TypeTag::from_form("xA"), None);

    for tag in [
        TypeTag::FixedString(40),
        TypeTag::I16,
        TypeTag::I32,
        TypeTag::I64,
        TypeTag::F32,
        TypeTag::F64,
    ] {
        assert_eq!(TypeTag::from_form(&tag.form()), Some(tag));
    }
}

#[test]
fn test_registry_numbers_are_one_based() {
    let mut registry = ColumnRegistry::new(TableKind::Header);
    assert_eq!(registry.declare("SNID", TypeTag::FixedString(16)).unwrap(), 1);
    assert_eq!(registry.declare("NOBS", TypeTag::I32).unwrap(), 2);
    assert_eq!(registry.find("NOBS"), Some(2));
    assert_eq!(registry.find("MJD"), None);
    assert_eq!(registry.get(1).map(|c| c.name.as_str()), Some("SNID"));
    assert!(registry.get(0).is_none());
}

#[test]
fn test_registry_rejects_empty_and_duplicate_names() {
    let mut registry = ColumnRegistry::new(TableKind::Photometry);
    registry.declare("MJD", TypeTag::F64).unwrap();

    let err = registry.declare("", TypeTag::F32).unwrap_err();
    assert!(matches!(err, SchemaError::EmptyName { number: 2, .. }));

    let err = registry.declare("MJD", TypeTag::F32).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateColumn { existing: 1, .. }));
}

#[test]
fn test_registry_overflow_is_an_error() {
    let mut registry = ColumnRegistry::new(TableKind::Header);
    for i in 0..MAX_COLUMNS {
        registry.declare(&format!("COL{}", i), TypeTag::F32).unwrap();
    }
    let err = registry.declare("ONE_TOO_MANY", TypeTag::F32).unwrap_err();
    assert!(matches!(err, SchemaError::TooManyColumns { count, .. } if count == MAX_COLUMNS));
    // two-line message: what, then context
    assert_eq!(err.to_string().lines().count(), 2);
}

#[test]
fn test_registry_reset_allows_reuse() {
    let mut registry = ColumnRegistry::new(TableKind::SpectrumIndex);
    registry.declare("LAMINDEX", TypeTag::I32).unwrap();
    registry.reuse_for(TableKind::SpectrumSummary);
    assert!(registry.is_empty());
    assert_eq!(registry.kind(), TableKind::SpectrumSummary);
    assert_eq!(registry.declare("SNID", TypeTag::FixedString(16)).unwrap(), 1);
}

#[test]
fn test_header_starts_with_identifiers_and_pointers() {
    let snapshot = ConfigSnapshot::data("TEST", "gr");
    let schema = Schema::build(TableKind::Header, &snapshot);
    let names = schema.names();
    assert_eq!(&names[..4], &["SNID", "IAUC", "FAKE", "MASK_FLUXCOR_SNANA"]);
    assert_eq!(
        schema.get("PTROBS_MIN").map(|c| c.source),
        Some(Source::BlockFirst)
    );
    assert_eq!(schema.get("SNID").map(|c| c.tag), Some(TypeTag::FixedString(16)));
}

#[test]
fn test_per_filter_columns_follow_filter_order() {
    let snapshot = ConfigSnapshot::data("TEST", "zgi");
    let names = names(TableKind::Header, &snapshot);
    let mags: Vec<_> = names
        .iter()
        .filter(|n| n.starts_with("HOSTGAL_MAG_"))
        .cloned()
        .collect();
    assert_eq!(mags, vec!["HOSTGAL_MAG_z", "HOSTGAL_MAG_g", "HOSTGAL_MAG_i"]);
}

#[test]
fn test_data_and_simulation_columns() {
    let data = ConfigSnapshot::data("TEST", "gr");
    let data_names = names(TableKind::Header, &data);
    assert!(data_names.iter().any(|n| n == "REDSHIFT_QUALITYFLAG"));
    assert!(data_names.iter().any(|n| n == "HOSTGAL2_OBJID"));
    assert!(!data_names.iter().any(|n| n.starts_with("SIM_")));

    let mut sim = ConfigSnapshot::simulation("TEST", "gr");
    sim.sim.model = SimModel::Salt2;
    let sim_names = names(TableKind::Header, &sim);
    assert!(!sim_names.iter().any(|n| n == "REDSHIFT_QUALITYFLAG"));
    assert!(!sim_names.iter().any(|n| n == "MASK_FLUXCOR_SNANA"));
    // simulations without a neighbor list skip the second host block
    assert!(!sim_names.iter().any(|n| n.starts_with("HOSTGAL2_")));
    assert!(sim_names.iter().any(|n| n == "SIM_SALT2x0"));
    assert!(sim_names.iter().any(|n| n == "SIM_PEAKMAG_r"));
    assert_eq!(sim_names.last().map(String::as_str), Some("SIM_SUBSAMPLE_INDEX"));
}

#[test]
fn test_subsurvey_flag_adds_one_column() {
    let base = ConfigSnapshot::data("TEST", "gr");
    let mut flagged = base.clone();
    flagged.subsurvey = true;
    let diff = difference(
        &names(TableKind::Header, &base),
        &names(TableKind::Header, &flagged),
    );
    assert_eq!(diff.into_iter().collect::<Vec<_>>(), vec!["SUBSURVEY"]);
}

#[test]
fn test_compact_mode_drops_full_mode_columns() {
    let full = ConfigSnapshot::data("TEST", "gr");
    let mut compact = full.clone();
    compact.compact = true;
    let diff = difference(
        &names(TableKind::Photometry, &full),
        &names(TableKind::Photometry, &compact),
    );
    let expected: BTreeSet<String> = ["SKY_SIG_T", "RDNOISE", "ZEROPT_ERR", "GAIN"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(diff, expected);
    assert_eq!(
        names(TableKind::Header, &full),
        names(TableKind::Header, &compact)
    );
}

#[test]
fn test_spectrograph_flag_only_touches_spectrum_tables() {
    let mut without = ConfigSnapshot::simulation("TEST", "gr");
    without.sim.model = SimModel::Salt2;
    let mut with = without.clone();
    with.spectrograph = Some(SpectrographOptions {
        instrument: "PRISM".to_string(),
        wavelength_bins: vec![WavelengthBin {
            lammin: 4000.0,
            lammax: 4010.0,
        }],
        center_format: false,
        warp: true,
    });

    for kind in [TableKind::Header, TableKind::Photometry] {
        assert_eq!(names(kind, &without), names(kind, &with));
    }
    assert!(!without.has_spectra() && with.has_spectra());
    assert_eq!(
        names(TableKind::SpectrumIndex, &with),
        vec!["LAMINDEX", "LAMMIN", "LAMMAX"]
    );
    assert_eq!(
        names(TableKind::SpectrumFlux, &with),
        vec!["LAMINDEX", "FLAM", "FLAMERR", "SIM_FLAM", "SIM_WARP"]
    );
}

#[test]
fn test_simsed_writes_documented_duplicate() {
    let mut snapshot = ConfigSnapshot::simulation("TEST", "g");
    snapshot.sim.model = SimModel::Simsed;
    snapshot.sim.write_model_params = true;
    snapshot.sim.model_params = vec!["SIMSED_TEMP".to_string(), "SIMSED_LOGZ".to_string()];

    let schema = Schema::build(TableKind::Header, &snapshot);
    let alias = schema.get("SIMSED_SALT2x0").expect("alias column");
    assert_eq!(alias.source, Source::Alias("SIM_SALT2x0"));
    assert!(schema.get("SIMSED_LOGZ").is_some());
    // the plain SALT2 block belongs to the SALT2 model only
    assert!(schema.get("SIM_SALT2x0").is_none());
}

#[test]
fn test_schema_declares_into_registry() {
    let snapshot = ConfigSnapshot::data("TEST", "ugriz");
    let schema = Schema::build(TableKind::Header, &snapshot);
    let mut registry = ColumnRegistry::new(TableKind::Header);
    schema.declare_into(&mut registry).unwrap();
    assert_eq!(registry.len(), schema.len());
    let nobs = schema.names().iter().position(|n| *n == "NOBS").map(|i| i + 1);
    assert_eq!(registry.find("NOBS"), nobs);
}

#[test]
fn test_required_columns_reports_every_missing_name() {
    let present = ["SNID", "NOBS", "PTROBS_MAX"];
    let err = validate_required(|name| present.iter().position(|p| *p == name).map(|i| i + 1))
        .unwrap_err();
    match err {
        SchemaError::MissingRequired { missing, .. } => {
            assert_eq!(missing, vec!["FAKE", "PTROBS_MIN"]);
        }
        other => panic!("unexpected error {other}"),
    }

    let all = REQUIRED_HEADER_COLUMNS;
    let required =
        validate_required(|name| all.iter().position(|p| *p == name).map(|i| i + 1)).unwrap();
    assert_eq!(required.snid, 1);
    assert_eq!(required.ptrobs_max, 5);
}

#[test]
fn test_snapshot_from_toml() {
    let snapshot = ConfigSnapshot::from_toml_str(
        r#"
        survey = "LSST"
        filters = "ugrizY"
        data_kind = "SIM_SNANA"
        compact = true

        [sim]
        model = "SALT2"
        snr_monitor = 20

        [spectrograph]
        instrument = "PRISM"
        wavelength_bins = [{ lammin = 4000.0, lammax = 4010.0 }]
        "#,
    )
    .unwrap();
    assert!(snapshot.is_sim());
    assert_eq!(snapshot.sim.model, SimModel::Salt2);
    assert_eq!(snapshot.filter_chars().count(), 6);
    assert!(snapshot.has_spectra());
    assert!(names(TableKind::Photometry, &snapshot).contains(&"SIM_SNRMAG20".to_string()));
    assert!(ConfigSnapshot::from_toml_str("data_kind = 3").is_err());
}
