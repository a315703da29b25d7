use std::path::{Path, PathBuf};

use super::spectra::edges_from_centers;
use super::*;
use crate::record::{FieldBag, SnEvent, SpectrumEpoch, Value};
use crate::schema::{
    ColumnDescriptor, ConfigSnapshot, DataKind, SchemaError, SimModel, SpectrographOptions,
    TypeTag, WavelengthBin,
};
use crate::store::{ColumnData, ContainerWriter, MetaValue, TableSink};
use crate::writer::{SnPackWriter, WriterConfig};
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn epoch(mjd: f64, band: &str, flux: f32) -> FieldBag {
    FieldBag::new()
        .with("MJD", mjd)
        .with("BAND", band)
        .with("FIELD", "X1")
        .with("FLUXCAL", flux)
        .with("FLUXCALERR", 1.5f32)
}

fn event(snid: &str, bands: &str) -> SnEvent {
    let mut event = SnEvent::new(snid);
    event.header.set("IAUC", "NULL");
    event.header.set("RA", 150.123456789);
    for (i, band) in bands.chars().enumerate() {
        event.push_epoch(epoch(60000.5 + i as f64, &band.to_string(), 10.0 * (i + 1) as f32));
    }
    event
}

fn write_run(dir: &Path, prefix: &str, snapshot: ConfigSnapshot, events: &[SnEvent]) -> PathBuf {
    let mut writer = SnPackWriter::create(dir, prefix, snapshot, WriterConfig::default()).unwrap();
    for event in events {
        writer.write_event(event).unwrap();
    }
    writer.finish().unwrap();
    dir.join(format!("{}_HEAD.SNPACK", prefix))
}

fn open(head: PathBuf) -> SnPackReader {
    SnPackReader::open_partitions(vec![head], ReaderConfig::default()).unwrap()
}

#[test]
fn test_read_count_sentinels() {
    assert_eq!(ReadCount::NotFound.count(), 0);
    assert_eq!(ReadCount::AllMasked.count(), -9);
    assert_eq!(ReadCount::Values(4).count(), 4);
    assert!(!ReadCount::NotFound.is_found());
    assert!(ReadCount::AllMasked.is_found());
}

#[test]
fn test_param_cache_searches_once_per_partition() {
    let header = ColumnIndex::from_parts(
        TableKind::Header,
        vec!["SNID".to_string(), "RA".to_string()],
        vec![TypeTag::FixedString(16), TypeTag::F64],
    );
    let phot = ColumnIndex::from_parts(
        TableKind::Photometry,
        vec!["MJD".to_string()],
        vec![TypeTag::F64],
    );
    let mut cache = ParamCache::default();
    cache.reset(1);

    let mjd = cache.resolve(1, "MJD", &header, &phot);
    assert_eq!(
        mjd,
        Resolution::Column {
            table: TableKind::Photometry,
            column: 1,
            tag: TypeTag::F64
        }
    );
    assert_eq!(cache.resolve(1, "MJD", &header, &phot), mjd);
    assert_eq!(cache.searches(), 1);

    assert_eq!(cache.resolve(1, "NOPE", &header, &phot), Resolution::NotFound);
    assert_eq!(cache.resolve(1, "NOPE", &header, &phot), Resolution::NotFound);
    assert_eq!(cache.searches(), 2);

    // another partition starts from scratch
    cache.resolve(2, "NOPE", &header, &phot);
    assert_eq!(cache.partition(), 2);
    assert_eq!(cache.searches(), 3);
}

#[test]
fn test_epoch_mask_validation() {
    let mut mask = EpochMask::default();
    assert!(matches!(
        mask.set(&[1, 0, 2]),
        Err(ReadError::InvalidMask { index: 2, value: 2 })
    ));
    assert!(matches!(
        mask.set(&vec![1; 5001]),
        Err(ReadError::MaskTooLong { len: 5001, .. })
    ));
    assert!(!mask.is_set());

    mask.set(&[1, 0, 1]).unwrap();
    assert_eq!(mask.flags(3, "MJD", 1).unwrap(), vec![true, false, true]);
    assert!(matches!(
        mask.flags(4, "MJD", 7),
        Err(ReadError::MaskSizeMismatch { isn: 7, mask: 3, epochs: 4, .. })
    ));

    mask.set(&[]).unwrap();
    assert_eq!(mask.flags(2, "MJD", 1).unwrap(), vec![true, true]);
}

#[test]
fn test_partition_lookup_by_cumulative_counts() {
    let list = PartitionList::from_counts(
        vec![PathBuf::from("A_HEAD.SNPACK"), PathBuf::from("B_HEAD.SNPACK")],
        vec![10, 7],
    );
    assert_eq!(list.total(), 17);
    assert_eq!(list.cumulative(1), Some(10));
    assert_eq!(list.locate(1), Some((1, 1)));
    assert_eq!(list.locate(10), Some((1, 10)));
    assert_eq!(list.locate(11), Some((2, 1)));
    assert_eq!(list.locate(17), Some((2, 7)));
    assert_eq!(list.locate(18), None);
    assert_eq!(list.locate(0), None);
}

#[test]
fn test_list_file_format_detection() -> TestResult {
    let dir = tempdir()?;

    let legacy = dir.path().join("legacy.LIST");
    std::fs::write(&legacy, "SN001.DAT\nSN002.DAT\n")?;
    assert!(read_list_file(&legacy)?.is_none());
    assert!(matches!(
        SnPackReader::prepare(&legacy, ReaderConfig::default())?,
        Prepared::NotThisFormat
    ));

    let empty = dir.path().join("empty.LIST");
    std::fs::write(&empty, "  \n")?;
    assert!(matches!(
        read_list_file(&empty),
        Err(ReadError::InvalidList { .. })
    ));

    let many = dir.path().join("many.LIST");
    let names: Vec<String> = (0..1001).map(|i| format!("P{}_HEAD.SNPACK", i)).collect();
    std::fs::write(&many, names.join("\n"))?;
    assert!(matches!(
        read_list_file(&many),
        Err(ReadError::TooManyPartitions { count: 1001, .. })
    ));

    let good = dir.path().join("good.LIST");
    std::fs::write(&good, "A_HEAD.SNPACK B_HEAD.snpack\n")?;
    let paths = read_list_file(&good)?.unwrap_or_default();
    assert_eq!(
        paths,
        vec![dir.path().join("A_HEAD.SNPACK"), dir.path().join("B_HEAD.snpack")]
    );
    Ok(())
}

#[test]
fn test_buffers_guard_double_allocation() {
    let index = ColumnIndex::from_parts(
        TableKind::Header,
        vec!["SNID".to_string(), "NOBS".to_string()],
        vec![TypeTag::FixedString(16), TypeTag::I32],
    );
    let mut buffers = TableBuffers::new(TableKind::Header);
    buffers.free();
    buffers.allocate(&index, 4).unwrap();
    assert_eq!(buffers.allocated_len(), 5);
    assert!(matches!(
        buffers.allocate(&index, 4),
        Err(ReadError::BuffersInUse { table: TableKind::Header })
    ));
    buffers.free();
    assert_eq!(buffers.allocated_len(), 0);
    buffers.allocate(&index, 2).unwrap();
}

#[test]
fn test_edges_from_centers() {
    let bins = edges_from_centers(&[4005.0, 4015.0, 4025.0]);
    assert_eq!(
        bins,
        vec![
            WavelengthBin { lammin: 4000.0, lammax: 4010.0 },
            WavelengthBin { lammin: 4010.0, lammax: 4020.0 },
            WavelengthBin { lammin: 4020.0, lammax: 4030.0 },
        ]
    );
    assert_eq!(
        edges_from_centers(&[5000.0]),
        vec![WavelengthBin { lammin: 5000.0, lammax: 5000.0 }]
    );
}

#[test]
fn test_header_and_photometry_params() -> TestResult {
    let dir = tempdir()?;
    let head = write_run(
        dir.path(),
        "PARAM",
        ConfigSnapshot::data("TEST", "gr"),
        &[event("A", "gg"), event("B", "grg")],
    );
    let mut reader = open(head);
    assert_eq!(reader.record_count(), 2);

    let mut ra = Vec::new();
    assert_eq!(reader.read_f64(1, "RA", &mut ra)?, ReadCount::Values(1));
    assert_eq!(ra, vec![150.123456789]);

    let mut nobs = Vec::new();
    reader.read_i32(2, "NOBS", &mut nobs)?;
    assert_eq!(nobs, vec![3]);

    let mut bands = String::new();
    assert_eq!(reader.read_str(2, "BAND", &mut bands)?, ReadCount::Values(3));
    assert_eq!(bands, "g,r,g");

    let mut mjd = Vec::new();
    reader.read_f64(2, "MJD", &mut mjd)?;
    assert_eq!(mjd, vec![60000.5, 60001.5, 60002.5]);

    let mut none = vec![1.0];
    assert_eq!(reader.read_f64(1, "NO_SUCH_COLUMN", &mut none)?, ReadCount::NotFound);
    assert!(none.is_empty());

    assert!(matches!(
        reader.read_f64(1, "SNID", &mut ra),
        Err(ReadError::NotNumeric { .. })
    ));
    assert!(matches!(
        reader.read_f64(3, "RA", &mut ra),
        Err(ReadError::RecordOutOfRange { isn: 3, total: 2 })
    ));
    Ok(())
}

#[test]
fn test_fully_masked_record_is_distinct_from_missing() -> TestResult {
    let dir = tempdir()?;
    let head = write_run(
        dir.path(),
        "MASK",
        ConfigSnapshot::data("TEST", "g"),
        &[event("A", "gg"), event("B", "")],
    );
    let mut reader = open(head);
    reader.set_epoch_mask(&[0, 0])?;

    let mut flux = Vec::new();
    let count = reader.read_f32(1, "FLUXCAL", &mut flux)?;
    assert_eq!(count, ReadCount::AllMasked);
    assert_eq!(count.count(), -9);
    assert!(flux.is_empty());

    // header parameters ignore the mask
    assert_eq!(reader.read_f32(1, "RA", &mut flux)?, ReadCount::Values(1));

    reader.set_epoch_mask(&[0, 1, 1])?;
    assert!(matches!(
        reader.read_f32(1, "FLUXCAL", &mut flux),
        Err(ReadError::MaskSizeMismatch { .. })
    ));

    // a record without epochs has nothing to keep either
    reader.clear_epoch_mask();
    assert_eq!(reader.read_f32(2, "FLUXCAL", &mut flux)?, ReadCount::AllMasked);
    assert_eq!(reader.read_f32(2, "RA", &mut flux)?, ReadCount::Values(1));
    Ok(())
}

#[test]
fn test_read_event_matches_written_event() -> TestResult {
    let dir = tempdir()?;
    let written = event("SN1", "gri");
    let head = write_run(
        dir.path(),
        "EVENT",
        ConfigSnapshot::data("TEST", "gri"),
        &[event("SN0", "g"), written.clone()],
    );
    let mut reader = open(head);
    reader.set_epoch_mask(&[1, 0, 1])?;

    let read = reader.read_event(2)?;
    assert_eq!(read.snid(), Some("SN1"));
    assert_eq!(read.header.get("RA"), Some(&Value::F64(150.123456789)));
    assert_eq!(read.header.i64("NOBS"), Some(3));
    assert_eq!(read.header.i64("PTROBS_MIN"), Some(2));
    assert_eq!(read.epochs.len(), 3);
    for (got, want) in read.epochs.iter().zip(&written.epochs) {
        assert_eq!(got.fields.get("MJD"), want.fields.get("MJD"));
        assert_eq!(got.fields.str("BAND"), want.fields.str("BAND"));
        assert_eq!(got.fields.get("FLUXCAL"), want.fields.get("FLUXCAL"));
    }
    let kept: Vec<bool> = read.epochs.iter().map(|e| e.write).collect();
    assert_eq!(kept, vec![true, false, true]);
    assert!(read.spectra.is_empty());
    Ok(())
}

#[test]
fn test_read_event_with_spectra_in_center_form() -> TestResult {
    let dir = tempdir()?;
    let mut snapshot = ConfigSnapshot::simulation("TEST", "g");
    snapshot.sim.model = SimModel::Salt2;
    snapshot.spectrograph = Some(SpectrographOptions {
        instrument: "PRISM".to_string(),
        wavelength_bins: (0..3)
            .map(|i| WavelengthBin {
                lammin: 4000.0 + 10.0 * i as f32,
                lammax: 4010.0 + 10.0 * i as f32,
            })
            .collect(),
        center_format: true,
        warp: true,
    });

    let mut ev = event("S1", "g");
    ev.header.set("SIM_MODEL_NAME", "SALT2.P22");
    ev.header.set("SIM_TYPE_NAME", "Ia");
    let mut spectrum = SpectrumEpoch::new(60000.25);
    spectrum.fields.set("Texpose", 900.0f32);
    spectrum.push_bin(0, 1.0, 0.1).set("SIM_WARP", 45.0);
    spectrum.push_bin(1, 2.0, 0.0);
    spectrum.push_bin(2, 3.0, 0.2).set("SIM_WARP", 1.25);
    ev.spectra.push(spectrum);

    let head = write_run(dir.path(), "SPEC", snapshot, &[ev]);
    let mut reader = open(head);

    assert_eq!(reader.spectrum_rows(1)?, vec![1]);
    let read = reader.read_event(1)?;
    assert_eq!(read.spectra.len(), 1);
    let spectrum = &read.spectra[0];
    assert_eq!(spectrum.fields.get("MJD"), Some(&Value::F64(60000.25)));
    assert_eq!(spectrum.fields.get("Texpose"), Some(&Value::F32(900.0)));
    assert_eq!(spectrum.bins.len(), 2);

    let last = &spectrum.bins[1];
    assert_eq!(last.i64("LAMINDEX"), Some(2));
    assert_eq!(last.get("LAMMIN"), Some(&Value::F32(4020.0)));
    assert_eq!(last.get("LAMMAX"), Some(&Value::F32(4030.0)));
    assert_eq!(last.get("FLAM"), Some(&Value::F32(3.0)));
    assert_eq!(last.f64("SIM_WARP"), Some(1.25));
    assert_eq!(spectrum.bins[0].f64("SIM_WARP"), Some(30.0));

    assert!(matches!(
        reader.read_spectrum(1, 2),
        Err(ReadError::SpectrumOutOfRange { row: 2, count: 1, .. })
    ));
    Ok(())
}

#[test]
fn test_spectra_can_be_disabled() -> TestResult {
    let dir = tempdir()?;
    let mut snapshot = ConfigSnapshot::data("TEST", "g");
    snapshot.spectrograph = Some(SpectrographOptions {
        instrument: "PRISM".to_string(),
        wavelength_bins: vec![WavelengthBin { lammin: 5000.0, lammax: 5010.0 }],
        ..Default::default()
    });
    let head = write_run(dir.path(), "NOSPEC", snapshot, &[event("A", "g")]);

    let mut reader = SnPackReader::open_partitions(vec![head], ReaderConfig::without_spectra())?;
    assert!(matches!(
        reader.spectrum_rows(1),
        Err(ReadError::SpectraUnavailable { partition: 1 })
    ));
    Ok(())
}

#[test]
fn test_magobs_fake_flag_reports_overlay() -> TestResult {
    let dir = tempdir()?;
    let snapshot = ConfigSnapshot {
        data_kind: DataKind::SimMagobs,
        ..ConfigSnapshot::data("TEST", "g")
    };
    let head = write_run(dir.path(), "MAGOBS", snapshot, &[event("A", "g")]);
    let mut reader = open(head);

    let read = reader.read_event(1)?;
    assert_eq!(read.header.i64("FAKE"), Some(2));
    assert_eq!(reader.globals().map(|g| g.data_kind), Some(DataKind::SimMagobs));
    Ok(())
}

#[test]
fn test_global_keys() -> TestResult {
    let dir = tempdir()?;
    let head = write_run(dir.path(), "GLOBAL", ConfigSnapshot::data("DES", "griz"), &[]);
    let reader = open(head);

    assert_eq!(reader.read_global("SURVEY")?, MetaValue::from("DES"));
    assert!(matches!(
        reader.read_global("NOT_A_KEY"),
        Err(ReadError::UnknownGlobalKey { .. })
    ));
    let globals = reader.globals().cloned().unwrap_or_else(|| panic!("no partition"));
    assert_eq!(globals.filters, "griz");
    assert_eq!(globals.photometry_file, "GLOBAL_PHOT.SNPACK");
    assert_eq!(globals.spectrum_file, None);
    assert_eq!(globals.code_version, 10);
    Ok(())
}

#[test]
fn test_missing_required_column_fails_open() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("BAD_HEAD.SNPACK");
    let mut head = ContainerWriter::create(&path, WriterConfig::default().to_writer_properties())?;
    head.set_key("SURVEY", "TEST".into());
    head.set_key("FILTERS", "g".into());
    head.set_key("DATATYPE", "DATA".into());
    head.set_key("PHOTFILE", "BAD_PHOT.SNPACK".into());
    let columns = [
        ColumnDescriptor::new("SNID", TypeTag::FixedString(16), 1),
        ColumnDescriptor::new("FAKE", TypeTag::I16, 2),
        ColumnDescriptor::new("PTROBS_MIN", TypeTag::I32, 3),
        ColumnDescriptor::new("PTROBS_MAX", TypeTag::I32, 4),
    ];
    head.create_table("HEADER", &columns)?;
    head.finish()?;

    match SnPackReader::open_partitions(vec![path], ReaderConfig::default()) {
        Err(ReadError::Schema(SchemaError::MissingRequired { missing, .. })) => {
            assert_eq!(missing, vec!["NOBS".to_string()]);
        }
        other => panic!("expected a missing-column error, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

fn write_bare_run(dir: &Path, mjds: &[f64]) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let props = WriterConfig::default().to_writer_properties();
    let path = dir.join("BARE_HEAD.SNPACK");
    let mut head = ContainerWriter::create(&path, props.clone())?;
    head.set_key("SURVEY", "TEST".into());
    head.set_key("FILTERS", "g".into());
    head.set_key("DATATYPE", "DATA".into());
    head.set_key("PHOTFILE", "BARE_PHOT.SNPACK".into());
    let columns = [
        ColumnDescriptor::new("SNID", TypeTag::FixedString(16), 1),
        ColumnDescriptor::new("FAKE", TypeTag::I16, 2),
        ColumnDescriptor::new("NOBS", TypeTag::I32, 3),
        ColumnDescriptor::new("PTROBS_MIN", TypeTag::I32, 4),
        ColumnDescriptor::new("PTROBS_MAX", TypeTag::I32, 5),
    ];
    head.create_table("HEADER", &columns)?;
    head.write_column(1, 1, ColumnData::Text(vec!["A".to_string()]))?;
    head.write_column(2, 1, ColumnData::I16(vec![0]))?;
    head.write_column(3, 1, ColumnData::I32(vec![1]))?;
    head.write_column(4, 1, ColumnData::I32(vec![1]))?;
    head.write_column(5, 1, ColumnData::I32(vec![1]))?;
    head.finish()?;

    let mut phot = ContainerWriter::create(dir.join("BARE_PHOT.SNPACK"), props)?;
    phot.create_table("PHOTOMETRY", &[ColumnDescriptor::new("MJD", TypeTag::F64, 1)])?;
    phot.write_column(1, 1, ColumnData::F64(mjds.to_vec()))?;
    phot.finish()?;
    Ok(path)
}

#[test]
fn test_open_requires_end_of_event_row() -> TestResult {
    let dir = tempdir()?;
    let head = write_bare_run(dir.path(), &[60000.5])?;
    match SnPackReader::open_partitions(vec![head], ReaderConfig::default()) {
        Err(ReadError::MissingEndOfEvents { row, rows, .. }) => {
            assert_eq!((row, rows), (2, 1));
        }
        other => panic!("expected a missing end-of-event error, got {:?}", other.map(|_| ())),
    }

    let dir = tempdir()?;
    let head = write_bare_run(dir.path(), &[60000.5, 999.0])?;
    let mut reader = SnPackReader::open_partitions(vec![head], ReaderConfig::default())?;
    let mut mjd = Vec::new();
    assert_eq!(reader.read_f64(1, "MJD", &mut mjd)?, ReadCount::Values(1));
    assert_eq!(mjd, vec![60000.5]);
    Ok(())
}
