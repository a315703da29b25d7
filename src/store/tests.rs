use super::*;
use crate::schema::TypeTag;
use parquet::file::properties::WriterProperties;
use tempfile::tempdir;

fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("SNID", TypeTag::FixedString(16), 1),
        ColumnDescriptor::new("NOBS", TypeTag::I32, 2),
        ColumnDescriptor::new("MJD", TypeTag::F64, 3),
    ]
}

fn small_groups() -> WriterProperties {
    WriterProperties::builder().set_max_row_group_size(2).build()
}

#[test]
fn test_write_and_read_slices() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("T_HEAD.SNPACK");

    let mut writer = ContainerWriter::create(&path, small_groups()).unwrap();
    writer.set_key("SURVEY", MetaValue::from("TEST"));
    writer.set_key("CODE_IVERSION", MetaValue::from(10i64));
    writer.create_table("HEADER", &columns()).unwrap();
    for row in 1..=5usize {
        writer
            .write_column(1, row, ColumnData::Text(vec![format!("SN{}", row)]))
            .unwrap();
        writer
            .write_column(2, row, ColumnData::I32(vec![row as i32 * 10]))
            .unwrap();
        writer
            .write_column(3, row, ColumnData::F64(vec![60000.0 + row as f64]))
            .unwrap();
    }
    assert_eq!(writer.current_rows(), 5);
    let stats = writer.finish().unwrap();
    assert_eq!(stats.tables, vec![("HEADER".to_string(), 5)]);
    assert!(stats.file_size_bytes > 0);

    let mut reader = ContainerReader::open(&path).unwrap();
    assert_eq!(reader.global_keys().get("SURVEY"), Some(&MetaValue::from("TEST")));
    assert_eq!(
        reader.global_keys().get("CODE_IVERSION").and_then(MetaValue::as_i64),
        Some(10)
    );
    assert_eq!(reader.table_count(), 1);
    reader.next_table().unwrap();
    assert_eq!(reader.table_name().unwrap(), "HEADER");
    assert_eq!(reader.num_rows().unwrap(), 5);
    assert_eq!(reader.num_columns().unwrap(), 3);
    assert_eq!(reader.column_name(2).unwrap(), "NOBS");
    assert_eq!(reader.column_form(1).unwrap(), "16A");
    assert_eq!(reader.column_form(3).unwrap(), "1D");

    // slice crossing a row-group boundary
    assert_eq!(
        reader.read_column(2, 2, 3).unwrap(),
        ColumnData::I32(vec![20, 30, 40])
    );
    assert_eq!(
        reader.read_column(1, 5, 1).unwrap(),
        ColumnData::Text(vec!["SN5".to_string()])
    );
    assert!(reader.read_column(3, 1, 0).unwrap().is_empty());
}

#[test]
fn test_out_of_range_reads_fail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("T_PHOT.SNPACK");
    let mut writer = ContainerWriter::create(&path, WriterProperties::default()).unwrap();
    writer.create_table("PHOTOMETRY", &columns()).unwrap();
    writer.write_column(1, 1, ColumnData::Text(vec!["a".into()])).unwrap();
    writer.write_column(2, 1, ColumnData::I32(vec![1])).unwrap();
    writer.write_column(3, 1, ColumnData::F64(vec![1.0])).unwrap();
    writer.finish().unwrap();

    let mut reader = ContainerReader::open(&path).unwrap();
    assert!(matches!(
        reader.num_rows(),
        Err(StoreError::NoCurrentTable { .. })
    ));
    reader.move_to_table(0).unwrap();
    assert!(matches!(
        reader.read_column(4, 1, 1),
        Err(StoreError::ColumnOutOfRange { count: 3, .. })
    ));
    assert!(matches!(
        reader.read_column(1, 1, 2),
        Err(StoreError::RowOutOfRange { num_rows: 1, .. })
    ));
    assert!(matches!(
        reader.move_to_table(1),
        Err(StoreError::TableOutOfRange { count: 1, .. })
    ));
}

#[test]
fn test_writes_must_be_sequential_and_typed() {
    let mut writer = ContainerWriter::scratch(WriterProperties::default());
    assert!(matches!(
        writer.write_column(1, 1, ColumnData::I32(vec![1])),
        Err(StoreError::NoCurrentTable { .. })
    ));
    writer.create_table("HEADER", &columns()).unwrap();

    let err = writer.write_column(2, 2, ColumnData::I32(vec![1])).unwrap_err();
    assert!(matches!(
        err,
        StoreError::NonSequentialWrite { expected: 1, got: 2, .. }
    ));

    let err = writer.write_column(2, 1, ColumnData::F32(vec![1.0])).unwrap_err();
    assert!(matches!(err, StoreError::TypeMismatch { .. }));
    assert_eq!(err.to_string().lines().count(), 2);
}

#[test]
fn test_ragged_table_is_rejected_on_close() {
    let mut writer = ContainerWriter::scratch(WriterProperties::default());
    writer.create_table("HEADER", &columns()).unwrap();
    writer.write_column(1, 1, ColumnData::Text(vec!["a".into(), "b".into()])).unwrap();
    writer.write_column(2, 1, ColumnData::I32(vec![1])).unwrap();

    let err = writer.into_staged_tables().unwrap_err();
    assert!(err.to_string().starts_with("close failed on table HEADER"));
}

#[test]
fn test_scratch_tables_are_adopted_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("T_SPEC.SNPACK");
    let index_columns = [ColumnDescriptor::new("LAMINDEX", TypeTag::I32, 1)];

    let mut scratch = ContainerWriter::scratch(WriterProperties::default());
    scratch.create_table("SPECTRO_FLUX", &index_columns).unwrap();
    scratch.write_column(1, 1, ColumnData::I32(vec![7, 8, 9])).unwrap();

    let mut writer = ContainerWriter::create(&path, WriterProperties::default()).unwrap();
    writer.create_table("SPECTRO_LAMINDEX", &index_columns).unwrap();
    writer.write_column(1, 1, ColumnData::I32(vec![0, 1])).unwrap();
    writer.create_table("SPECTRO_HEADER", &index_columns).unwrap();
    writer
        .adopt_tables(scratch.into_staged_tables().unwrap())
        .unwrap();
    let stats = writer.finish().unwrap();
    let names: Vec<_> = stats.tables.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["SPECTRO_LAMINDEX", "SPECTRO_HEADER", "SPECTRO_FLUX"]);

    let mut reader = ContainerReader::open(&path).unwrap();
    reader.move_to_table(2).unwrap();
    assert_eq!(reader.table_name().unwrap(), "SPECTRO_FLUX");
    assert_eq!(reader.read_column(1, 1, 3).unwrap(), ColumnData::I32(vec![7, 8, 9]));
    reader.move_to_table(1).unwrap();
    assert_eq!(reader.num_rows().unwrap(), 0);
}

#[test]
fn test_existing_file_and_detached_finish() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("T_HEAD.SNPACK");
    std::fs::write(&path, b"x").unwrap();
    assert!(matches!(
        ContainerWriter::create(&path, WriterProperties::default()),
        Err(StoreError::AlreadyExists(_))
    ));
    assert!(matches!(
        ContainerReader::open(&path),
        Err(StoreError::ZipError(_))
    ));

    let scratch = ContainerWriter::scratch(WriterProperties::default());
    assert!(matches!(scratch.finish(), Err(StoreError::Detached)));
}

#[test]
fn test_meta_value_json_shape() {
    let mut keys = GlobalKeys::new();
    keys.insert("NFILTERS".into(), MetaValue::from(5i32));
    keys.insert("MWEBV_RV".into(), MetaValue::from(3.1f32));
    keys.insert("SURVEY".into(), MetaValue::from("LSST"));
    let json = serde_json::to_string(&keys).unwrap();
    let back: GlobalKeys = serde_json::from_str(&json).unwrap();
    assert_eq!(back.get("NFILTERS"), Some(&MetaValue::Int(5)));
    assert!(matches!(back.get("MWEBV_RV"), Some(MetaValue::Float(_))));
    assert_eq!(back.get("SURVEY").map(ToString::to_string).as_deref(), Some("LSST"));
}
