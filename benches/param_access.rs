use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use snpack::prelude::*;
use tempfile::TempDir;

/// Create a run with `records` light curves of `epochs` epochs each
fn create_test_run(dir: &std::path::Path, records: usize, epochs: usize) -> std::path::PathBuf {
    let snapshot = ConfigSnapshot::data("BENCH", "griz");
    let mut writer =
        SnPackWriter::create(dir, "BENCH", snapshot, WriterConfig::fast_write()).unwrap();

    for i in 0..records {
        let mut event = SnEvent::new(&format!("SN{:06}", i));
        event.header.set("IAUC", "NULL").set("RA", i as f64 * 0.1);
        for j in 0..epochs {
            let band = ["g", "r", "i", "z"][j % 4];
            event.push_epoch(
                FieldBag::new()
                    .with("MJD", 60000.0 + j as f64)
                    .with("BAND", band)
                    .with("FIELD", "WIDE")
                    .with("FLUXCAL", 100.0 + j as f32)
                    .with("FLUXCALERR", 5.0f32),
            );
        }
        writer.write_event(&event).unwrap();
    }

    writer.finish().unwrap();
    dir.join("BENCH_HEAD.SNPACK")
}

/// Benchmark header parameters served from the bulk-loaded buffers
fn bench_header_params(c: &mut Criterion) {
    let mut group = c.benchmark_group("header_params");

    for records in [100, 1000] {
        let temp_dir = TempDir::new().unwrap();
        let head = create_test_run(temp_dir.path(), records, 10);
        group.throughput(Throughput::Elements(records as u64));

        group.bench_with_input(BenchmarkId::from_parameter(records), &records, |b, &records| {
            let mut reader =
                SnPackReader::open_partitions(vec![head.clone()], ReaderConfig::default())
                    .unwrap();
            let mut ra = Vec::new();
            b.iter(|| {
                for isn in 1..=records {
                    reader.read_f64(black_box(isn), "RA", &mut ra).unwrap();
                }
                black_box(&ra);
            });
        });
    }

    group.finish();
}

/// Benchmark photometry parameters read from the epoch block of each record
fn bench_photometry_params(c: &mut Criterion) {
    let mut group = c.benchmark_group("photometry_params");

    for epochs in [10, 100] {
        let temp_dir = TempDir::new().unwrap();
        let head = create_test_run(temp_dir.path(), 200, epochs);
        group.throughput(Throughput::Elements((200 * epochs) as u64));

        group.bench_with_input(BenchmarkId::from_parameter(epochs), &epochs, |b, _| {
            let mut reader =
                SnPackReader::open_partitions(vec![head.clone()], ReaderConfig::default())
                    .unwrap();
            let mut flux = Vec::new();
            b.iter(|| {
                for isn in 1..=200 {
                    reader.read_f32(black_box(isn), "FLUXCAL", &mut flux).unwrap();
                }
                black_box(&flux);
            });
        });
    }

    group.finish();
}

/// Benchmark whole-event reads
fn bench_read_event(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let head = create_test_run(temp_dir.path(), 200, 20);

    c.bench_function("read_event", |b| {
        let mut reader =
            SnPackReader::open_partitions(vec![head.clone()], ReaderConfig::default()).unwrap();
        b.iter(|| {
            for isn in 1..=200 {
                black_box(reader.read_event(black_box(isn)).unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_header_params,
    bench_photometry_params,
    bench_read_event
);
criterion_main!(benches);
