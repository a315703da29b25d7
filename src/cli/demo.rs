use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use snpack::prelude::*;
use snpack::schema::ContainerKind;

const EPOCHS_PER_RECORD: usize = 12;

/// Write a synthetic run and a list file naming its header container
pub fn run(
    dir: PathBuf,
    prefix: String,
    snapshot: Option<PathBuf>,
    config: Option<PathBuf>,
    records: usize,
) -> Result<()> {
    let snapshot = match snapshot {
        Some(path) => ConfigSnapshot::from_file(&path)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?,
        None => ConfigSnapshot::data("DEMO", "griz"),
    };
    let config = match config {
        Some(path) => WriterConfig::from_file(&path)
            .with_context(|| format!("Failed to load writer config {}", path.display()))?,
        None => WriterConfig::default(),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    info!("Writing {} synthetic records to {}", records, dir.display());
    let mut writer = SnPackWriter::create(&dir, &prefix, snapshot.clone(), config)
        .context("Failed to create snpack writer")?;
    for i in 0..records {
        writer
            .write_event(&synthetic_event(&snapshot, i))
            .with_context(|| format!("Failed to write record {}", i + 1))?;
    }
    let stats = writer.finish().context("Failed to finalize containers")?;

    let list = dir.join(format!("{}.LIST", prefix));
    std::fs::write(&list, format!("{}\n", ContainerKind::Head.file_name(&prefix)))
        .with_context(|| format!("Failed to write {}", list.display()))?;

    info!("{}", stats);
    for container in &stats.containers {
        info!(
            "  {} ({:.1} KB)",
            container.path.display(),
            container.file_size_bytes as f64 / 1024.0
        );
    }
    info!("  List file: {}", list.display());
    Ok(())
}

/// Smooth rise-and-fall light curve cycling through the snapshot's filters
fn synthetic_event(snapshot: &ConfigSnapshot, index: usize) -> SnEvent {
    let snid = format!("DEMO{:06}", index + 1);
    let peak_mjd = 61000.0 + 3.5 * index as f64;
    let redshift = 0.05 + 0.01 * (index % 40) as f32;

    let mut event = SnEvent::new(&snid);
    event
        .header
        .set("IAUC", format!("2027d{:04}", index + 1))
        .set("RA", 10.0 + 0.37 * index as f64)
        .set("DEC", -30.0 + 0.11 * index as f64)
        .set("SNTYPE", 1i32)
        .set("PEAKMJD", peak_mjd as f32)
        .set("REDSHIFT_HELIO", redshift)
        .set("REDSHIFT_FINAL", redshift)
        .set("REDSHIFT_FINAL_ERR", 0.001f32);
    if snapshot.subsurvey {
        event.header.set("SUBSURVEY", "");
    }
    if snapshot.is_sim() {
        event.header.set("SIM_MODEL_NAME", "SALT2.DEMO");
        event.header.set("SIM_TYPE_NAME", "Ia");
    }

    let filters: Vec<char> = snapshot.filter_chars().collect();
    for i in 0..EPOCHS_PER_RECORD {
        let mjd = peak_mjd - 15.0 + 4.0 * i as f64;
        let phase = (mjd - peak_mjd) as f32;
        let flux = 1000.0 * (-phase * phase / 400.0).exp() + 5.0;
        let band = filters
            .get(i % filters.len().max(1))
            .map(char::to_string)
            .unwrap_or_else(|| "-".to_string());
        event.push_epoch(
            FieldBag::new()
                .with("MJD", mjd)
                .with("BAND", band)
                .with("FIELD", "DEMO")
                .with("FLUXCAL", flux)
                .with("FLUXCALERR", flux.sqrt())
                .with("ZEROPT", 27.5f32)
                .with("SKY_SIG", 20.0f32),
        );
    }

    if let Some(spectrograph) = &snapshot.spectrograph {
        let mut spectrum = SpectrumEpoch::new(peak_mjd);
        spectrum.fields.set("Texpose", 1200.0f32);
        for (lamindex, bin) in spectrograph.wavelength_bins.iter().enumerate() {
            let flam = 1.0e-17 * (bin.center() / 5000.0).powi(-2);
            spectrum.push_bin(lamindex as i32, flam, 0.05 * flam);
        }
        event.spectra.push(spectrum);
    }
    event
}
