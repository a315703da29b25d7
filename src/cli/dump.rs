use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use snpack::reader::{Prepared, ReadCount, ReaderConfig, SnPackReader};

/// Dump parameter values of every record as CSV
pub fn run(
    list: PathBuf,
    params: Vec<String>,
    mask: Vec<i32>,
    output: Option<PathBuf>,
    no_spectra: bool,
) -> Result<()> {
    let config = if no_spectra {
        ReaderConfig::without_spectra()
    } else {
        ReaderConfig::default()
    };
    let mut reader = match SnPackReader::prepare(&list, config)
        .with_context(|| format!("Failed to prepare {}", list.display()))?
    {
        Prepared::Ready(reader) => reader,
        Prepared::NotThisFormat => {
            anyhow::bail!("{} does not list snpack containers", list.display())
        }
    };
    if !mask.is_empty() {
        reader.set_epoch_mask(&mask)?;
    }

    let sink: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut csv = csv::Writer::from_writer(sink);

    let mut header = vec!["ISN".to_string()];
    header.extend(params.iter().cloned());
    csv.write_record(&header)?;

    let mut value = String::new();
    for isn in 1..=reader.record_count() {
        let mut row = vec![isn.to_string()];
        for name in &params {
            let count = reader
                .read_str(isn, name, &mut value)
                .with_context(|| format!("Failed to read {} of record {}", name, isn))?;
            row.push(match count {
                ReadCount::NotFound => String::new(),
                ReadCount::AllMasked => "MASKED".to_string(),
                ReadCount::Values(_) => value.clone(),
            });
        }
        csv.write_record(&row)?;
    }
    csv.flush()?;

    log::info!("{}", reader.stats());
    Ok(())
}
