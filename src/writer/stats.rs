use std::fmt;

use crate::store::ContainerStats;

/// Statistics from a completed write operation
#[derive(Debug, Clone, Default)]
pub struct WriterStats {
    /// Records written to the header table
    pub records_written: usize,
    /// Photometry rows, including the end-of-event row
    pub epochs_written: usize,
    /// Spectrum summary rows
    pub spectra_written: usize,
    /// Flux rows, including one marker row per spectrum
    pub flux_rows_written: usize,
    /// One entry per finished container
    pub containers: Vec<ContainerStats>,
}

impl WriterStats {
    /// Combined size of the containers on disk
    pub fn file_size_bytes(&self) -> u64 {
        self.containers.iter().map(|c| c.file_size_bytes).sum()
    }
}

impl fmt::Display for WriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} records ({} photometry rows, {} spectra) in {} containers",
            self.records_written,
            self.epochs_written,
            self.spectra_written,
            self.containers.len()
        )
    }
}
