//! Partition list: which header container holds which records.

use std::path::{Path, PathBuf};

use crate::schema::{MAX_PARTITIONS, SNPACK_EXTENSION, SNPACK_EXTENSION_LOWER};
use crate::store::{ContainerReader, TableSource};

use super::ReadError;

/// Whether a container name carries the snpack suffix
pub fn has_snpack_suffix(name: &str) -> bool {
    name.ends_with(SNPACK_EXTENSION) || name.ends_with(SNPACK_EXTENSION_LOWER)
}

/// Ordered header containers with their record counts.
///
/// Partitions are numbered from 1. `cumulative(p)` is the number of records in
/// partitions `1..=p`.
#[derive(Debug, Clone)]
pub struct PartitionList {
    paths: Vec<PathBuf>,
    rows: Vec<usize>,
    cumulative: Vec<usize>,
}

impl PartitionList {
    /// Count the records of every header container
    pub fn scan(paths: Vec<PathBuf>) -> Result<Self, ReadError> {
        let mut rows = Vec::with_capacity(paths.len());
        for path in &paths {
            let mut head = ContainerReader::open(path)?;
            head.move_to_table(0)?;
            rows.push(head.num_rows()?);
        }
        Ok(Self::from_counts(paths, rows))
    }

    /// List over known record counts
    pub fn from_counts(paths: Vec<PathBuf>, rows: Vec<usize>) -> Self {
        let cumulative = rows
            .iter()
            .scan(0usize, |sum, n| {
                *sum += n;
                Some(*sum)
            })
            .collect();
        Self {
            paths,
            rows,
            cumulative,
        }
    }

    /// Number of partitions
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Records across every partition
    pub fn total(&self) -> usize {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Header container of a partition
    pub fn path(&self, partition: usize) -> Option<&Path> {
        self.paths.get(partition.checked_sub(1)?).map(PathBuf::as_path)
    }

    /// Records in a partition
    pub fn rows(&self, partition: usize) -> Option<usize> {
        self.rows.get(partition.checked_sub(1)?).copied()
    }

    /// Records in partitions `1..=partition`
    pub fn cumulative(&self, partition: usize) -> Option<usize> {
        self.cumulative.get(partition.checked_sub(1)?).copied()
    }

    /// Partition and local row of a 1-based record index, by linear scan
    pub fn locate(&self, isn: usize) -> Option<(usize, usize)> {
        if isn == 0 {
            return None;
        }
        let mut before = 0;
        for (i, total) in self.cumulative.iter().enumerate() {
            if isn <= *total {
                return Some((i + 1, isn - before));
            }
            before = *total;
        }
        None
    }
}

/// Container names of a list file.
///
/// Returns `Ok(None)` when the first name is not an snpack container, so the
/// caller can try another reader.
pub fn read_list_file(path: &Path) -> Result<Option<Vec<PathBuf>>, ReadError> {
    let invalid = |reason: String| ReadError::InvalidList {
        path: path.display().to_string(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let names: Vec<&str> = content.split_whitespace().collect();

    let Some(first) = names.first() else {
        return Err(invalid("no container names".to_string()));
    };
    if !has_snpack_suffix(first) {
        log::debug!("{} does not list snpack containers", path.display());
        return Ok(None);
    }
    if names.len() > MAX_PARTITIONS {
        return Err(ReadError::TooManyPartitions {
            path: path.display().to_string(),
            count: names.len(),
            max: MAX_PARTITIONS,
        });
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(Some(names.iter().map(|name| dir.join(name)).collect()))
}
