use super::{columns, SchemaError, TableKind};

/// Fixed column numbers of the required header columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredColumns {
    /// `SNID`
    pub snid: usize,
    /// `FAKE`
    pub fake: usize,
    /// `NOBS`
    pub nobs: usize,
    /// `PTROBS_MIN`
    pub ptrobs_min: usize,
    /// `PTROBS_MAX`
    pub ptrobs_max: usize,
}

/// Validates that a header table carries every required column.
///
/// `lookup` maps a column name to its 1-based number. All missing names are
/// collected before reporting, so the error lists every one of them.
pub fn validate_required<F>(lookup: F) -> Result<RequiredColumns, SchemaError>
where
    F: Fn(&str) -> Option<usize>,
{
    let mut missing = Vec::new();
    let mut found = [0usize; 5];

    for (slot, name) in columns::REQUIRED_HEADER_COLUMNS.iter().enumerate() {
        match lookup(name) {
            Some(number) => found[slot] = number,
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(SchemaError::MissingRequired {
            table: TableKind::Header,
            missing,
        });
    }

    Ok(RequiredColumns {
        snid: found[0],
        fake: found[1],
        nobs: found[2],
        ptrobs_min: found[3],
        ptrobs_max: found[4],
    })
}
