use crate::core::params::MAX_CHI;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChiTableError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Duplicate chi-angle row for record index {0}")]
    DuplicateIndex(usize),
}

#[derive(Debug, Deserialize)]
struct ChiAngleRow {
    index: usize,
    chi1: Option<f64>,
    chi2: Option<f64>,
    chi3: Option<f64>,
    chi4: Option<f64>,
}

impl ChiAngleRow {
    /// The leading run of present angles; a gap ends the usable sequence.
    fn angles(&self) -> Vec<f64> {
        [self.chi1, self.chi2, self.chi3, self.chi4]
            .into_iter()
            .take(MAX_CHI)
            .map_while(|angle| angle)
            .collect()
    }
}

/// Chi angles (degrees) per record index, read from a CSV with header
/// `index,chi1,chi2,chi3,chi4`. Empty cells are allowed.
pub type ChiAngleTable = HashMap<usize, Vec<f64>>;

pub fn load_chi_angles(path: &Path) -> Result<ChiAngleTable, ChiTableError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| ChiTableError::Csv {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    let mut table = ChiAngleTable::new();
    for result in reader.deserialize::<ChiAngleRow>() {
        let row = result.map_err(|e| ChiTableError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        if table.insert(row.index, row.angles()).is_some() {
            return Err(ChiTableError::DuplicateIndex(row.index));
        }
    }
    Ok(table)
}
