pub mod check;
pub mod downsample;
pub mod reconstruct;

use crate::error::{CliError, Result};
use nbprep::core::io::dataset;
use nbprep::core::models::neighborhood::NeighborhoodRecord;
use std::path::Path;
use tracing::info;

/// Reads a dataset, optionally dropping exact duplicate records.
fn load_records(path: &Path, dedup: bool) -> Result<Vec<NeighborhoodRecord>> {
    info!("Loading dataset from {:?}", path);
    let records = dataset::read_dataset(path).map_err(CliError::core)?;
    if dedup {
        Ok(dataset::deduplicate(records))
    } else {
        Ok(records)
    }
}
