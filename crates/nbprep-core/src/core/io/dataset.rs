use crate::core::models::neighborhood::{NeighborhoodRecord, RecordError};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Record {index} is malformed: {source}")]
    Record { index: usize, source: RecordError },
}

/// Reads and validates every record of a JSON dataset file.
pub fn read_dataset(path: &Path) -> Result<Vec<NeighborhoodRecord>, DatasetError> {
    let file = File::open(path).map_err(|e| DatasetError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let records = read_records(BufReader::new(file)).map_err(|e| match e {
        DatasetError::Json { source, .. } => DatasetError::Json {
            path: path.to_string_lossy().to_string(),
            source,
        },
        other => other,
    })?;
    info!("Read {} neighborhood(s) from {:?}", records.len(), path);
    Ok(records)
}

pub fn read_records<R: Read>(reader: R) -> Result<Vec<NeighborhoodRecord>, DatasetError> {
    let records: Vec<NeighborhoodRecord> =
        serde_json::from_reader(reader).map_err(|e| DatasetError::Json {
            path: String::from("<reader>"),
            source: e,
        })?;
    for (index, record) in records.iter().enumerate() {
        record
            .validate()
            .map_err(|source| DatasetError::Record { index, source })?;
    }
    Ok(records)
}

pub fn write_dataset(records: &[NeighborhoodRecord], path: &Path) -> Result<(), DatasetError> {
    let file = File::create(path).map_err(|e| DatasetError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, records).map_err(|e| DatasetError::Json {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    writer.flush().map_err(|e| DatasetError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    info!("Wrote {} neighborhood(s) to {:?}", records.len(), path);
    Ok(())
}

/// Drops exact duplicate records, keeping the first occurrence of each.
pub fn deduplicate(records: Vec<NeighborhoodRecord>) -> Vec<NeighborhoodRecord> {
    let total = records.len();
    let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut unique: Vec<NeighborhoodRecord> = Vec::with_capacity(total);

    for record in records {
        let bucket = buckets.entry(fingerprint(&record)).or_default();
        if bucket.iter().any(|&i| unique[i] == record) {
            continue;
        }
        bucket.push(unique.len());
        unique.push(record);
    }

    if unique.len() < total {
        debug!("Removed {} duplicate neighborhood(s)", total - unique.len());
    }
    unique
}

fn fingerprint(record: &NeighborhoodRecord) -> u64 {
    let mut hasher = DefaultHasher::new();
    record.res_id.hash(&mut hasher);
    record.atom_names.hash(&mut hasher);
    record.elements.hash(&mut hasher);
    record.res_ids.hash(&mut hasher);
    for coord in &record.coords {
        for v in coord {
            v.to_bits().hash(&mut hasher);
        }
    }
    for v in record.sasas.iter().chain(record.charges.iter()) {
        v.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}
