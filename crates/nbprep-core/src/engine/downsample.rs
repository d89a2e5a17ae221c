use super::config::DownsampleConfig;
use super::mask::{GroupMaskOracle, MaskError, MaskOracle, MaskRequest};
use crate::core::models::ids::KeyError;
use crate::core::models::neighborhood::{
    CapacityExceeded, NeighborhoodRecord, RecordError, pad_to_capacity,
};
use rand::Rng;
use thiserror::Error;
use tracing::{instrument, trace};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DownsampleError {
    #[error("Malformed neighborhood record: {0}")]
    Record(#[from] RecordError),

    #[error("Central residue {res_id} has no usable key: {source}")]
    CentralKey { res_id: String, source: KeyError },

    #[error("Atom slot {slot} has no usable residue key: {source}")]
    AtomKey { slot: usize, source: KeyError },

    #[error("Mask computation failed: {0}")]
    Mask(#[from] MaskError),

    #[error("Repacking failed: {0}")]
    Capacity(#[from] CapacityExceeded),
}

/// Removes side chains from neighborhoods and repacks them into fixed-capacity records.
#[derive(Debug, Clone)]
pub struct Downsampler<O = GroupMaskOracle> {
    config: DownsampleConfig,
    oracle: O,
}

impl Downsampler<GroupMaskOracle> {
    pub fn new(config: DownsampleConfig) -> Self {
        Self::with_oracle(config, GroupMaskOracle)
    }
}

impl<O: MaskOracle> Downsampler<O> {
    pub fn with_oracle(config: DownsampleConfig, oracle: O) -> Self {
        Self { config, oracle }
    }

    pub fn config(&self) -> &DownsampleConfig {
        &self.config
    }

    /// Returns a copy of `record` in which each non-central side chain was removed with
    /// probability `p` and the central side chain was always removed.
    ///
    /// Backbone atoms and the central residue id are preserved. The input is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DownsampleError::Capacity`] when more atoms survive than the configured
    /// capacity holds; data is never silently truncated.
    #[instrument(level = "trace", skip_all, fields(central = %record.res_id, p = p))]
    pub fn downsample<R: Rng + ?Sized>(
        &self,
        record: &NeighborhoodRecord,
        p: f64,
        rng: &mut R,
    ) -> Result<NeighborhoodRecord, DownsampleError> {
        record.validate()?;

        let central = record
            .res_id
            .key()
            .map_err(|source| DownsampleError::CentralKey {
                res_id: record.res_id.to_string(),
                source,
            })?;

        let atom_count = record.atom_count();
        let mut chains = Vec::with_capacity(atom_count);
        let mut sites = Vec::with_capacity(atom_count);
        for (slot, res_id) in record.res_ids[..atom_count].iter().enumerate() {
            let key = res_id
                .key()
                .map_err(|source| DownsampleError::AtomKey { slot, source })?;
            chains.push(key.chain);
            sites.push(key.site);
        }

        let mask = self.oracle.compute_mask(
            &MaskRequest {
                atom_count,
                max_sites: self.config.max_sites,
                chains: &chains,
                sites: &sites,
                atom_names: &record.atom_names,
                backbone_atoms: &self.config.backbone_atoms,
                removal_probability: p,
                central: &central,
            },
            rng,
        )?;

        let kept: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        trace!("Keeping {} of {} atoms", kept.len(), atom_count);

        let capacity = self.config.capacity;
        Ok(NeighborhoodRecord {
            res_id: record.res_id.clone(),
            atom_names: pad_to_capacity(gather(&record.atom_names, &kept), capacity)?,
            elements: pad_to_capacity(gather(&record.elements, &kept), capacity)?,
            res_ids: pad_to_capacity(gather(&record.res_ids, &kept), capacity)?,
            coords: pad_to_capacity(gather(&record.coords, &kept), capacity)?,
            sasas: pad_to_capacity(gather(&record.sasas, &kept), capacity)?,
            charges: pad_to_capacity(gather(&record.charges, &kept), capacity)?,
        })
    }
}

fn gather<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i].clone()).collect()
}
