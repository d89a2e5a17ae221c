use super::record_rng;
use crate::core::models::neighborhood::NeighborhoodRecord;
use crate::engine::config::{DownsampleConfig, check_probability};
use crate::engine::downsample::Downsampler;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Downsamples every record with removal probability `p`.
///
/// Record `i` draws from [`record_rng(seed, i)`](super::record_rng), so the output depends only
/// on the inputs and `seed`. Output order matches input order.
///
/// # Errors
///
/// Returns [`EngineError::Config`] for a probability outside `[0, 1]` and
/// [`EngineError::Downsample`] for the first record (by index) that could not be downsampled.
#[instrument(skip_all, name = "downsample_workflow", fields(records = records.len(), p = p, seed = seed))]
pub fn run(
    records: &[NeighborhoodRecord],
    config: &DownsampleConfig,
    p: f64,
    seed: u64,
    reporter: &ProgressReporter,
) -> Result<Vec<NeighborhoodRecord>, EngineError> {
    let p = check_probability(p)?;
    let downsampler = Downsampler::new(config.clone());

    info!("Downsampling {} neighborhoods.", records.len());
    reporter.report(Progress::BatchStart {
        name: "Downsampling",
        total: records.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = records.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = records.par_iter().enumerate();

    let results: Vec<Result<NeighborhoodRecord, EngineError>> = iterator
        .map(|(index, record)| {
            let mut rng = record_rng(seed, index);
            let result = downsampler
                .downsample(record, p, &mut rng)
                .map_err(|source| EngineError::Downsample {
                    index,
                    res_id: Box::new(record.res_id.clone()),
                    source,
                });
            reporter.report(Progress::ItemDone);
            result
        })
        .collect();

    reporter.report(Progress::BatchFinish);

    let downsampled = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    let kept: usize = downsampled.iter().map(|r| r.atom_count()).sum();
    let before: usize = records.iter().map(|r| r.atom_count()).sum();
    info!(atoms_before = before, atoms_after = kept, "Downsampling finished.");
    Ok(downsampled)
}
