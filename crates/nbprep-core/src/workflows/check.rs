use crate::core::models::ids::ResidueKey;
use crate::core::models::neighborhood::NeighborhoodRecord;
use crate::core::params::ReconstructionParams;
use crate::core::utils::geometry::calculate_named_rmsd;
use crate::engine::chi::measure_chi_angles;
use crate::engine::config::DownsampleConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reconstruct::{
    ChiPrecondition, ChiReconstructor, Reconstruction, residue_atoms,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Two-sided 95% quantile of the standard normal distribution.
const Z_95: f64 = 1.959_963_984_540_054;

/// Two-sided 95% quantiles of Student's t for 1 to 30 degrees of freedom.
const T_95: [f64; 30] = [
    12.706_205, 4.302_653, 3.182_446, 2.776_445, 2.570_582, 2.446_912, 2.364_624, 2.306_004,
    2.262_157, 2.228_139, 2.200_985, 2.178_813, 2.160_369, 2.144_787, 2.131_450, 2.119_905,
    2.109_816, 2.100_922, 2.093_024, 2.085_963, 2.079_614, 2.073_873, 2.068_658, 2.063_899,
    2.059_539, 2.055_529, 2.051_831, 2.048_407, 2.045_230, 2.042_272,
];

/// Two-sided 95% quantile of Student's t with `df` degrees of freedom.
///
/// Tabulated up to 30; beyond that the Cornish-Fisher expansion around [`Z_95`] is accurate to
/// better than 1e-5.
pub fn t_quantile_95(df: usize) -> f64 {
    if let Some(&t) = df.checked_sub(1).and_then(|i| T_95.get(i)) {
        return t;
    }
    let v = df as f64;
    let z = Z_95;
    let (z3, z5, z7, z9) = (z.powi(3), z.powi(5), z.powi(7), z.powi(9));
    z + (z3 + z) / (4.0 * v)
        + (5.0 * z5 + 16.0 * z3 + 3.0 * z) / (96.0 * v.powi(2))
        + (3.0 * z7 + 19.0 * z5 + 17.0 * z3 - 15.0 * z) / (384.0 * v.powi(3))
        + (79.0 * z9 + 776.0 * z7 + 1482.0 * z5 - 1920.0 * z3 - 945.0 * z) / (92160.0 * v.powi(4))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOptions {
    pub removal_probability: f64,
    pub seed: u64,
    /// Check only the first `limit` records.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    BackboneCountChanged,
    CentralSideChainKept,
    SideChainSplit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub index: usize,
    pub kind: ViolationKind,
    pub detail: String,
}

/// Mean of per-record removed side-chain proportions with a 95% Student-t interval
/// (`n - 1` degrees of freedom).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProportionEstimate {
    pub samples: usize,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ProportionEstimate {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let half_width = if samples.len() > 1 {
            let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
            t_quantile_95(samples.len() - 1) * (variance / n).sqrt()
        } else {
            0.0
        };
        Some(Self {
            samples: samples.len(),
            mean,
            lower: mean - half_width,
            upper: mean + half_width,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmsdStat {
    pub count: usize,
    pub mean: f64,
}

/// Accuracy of rebuilding observed side chains from their own measured chi angles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RmsdSummary {
    pub evaluated: usize,
    pub skipped: usize,
    pub mean: Option<f64>,
    pub per_residue: BTreeMap<String, RmsdStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub records_checked: usize,
    pub elapsed: Duration,
    pub violations: Vec<Violation>,
    pub removed_proportion: Option<ProportionEstimate>,
    pub reconstruction: Option<RmsdSummary>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.records_checked as f64 / secs
        } else {
            0.0
        }
    }
}

/// Downsamples (a prefix of) the dataset and verifies the result.
///
/// Checks that every record keeps its backbone atom count, loses its central side chain and
/// keeps or drops each other side chain as a whole, and estimates the removed proportion.
/// With `params`, also measures how well the original side chains are rebuilt from their own
/// chi angles.
#[instrument(skip_all, name = "check_workflow")]
pub fn run(
    records: &[NeighborhoodRecord],
    config: &DownsampleConfig,
    options: &CheckOptions,
    params: Option<&ReconstructionParams>,
    reporter: &ProgressReporter,
) -> Result<CheckReport, EngineError> {
    let end = options.limit.map_or(records.len(), |l| l.min(records.len()));
    let sample = &records[..end];

    let start = Instant::now();
    let downsampled = super::downsample::run(
        sample,
        config,
        options.removal_probability,
        options.seed,
        reporter,
    )?;
    let elapsed = start.elapsed();
    info!(
        records = sample.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Downsampling benchmark finished."
    );

    let mut violations = Vec::new();
    let mut proportions = Vec::with_capacity(sample.len());
    for (index, (before, after)) in sample.iter().zip(&downsampled).enumerate() {
        violations.extend(check_record(index, before, after, config));
        if let Some(p) = removed_proportion(before, after, config) {
            proportions.push(p);
        }
    }
    for violation in &violations {
        warn!("Record {}: {}", violation.index, violation.detail);
    }

    let reconstruction = params.map(|params| reconstruction_rmsd(sample, params, config, reporter));

    Ok(CheckReport {
        records_checked: sample.len(),
        elapsed,
        violations,
        removed_proportion: ProportionEstimate::from_samples(&proportions),
        reconstruction,
    })
}

/// Compares one record with its downsampled form.
pub fn check_record(
    index: usize,
    before: &NeighborhoodRecord,
    after: &NeighborhoodRecord,
    config: &DownsampleConfig,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    let backbone_before = backbone_count(before, config);
    let backbone_after = backbone_count(after, config);
    if backbone_before != backbone_after {
        violations.push(Violation {
            index,
            kind: ViolationKind::BackboneCountChanged,
            detail: format!(
                "backbone atom count changed from {} to {}",
                backbone_before, backbone_after
            ),
        });
    }

    let side_before = side_chain_counts(before, config);
    let side_after = side_chain_counts(after, config);
    if after
        .res_id
        .key()
        .is_ok_and(|central| side_after.contains_key(&central))
    {
        violations.push(Violation {
            index,
            kind: ViolationKind::CentralSideChainKept,
            detail: format!("central residue {} kept side-chain atoms", after.res_id),
        });
    }
    for (key, &kept) in &side_after {
        let original = side_before.get(key).copied().unwrap_or(0);
        if kept != original {
            violations.push(Violation {
                index,
                kind: ViolationKind::SideChainSplit,
                detail: format!(
                    "residue group {} kept {} of {} side-chain atoms",
                    key, kept, original
                ),
            });
        }
    }
    violations
}

/// Fraction of non-central side chains that were removed; `None` when there were none.
pub fn removed_proportion(
    before: &NeighborhoodRecord,
    after: &NeighborhoodRecord,
    config: &DownsampleConfig,
) -> Option<f64> {
    let mut eligible: HashSet<ResidueKey> = side_chain_counts(before, config).into_keys().collect();
    if let Ok(central) = before.res_id.key() {
        eligible.remove(&central);
    }
    if eligible.is_empty() {
        return None;
    }
    let surviving = side_chain_counts(after, config)
        .into_keys()
        .filter(|key| eligible.contains(key))
        .count();
    Some(1.0 - surviving as f64 / eligible.len() as f64)
}

fn backbone_count(record: &NeighborhoodRecord, config: &DownsampleConfig) -> usize {
    record.atoms().filter(|a| config.is_backbone(a.name)).count()
}

/// Side-chain atom counts per `(chain, site)` group. Atoms whose site is not numeric cannot be
/// grouped and are not counted; the downsampler rejects such records.
fn side_chain_counts(
    record: &NeighborhoodRecord,
    config: &DownsampleConfig,
) -> HashMap<ResidueKey, usize> {
    let mut counts = HashMap::new();
    for atom in record.atoms().filter(|a| !config.is_backbone(a.name)) {
        if let Ok(key) = atom.res_id.key() {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

fn reconstruction_rmsd(
    records: &[NeighborhoodRecord],
    params: &ReconstructionParams,
    config: &DownsampleConfig,
    reporter: &ProgressReporter,
) -> RmsdSummary {
    let reconstructor =
        ChiReconstructor::new(params).with_precondition(ChiPrecondition::TargetObserved);

    reporter.report(Progress::BatchStart {
        name: "Reconstruction check",
        total: records.len() as u64,
    });

    let mut summary = RmsdSummary::default();
    let mut sums: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for record in records {
        reporter.report(Progress::ItemDone);
        let angles = measure_chi_angles(record, params);
        let placed = match reconstructor.reconstruct(record, &angles) {
            Ok(Reconstruction::Placed(placed)) => placed,
            _ => {
                summary.skipped += 1;
                continue;
            }
        };

        // Only the central side chain is compared; backbone atoms are inputs, not outputs.
        let observed = residue_atoms(record, &record.res_id);
        let observed_side_chain = observed.iter().filter(|(name, _)| !config.is_backbone(name));
        let Some(rmsd) = calculate_named_rmsd(placed.iter(), observed_side_chain) else {
            summary.skipped += 1;
            continue;
        };

        let residue = params
            .residue_name(&record.res_id.residue_name)
            .unwrap_or(record.res_id.residue_name.as_str())
            .to_string();
        let entry = sums.entry(residue).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += rmsd;
        summary.evaluated += 1;
    }
    reporter.report(Progress::BatchFinish);

    let total: f64 = sums.values().map(|(_, sum)| sum).sum();
    if summary.evaluated > 0 {
        summary.mean = Some(total / summary.evaluated as f64);
    }
    summary.per_residue = sums
        .into_iter()
        .map(|(residue, (count, sum))| {
            (
                residue,
                RmsdStat {
                    count,
                    mean: sum / count as f64,
                },
            )
        })
        .collect();
    summary
}
