use crate::core::io::chi_angles::ChiAngleTable;
use crate::core::models::ids::ResidueId;
use crate::core::models::neighborhood::NeighborhoodRecord;
use crate::core::params::ReconstructionParams;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reconstruct::{
    AbortReason, ChiPrecondition, ChiReconstructor, Reconstruction, ReconstructionError,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The reconstruction outcome of one record of a batch.
#[derive(Debug)]
pub struct RecordReconstruction {
    pub index: usize,
    pub res_id: ResidueId,
    pub outcome: Result<Reconstruction, ReconstructionError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedAtom {
    pub name: String,
    pub coord: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Placed,
    Aborted,
    Failed,
}

/// Serializable summary of a [`RecordReconstruction`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructionReport {
    pub index: usize,
    pub res_id: ResidueId,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub atoms: Vec<PlacedAtom>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RecordReconstruction {
    pub fn report(&self) -> ReconstructionReport {
        let (status, atoms, reason) = match &self.outcome {
            Ok(Reconstruction::Placed(placed)) => (
                ReportStatus::Placed,
                placed
                    .iter()
                    .map(|(name, p)| PlacedAtom {
                        name: name.to_string(),
                        coord: [p.x, p.y, p.z],
                    })
                    .collect(),
                None,
            ),
            Ok(Reconstruction::Aborted(reason)) => {
                (ReportStatus::Aborted, Vec::new(), Some(describe(reason)))
            }
            Err(e) => (ReportStatus::Failed, Vec::new(), Some(e.to_string())),
        };
        ReconstructionReport {
            index: self.index,
            res_id: self.res_id.clone(),
            status,
            atoms,
            reason,
        }
    }
}

fn describe(reason: &AbortReason) -> String {
    match reason {
        AbortReason::UnknownResidue { code } => format!("unknown residue code '{}'", code),
        AbortReason::NoSideChainFreedom { residue } => {
            format!("{} has no chi degrees of freedom", residue)
        }
        AbortReason::MissingBackbone { atom } => format!("backbone atom {} is missing", atom),
    }
}

/// Rebuilds the central side chain of every record from its row in `chi_angles`.
///
/// Records without a row are reconstructed with no chi angles, which places CB only. Every
/// record yields an outcome; a failing record never aborts the batch.
#[instrument(skip_all, name = "reconstruct_workflow", fields(records = records.len()))]
pub fn run(
    records: &[NeighborhoodRecord],
    chi_angles: &ChiAngleTable,
    params: &ReconstructionParams,
    precondition: ChiPrecondition,
    reporter: &ProgressReporter,
) -> Vec<RecordReconstruction> {
    let reconstructor = ChiReconstructor::new(params).with_precondition(precondition);

    info!("Reconstructing side chains of {} neighborhoods.", records.len());
    reporter.report(Progress::BatchStart {
        name: "Reconstruction",
        total: records.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = records.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = records.par_iter().enumerate();

    let results: Vec<RecordReconstruction> = iterator
        .map(|(index, record)| {
            let angles = chi_angles.get(&index).map(Vec::as_slice).unwrap_or(&[]);
            let outcome = reconstructor.reconstruct(record, angles);
            if let Err(e) = &outcome {
                warn!("Record {} ({}): {}", index, record.res_id, e);
            }
            reporter.report(Progress::ItemDone);
            RecordReconstruction {
                index,
                res_id: record.res_id.clone(),
                outcome,
            }
        })
        .collect();

    reporter.report(Progress::BatchFinish);

    let placed = results
        .iter()
        .filter(|r| matches!(r.outcome, Ok(Reconstruction::Placed(_))))
        .count();
    let failed = results.iter().filter(|r| r.outcome.is_err()).count();
    info!(
        placed,
        aborted = results.len() - placed - failed,
        failed,
        "Reconstruction finished."
    );
    results
}
