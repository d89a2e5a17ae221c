use super::load_records;
use crate::cli::ReconstructArgs;
use crate::config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use nbprep::core::io::chi_angles::load_chi_angles;
use nbprep::core::params::ReconstructionParams;
use nbprep::engine::progress::ProgressReporter;
use nbprep::engine::reconstruct::ChiPrecondition;
use nbprep::workflows;
use nbprep::workflows::reconstruct::{ReconstructionReport, ReportStatus};
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

pub fn run(args: ReconstructArgs) -> Result<()> {
    let params_path = config::resolve_params_path(&args.config, args.params.as_deref())?
        .ok_or_else(|| {
            CliError::Config(
                "A value for 'reconstruction.params-path' is required either in the config file or via --params."
                    .to_string(),
            )
        })?;

    info!("Loading reconstruction parameters from {:?}", params_path);
    let params = ReconstructionParams::load(&params_path).map_err(CliError::core)?;
    let chi_angles = load_chi_angles(&args.chi).map_err(CliError::core)?;
    let records = load_records(&args.input, false)?;

    let precondition = if args.observed_only {
        ChiPrecondition::TargetObserved
    } else {
        ChiPrecondition::AnchorsPresent
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Reconstructing {} side chain(s)...", records.len());
    let results =
        workflows::reconstruct::run(&records, &chi_angles, &params, precondition, &reporter);
    let reports: Vec<ReconstructionReport> = results.iter().map(|r| r.report()).collect();

    let writer = BufWriter::new(File::create(&args.output)?);
    serde_json::to_writer_pretty(writer, &reports).map_err(|e| CliError::FileParsing {
        path: args.output.clone(),
        source: e.into(),
    })?;

    let count = |status| reports.iter().filter(|r| r.status == status).count();
    println!(
        "✓ Wrote {} report(s) to {}: {} placed, {} aborted, {} failed",
        reports.len(),
        args.output.display(),
        count(ReportStatus::Placed),
        count(ReportStatus::Aborted),
        count(ReportStatus::Failed)
    );
    Ok(())
}
