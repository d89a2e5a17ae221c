use super::load_records;
use crate::cli::DownsampleArgs;
use crate::config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use nbprep::core::io::dataset;
use nbprep::engine::progress::ProgressReporter;
use nbprep::workflows;
use tracing::info;

pub fn run(args: DownsampleArgs) -> Result<()> {
    let settings = config::build_downsample_settings(&args.config, &args.sampling)?;
    info!(
        "Resolved settings: capacity={}, p={}, seed={}",
        settings.core_config.capacity, settings.removal_probability, settings.seed
    );

    let records = load_records(&args.input, args.dedup)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Downsampling {} neighborhood(s)...", records.len());
    let downsampled = workflows::downsample::run(
        &records,
        &settings.core_config,
        settings.removal_probability,
        settings.seed,
        &reporter,
    )?;

    dataset::write_dataset(&downsampled, &args.output).map_err(CliError::core)?;

    let before: usize = records.iter().map(|r| r.atom_count()).sum();
    let after: usize = downsampled.iter().map(|r| r.atom_count()).sum();
    println!(
        "✓ Wrote {} record(s) to {} ({} of {} atoms kept)",
        downsampled.len(),
        args.output.display(),
        after,
        before
    );
    Ok(())
}
