use super::load_records;
use crate::cli::CheckArgs;
use crate::config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use nbprep::core::params::ReconstructionParams;
use nbprep::engine::progress::ProgressReporter;
use nbprep::workflows;
use nbprep::workflows::check::{CheckOptions, CheckReport};
use tracing::info;

pub fn run(args: CheckArgs) -> Result<()> {
    let settings = config::build_downsample_settings(&args.config, &args.sampling)?;
    let params = match config::resolve_params_path(&args.config, args.params.as_deref())? {
        Some(path) => {
            info!("Loading reconstruction parameters from {:?}", path);
            Some(ReconstructionParams::load(&path).map_err(CliError::core)?)
        }
        None => None,
    };
    let records = load_records(&args.input, args.dedup)?;

    let options = CheckOptions {
        removal_probability: settings.removal_probability,
        seed: settings.seed,
        limit: args.limit,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let report = workflows::check::run(
        &records,
        &settings.core_config,
        &options,
        params.as_ref(),
        &reporter,
    )?;
    print_report(&report, settings.removal_probability);

    if report.passed() {
        Ok(())
    } else {
        Err(CliError::CheckFailed(report.violations.len()))
    }
}

fn print_report(report: &CheckReport, p: f64) {
    println!(
        "Downsampled {} record(s) in {:.3}s ({:.1} records/s)",
        report.records_checked,
        report.elapsed.as_secs_f64(),
        report.records_per_second()
    );

    if report.passed() {
        println!("\nSANITY CHECKS PASSED");
        println!("  - All backbone atoms remain");
        println!("  - Central side chain removed");
        println!("  - Side chains kept or removed as a whole");
    } else {
        println!("\nSANITY CHECKS FAILED");
        for violation in &report.violations {
            println!("  - record {}: {}", violation.index, violation.detail);
        }
    }

    match &report.removed_proportion {
        Some(estimate) => println!(
            "  - 95% Student-t interval for the proportion of removed side chains: ({:.4}, {:.4}) over {} record(s) (true p={})",
            estimate.lower, estimate.upper, estimate.samples, p
        ),
        None => println!("  - No record had a non-central side chain to remove"),
    }

    if let Some(summary) = &report.reconstruction {
        println!(
            "\nReconstruction from measured chi angles: {} evaluated, {} skipped",
            summary.evaluated, summary.skipped
        );
        if let Some(mean) = summary.mean {
            println!("  mean RMSD {:.4} Å", mean);
        }
        for (residue, stat) in &summary.per_residue {
            println!("  {:<4} n={:<6} RMSD {:.4} Å", residue, stat.count, stat.mean);
        }
    }
}
