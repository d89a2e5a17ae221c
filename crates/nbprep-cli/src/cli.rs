use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "NBPREP CLI - Stochastic side-chain downsampling and chi-angle side-chain reconstruction for protein atomic neighborhoods.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove side chains from every neighborhood of a dataset.
    Downsample(DownsampleArgs),
    /// Rebuild the central side chain of every neighborhood from chi angles.
    Reconstruct(ReconstructArgs),
    /// Downsample a dataset in memory and verify the result.
    Check(CheckArgs),
}

/// Configuration file and `--set` overrides shared by all commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file and flags.
    /// Can be used multiple times. Example: -S downsampling.seed=7
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Downsampling overrides shared by `downsample` and `check`.
#[derive(Args, Debug, Clone, Default)]
pub struct SamplingArgs {
    /// Probability of removing each non-central side chain.
    #[arg(short = 'p', long, value_name = "FLOAT")]
    pub removal_probability: Option<f64>,

    /// Seed of the per-record random number generators.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Number of atom slots in every output record.
    #[arg(long, value_name = "INT")]
    pub capacity: Option<usize>,
}

/// Arguments for the `downsample` subcommand.
#[derive(Args, Debug)]
pub struct DownsampleArgs {
    /// Path to the input dataset (JSON array of neighborhoods).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the downsampled dataset.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Drop exact duplicate records before downsampling.
    #[arg(long)]
    pub dedup: bool,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub sampling: SamplingArgs,
}

/// Arguments for the `reconstruct` subcommand.
#[derive(Args, Debug)]
pub struct ReconstructArgs {
    /// Path to the input dataset (JSON array of neighborhoods).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// CSV of chi angles with header `index,chi1,chi2,chi3,chi4`.
    #[arg(long, required = true, value_name = "PATH")]
    pub chi: PathBuf,

    /// Reconstruction parameter table. Overrides `reconstruction.params-path`.
    #[arg(long, value_name = "PATH")]
    pub params: Option<PathBuf>,

    /// Path for the JSON reconstruction report.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Only rebuild side-chain atoms that are present in the input.
    #[arg(long)]
    pub observed_only: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the input dataset (JSON array of neighborhoods).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Also evaluate reconstruction accuracy with this parameter table.
    /// Overrides `reconstruction.params-path`.
    #[arg(long, value_name = "PATH")]
    pub params: Option<PathBuf>,

    /// Check only the first N records.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Drop exact duplicate records before checking.
    #[arg(long)]
    pub dedup: bool,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub sampling: SamplingArgs,
}
