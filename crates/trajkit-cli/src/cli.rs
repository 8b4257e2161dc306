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
    author = "trajkit developers",
    version,
    about = "trajkit - Range-aware traversal and ensemble reweighting of molecular-dynamics trajectories.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the frame count, atom count and unit cell of a trajectory.
    Info(InfoArgs),
    /// Walk a frame range and tabulate per-frame summaries.
    Scan(ScanArgs),
    /// Reweight the frames of a trajectory under a pair-potential perturbation.
    Reweight(ReweightArgs),
}

/// Frame selection shared by the traversing subcommands.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct RangeArgs {
    /// First frame to visit (1-based).
    #[arg(long, value_name = "INT")]
    pub first: Option<usize>,

    /// Last frame that may be visited (1-based, inclusive). Defaults to the final frame.
    #[arg(long, value_name = "INT")]
    pub last: Option<usize>,

    /// Visit every N-th frame starting at `--first`.
    #[arg(long, value_name = "INT")]
    pub step: Option<usize>,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the trajectory file (.xyz or .pdb).
    #[arg(required = true, value_name = "PATH")]
    pub trajectory: PathBuf,
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to the trajectory file (.xyz or .pdb).
    #[arg(required = true, value_name = "PATH")]
    pub trajectory: PathBuf,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Write the table to this CSV file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `reweight` subcommand.
#[derive(Args, Debug)]
pub struct ReweightArgs {
    // --- Core Arguments ---
    /// Path to the topology file (.pdb or .xyz); its first frame supplies the atom records.
    #[arg(short = 's', long, required = true, value_name = "PATH")]
    pub topology: PathBuf,

    /// Path to the trajectory file (.xyz or .pdb).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub trajectory: PathBuf,

    /// Path to the reweighting configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path for the output CSV table of frame weights.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    // --- Range Overrides ---
    #[command(flatten)]
    pub range: RangeArgs,

    // --- Reweighting Overrides ---
    /// Override the pair cutoff distance in angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Override the temperature.
    #[arg(long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S reweight.cutoff=10.0
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
