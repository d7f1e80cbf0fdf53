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
    author = "Structal Developers",
    version,
    about = "structal - a differentiable structural-similarity metric engine: optimal-superposition RMSD, translation-only RMSD, and distance-matrix RMSD with analytic derivatives.",
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
    /// Measure one or more instantaneous frames against a reference structure.
    Measure(MeasureArgs),
    /// Dump the DRMSD pair list resolved from a reference structure.
    Pairs(PairsArgs),
}

/// Arguments for the `measure` subcommand.
#[derive(Args, Debug)]
pub struct MeasureArgs {
    /// Path to the reference structure file (PDB format).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub reference: PathBuf,

    /// Frame files to measure, in order.
    #[arg(required = true, value_name = "FRAME")]
    pub frames: Vec<PathBuf>,

    /// Path to a metric configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Config Overrides ---
    /// Override the metric type (SIMPLE, OPTIMAL, DRMSD, INTRA-DRMSD, INTER-DRMSD).
    #[arg(short, long, value_name = "TYPE")]
    pub metric: Option<String>,

    /// Report the mean-square value instead of its root.
    #[arg(long)]
    pub squared: bool,

    /// Override the lower reference-distance cutoff for DRMSD pair filtering.
    #[arg(long, value_name = "FLOAT")]
    pub lower_cutoff: Option<f64>,

    /// Override the upper reference-distance cutoff for DRMSD pair filtering.
    #[arg(long, value_name = "FLOAT")]
    pub upper_cutoff: Option<f64>,

    /// Override the factor applied to file positions to reach the engine's
    /// internal length unit.
    #[arg(long, value_name = "FLOAT")]
    pub length_scale: Option<f64>,

    // --- Output ---
    /// Print per-atom derivatives for every frame.
    #[arg(short, long)]
    pub derivatives: bool,

    /// Print the virial tensor for every frame.
    #[arg(long)]
    pub virial: bool,
}

/// Arguments for the `pairs` subcommand.
#[derive(Args, Debug)]
pub struct PairsArgs {
    /// Path to the reference structure file (PDB format).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub reference: PathBuf,

    /// Pair-filter mode (DRMSD, INTRA-DRMSD, or INTER-DRMSD).
    #[arg(short, long, default_value = "DRMSD", value_name = "TYPE")]
    pub metric: String,

    /// Lower reference-distance cutoff (exclusive).
    #[arg(long, default_value_t = 0.0, value_name = "FLOAT")]
    pub lower_cutoff: f64,

    /// Upper reference-distance cutoff (inclusive).
    #[arg(long, default_value_t = f64::INFINITY, value_name = "FLOAT")]
    pub upper_cutoff: f64,

    /// Factor applied to file positions to reach the engine's internal length unit.
    #[arg(long, default_value_t = 1.0, value_name = "FLOAT")]
    pub length_scale: f64,
}
