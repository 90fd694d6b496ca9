use clap::{Args, Parser, Subcommand, ValueEnum};
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
    about = "rxnet - automated reaction pathway search: constrained bond-stretch scans, \
             trajectory segmentation, and barrier-ranked reaction network assembly.",
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

    /// Set the number of threads for parallel scan jobs.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a batch of constrained bond-stretch scans and distill each
    /// trajectory into a persisted pathway record.
    Scan(ScanArgs),
    /// Assemble the species catalog and the barrier-ranked reaction network
    /// from every stored pathway record.
    Network(NetworkArgs),
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to the starting geometry in XYZ format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the scan settings file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Results root; pathway records land under `<RESULTS>/reactions/`.
    #[arg(short, long, default_value = "results", value_name = "DIR")]
    pub results: PathBuf,

    /// Override the absolute energy ceiling that stops a relaxation chain.
    #[arg(long, value_name = "FLOAT")]
    pub energy_max: Option<f64>,

    /// Keep per-call engine scratch directories for debugging.
    #[arg(long)]
    pub keep_scratch: bool,
}

/// Identifier column used to key the species catalog.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdColumn {
    /// Connectivity only, stereochemistry ignored.
    #[default]
    Plain,
    /// Stereo-resolved identifiers.
    Stereo,
}

/// Ranking key for ordering destinations and picking representatives.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ranking {
    /// Transition-state energy referenced to catalog species energies.
    #[default]
    TsEnergy,
    /// Barrier height within one pathway.
    Barrier,
    /// Reaction energy against catalog species energies.
    DeltaE,
    /// Reaction energy within one pathway.
    LocalDeltaE,
}

/// Arguments for the `network` subcommand.
#[derive(Args, Debug)]
pub struct NetworkArgs {
    /// Results root produced by `rxnet scan`.
    #[arg(short, long, default_value = "results", value_name = "DIR")]
    pub results: PathBuf,

    /// Seed species to expand from (repeatable). Defaults to expanding the
    /// whole catalog, highest-energy species first.
    #[arg(short, long = "seed", value_name = "ID")]
    pub seeds: Vec<String>,

    /// Identifier column to key species on.
    #[arg(long, value_enum, default_value_t = IdColumn::Plain)]
    pub ids: IdColumn,

    /// Ranking key for destination ordering and representative pathways.
    #[arg(long, value_enum, default_value_t = Ranking::TsEnergy)]
    pub ranking: Ranking,

    /// Retain candidate edges whose transition state does not exceed both
    /// endpoints instead of dropping them.
    #[arg(long)]
    pub keep_artifacts: bool,

    /// Re-derive identifiers with these 1-based atoms excluded; requires the
    /// canonicalizer section of the settings file.
    #[arg(long = "exclude-atom", value_name = "INDEX")]
    pub exclude_atoms: Vec<usize>,

    /// Settings file holding the canonicalizer definition; only needed with
    /// --exclude-atom.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
