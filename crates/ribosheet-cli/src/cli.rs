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
    author = "Ribosheet Developers",
    version,
    about = "Ribosheet CLI - assemble chiral sugar monolayers on nucleobase sheets, simulate them and analyze their hydrogen-bond statistics.",
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

    /// Set the number of threads used for per-run analysis.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build sugar monolayers and run independent restrained simulation jobs.
    Simulate(SimulateArgs),
    /// Analyze finished runs and write CSV reports.
    Analyze(AnalyzeArgs),
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the simulation configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the output directory from the config file.
    #[arg(short, long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Override the number of independent jobs.
    #[arg(short = 'n', long, value_name = "INT")]
    pub runs: Option<usize>,

    /// Override the number of jobs running at the same time.
    #[arg(short, long, value_name = "INT")]
    pub processes: Option<usize>,

    /// Base seed; each job derives its own seed from it.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Skip solvation, overriding the config file.
    #[arg(long)]
    pub no_solvent: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S sheet.l-count=12
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the analysis configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the directory holding the simulation outputs.
    #[arg(short, long, value_name = "PATH")]
    pub input_dir: Option<PathBuf>,

    /// Override the report directory.
    #[arg(short, long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Override the number of runs to analyze.
    #[arg(short = 'n', long, value_name = "INT")]
    pub runs: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S analysis.chunk-size=50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
