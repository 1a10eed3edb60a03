mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod scheduler;
mod utils;

use crate::cli::{Cli, Commands};
use crate::config::{PartialAnalysisConfig, PartialSimulationConfig};
use crate::error::{CliError, Result};
use clap::Parser;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

enum LoadedCommand {
    Simulate(cli::SimulateArgs, PartialSimulationConfig),
    Analyze(cli::AnalyzeArgs, PartialAnalysisConfig),
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();

    // The config file is read before logging starts: its `verbose` flag sets the default level.
    let (loaded, config_verbose) = match cli.command {
        Commands::Simulate(args) => {
            let partial = PartialSimulationConfig::from_file(&args.config)?;
            let verbose = partial.verbose()?;
            (LoadedCommand::Simulate(args, partial), verbose)
        }
        Commands::Analyze(args) => {
            let partial = PartialAnalysisConfig::from_file(&args.config)?;
            let verbose = partial.verbose()?;
            (LoadedCommand::Analyze(args, partial), verbose)
        }
    };
    logging::setup_logging(
        logging::level_filter(cli.verbose, cli.quiet, config_verbose),
        cli.log_file.clone(),
    )?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("🚀 Ribosheet CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        threads = ?cli.threads,
        "Global CLI arguments parsed."
    );

    if let Some(num_threads) = cli.threads {
        info!("Setting Rayon global thread pool to {} threads.", num_threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e))
            })?;
    }

    let command_result = match loaded {
        LoadedCommand::Simulate(args, partial) => {
            info!("Dispatching to 'simulate' command.");
            commands::simulate::run(args, partial, cli.quiet).await
        }
        LoadedCommand::Analyze(args, partial) => {
            info!("Dispatching to 'analyze' command.");
            commands::analyze::run(args, partial, cli.quiet).await
        }
    };

    match &command_result {
        Ok(_) => {
            info!("✅ Command completed successfully.");
            println!("✅ Command completed successfully.");
        }
        Err(e) => {
            error!("❌ Command failed: {}", e);
        }
    }

    command_result
}
