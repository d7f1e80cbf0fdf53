mod cli;
mod commands;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("structal v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let command_result = match cli.command {
        Commands::Measure(args) => {
            info!("Dispatching to 'measure' command.");
            commands::measure::run(args)
        }
        Commands::Pairs(args) => {
            info!("Dispatching to 'pairs' command.");
            commands::pairs::run(args)
        }
    };

    if let Err(e) = &command_result {
        error!("Command failed: {}", e);
    }

    command_result
}
