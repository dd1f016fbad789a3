mod cli;
mod commands;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("off2gmx v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let result = match cli.command {
        Commands::Convert(args) => {
            info!("Dispatching to 'convert' command.");
            commands::convert::run(args)
        }
        Commands::Inspect(args) => {
            info!("Dispatching to 'inspect' command.");
            commands::inspect::run(args)
        }
    };

    if let Err(e) = &result {
        error!("Command failed: {}", e);
    }
    result
}
