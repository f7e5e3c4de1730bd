mod commands;

use crate::commands::{Cli, Commands};
use anyhow::Result;
use bkrun::{logging, sysexits};
use clap::Parser;
use std::process;

/// Entry point for the bkrun CLI application.
/// Parses command-line arguments and dispatches to the appropriate command handler.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let commands = match cli.commands {
        Some(commands) => commands,
        None => {
            eprintln!("bkrun requires at least one command to execute. See 'bkrun --help' for usage.");
            process::exit(sysexits::EX_USAGE);
        }
    };

    logging::init(cli.verbose);

    match commands {
        Commands::Run { config, only } => commands::run(config, only)?,
        Commands::Plan { config } => commands::plan(config)?,
        Commands::Check { config } => commands::check(config)?,
        Commands::Config { init } => commands::config(init)?,
    }
    Ok(())
}
