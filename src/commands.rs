//! Command-line interface definition for bkrun.
//!
//! This module defines the CLI commands and the glue between them and the
//! library: loading the configuration, running or previewing the items, and
//! mapping outcomes to exit codes.

use anyhow::{Context, Result, bail};
use bkrun::application::{self, Application};
use bkrun::constants::CONFIG_ENV;
use bkrun::naming::{Clock, SystemClock, derive_run_name};
use bkrun::orchestrator;
use bkrun::plan::{ResolvedPlan, resolve};
use bkrun::report::Action;
use bkrun::sysexits;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

/// Command-line interface definition for bkrun.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Subcommand to execute.
    #[command(subcommand)]
    pub commands: Option<Commands>,
}

/// Supported bkrun commands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Back up every configured item, one result line per item.
    Run {
        /// Configuration file. Defaults to the per-user config file.
        #[arg(short, long, env = CONFIG_ENV)]
        config: Option<PathBuf>,
        /// Only run the named items (comma-separated), in configured order.
        #[arg(short, long, value_delimiter = ',')]
        only: Option<Vec<String>>,
    },
    /// Show what each item would do without touching the filesystem.
    Plan {
        /// Configuration file. Defaults to the per-user config file.
        #[arg(short, long, env = CONFIG_ENV)]
        config: Option<PathBuf>,
    },
    /// Load and validate the configuration file.
    Check {
        /// Configuration file. Defaults to the per-user config file.
        #[arg(short, long, env = CONFIG_ENV)]
        config: Option<PathBuf>,
    },
    /// Display the absolute path of the default configuration file.
    Config {
        /// Write a sample configuration file if none exists yet.
        #[arg(long)]
        init: bool,
    },
}

/// Runs the configured items and prints one line per item.
///
/// Exits with `EX_CONFIG` on a configuration error and with `EX_SOFTWARE` if
/// any item failed.
pub(crate) fn run(config: Option<PathBuf>, only: Option<Vec<String>>) -> Result<()> {
    let app = load(config);
    let items = match only {
        Some(names) => orchestrator::select(&app.items, &names).unwrap_or_else(|e| exit_config(&e)),
        None => app.items.clone(),
    };

    let mut failed = 0;
    app.orchestrator()
        .run_each(&items, &app.defaults(), |res| {
            if !res.is_success() {
                failed += 1;
            }
            println!("{res}");
        })
        .unwrap_or_else(|e| exit_config(&e));

    if failed > 0 {
        eprintln!("{failed} of {} items failed.", items.len());
        process::exit(sysexits::EX_SOFTWARE);
    }
    Ok(())
}

/// Prints each item's resolved plan.
pub(crate) fn plan(config: Option<PathBuf>) -> Result<()> {
    let app = load(config);
    let defaults = app.defaults();
    let now = SystemClock.now();
    for item in &app.items {
        let run_name = derive_run_name(&item.name, now, app.naming.clock);
        match resolve(item, &defaults, run_name) {
            Ok(plan) => println!("{}", describe(&plan)),
            Err(e) => println!("{}: {e}", item.name),
        }
    }
    Ok(())
}

/// Loads the configuration and reports how many items it holds.
pub(crate) fn check(config: Option<PathBuf>) -> Result<()> {
    let path = config_path(config);
    let app = load(Some(path.clone()));
    println!(
        "Configuration '{}' is valid: {} item(s).",
        path.display(),
        app.items.len()
    );
    Ok(())
}

/// Prints the default configuration file path, optionally creating it.
pub(crate) fn config(init: bool) -> Result<()> {
    let file = application::config_file();
    if init {
        if file.exists() {
            bail!("The configuration file '{}' already exists.", file.display());
        }
        application::write_config(&Application::sample(), &file)
            .with_context(|| format!("Failed to write '{}'", file.display()))
            .unwrap_or_else(|e| {
                eprintln!("{e:#}");
                process::exit(sysexits::EX_IOERR);
            });
        println!("Sample configuration written.");
    }
    println!("config file: {}", file.display());
    Ok(())
}

fn describe(plan: &ResolvedPlan) -> String {
    match plan.action() {
        Action::Archive => format!(
            "{}: archive '{}' -> '{}' (level {}, {})",
            plan.item_name,
            plan.source_path.display(),
            plan.archive_path().display(),
            plan.compression_level,
            if plan.is_password_protected() {
                "password protected"
            } else {
                "no password"
            }
        ),
        Action::Copy => format!(
            "{}: copy '{}' -> '{}'",
            plan.item_name,
            plan.source_path.display(),
            plan.run_dir().display()
        ),
    }
}

fn config_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(application::config_file)
}

/// Loads and validates the configuration, exiting with `EX_CONFIG` on failure.
fn load(config: Option<PathBuf>) -> Application {
    let path = config_path(config);
    let app = Application::load(&path).unwrap_or_else(|e| exit_config(&e));
    app.validate().unwrap_or_else(|e| exit_config(&e));
    app
}

fn exit_config(err: &dyn std::error::Error) -> ! {
    eprintln!("{err}");
    process::exit(sysexits::EX_CONFIG);
}
