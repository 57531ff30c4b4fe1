//! intunepack - package staged vendor deployments for device management
//!
//! Discovers deployments staged by a vendor deployment tool, validates them,
//! extracts their identity from the deployment manifest, compresses them,
//! generates an install/uninstall script and detection report, and wraps the
//! result with the external packaging utility.

use clap::Parser;
use miette::Diagnostic;

mod assembler;
mod builder;
mod cancel;
mod cli;
mod commands;
mod config;
mod discovery;
mod domain;
mod error;
mod hash;
mod logging;
mod metadata;
mod pipeline;
mod report;
mod script;
mod temp;
mod ui;
mod validation;

use cli::{Cli, Commands};
use error::PackError;

/// Exit code for a failed run
const EXIT_FAILURE: i32 = 1;

/// Exit code when wrapping failed but earlier artifacts were produced
const EXIT_PARTIAL: i32 = 2;

fn report_error(e: &PackError) -> i32 {
    eprintln!("Error: {e}");
    if let Some(help) = e.root_cause().help() {
        eprintln!("  help: {help}");
    }

    let partial = e.partial_artifacts();
    if partial.is_empty() {
        EXIT_FAILURE
    } else {
        ui::display::display_partial_artifacts(partial);
        EXIT_PARTIAL
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Build(args) => commands::build::run(config, cli.quiet, args),
        Commands::Discover(args) => commands::discover::run(config, args),
        Commands::Validate(args) => commands::validate::run(config, args),
        Commands::Inspect(args) => commands::inspect::run(config, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        std::process::exit(report_error(&e));
    }
}
