//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - build: Build command arguments
//! - discover: Discover command arguments
//! - validate: Validate command arguments
//! - inspect: Inspect command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod build;
pub mod completions;
pub mod discover;
pub mod inspect;
pub mod validate;

pub use build::BuildArgs;
pub use completions::CompletionsArgs;
pub use discover::DiscoverArgs;
pub use inspect::InspectArgs;
pub use validate::ValidateArgs;

/// intunepack - wrap staged vendor deployments for device management
#[derive(Parser, Debug)]
#[command(
    name = "intunepack",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Turn staged vendor deployments into wrapped device-management packages",
    long_about = "intunepack discovers deployments staged by a vendor deployment tool, validates them, \
                  extracts their identity from the deployment manifest, compresses them, generates an \
                  install/uninstall script and a detection report, and wraps the result with \
                  IntuneWinAppUtil.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  intunepack discover                          \x1b[90m# List deployments under the source root\x1b[0m\n   \
                  intunepack build                             \x1b[90m# Package a deployment, choosing interactively\x1b[0m\n   \
                  intunepack build --select Revit_2023 --yes   \x1b[90m# Package a named deployment unattended\x1b[0m\n   \
                  intunepack validate ./Revit_2023             \x1b[90m# Check a deployment for required files\x1b[0m\n   \
                  intunepack inspect image/Summary.txt --json  \x1b[90m# Show extracted metadata as JSON\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Configuration file (defaults to the global config.yaml when present)
    #[arg(long, short = 'c', global = true, env = "INTUNEPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Only print errors; no progress bars
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Package one deployment end to end
    Build(BuildArgs),

    /// List deployments found under the source root
    Discover(DiscoverArgs),

    /// Check a deployment for required files
    Validate(ValidateArgs),

    /// Extract package metadata from a deployment manifest
    Inspect(InspectArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
