use clap::Parser;
use std::path::PathBuf;

/// Arguments for the inspect command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show the extracted descriptor:\n    intunepack inspect Revit_2023\\image\\Summary.txt\n\n\
                  Emit JSON for scripting:\n    intunepack inspect Revit_2023\\image\\Summary.txt --json")]
pub struct InspectArgs {
    /// Manifest file to parse
    pub manifest: PathBuf,

    /// Print the descriptor and warnings as JSON
    #[arg(long)]
    pub json: bool,
}
