use clap::Parser;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Validate a deployment directory:\n    intunepack validate C:\\Autodesk\\Deployments\\Revit_2023")]
pub struct ValidateArgs {
    /// Deployment directory to check
    pub path: PathBuf,
}
