use clap::Parser;
use std::path::PathBuf;

/// Arguments for the discover command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List deployments under the configured root:\n    intunepack discover\n\n\
                  List deployments under another root:\n    intunepack discover --source-root D:\\Deployments")]
pub struct DiscoverArgs {
    /// Directory scanned for deployments
    #[arg(long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,
}
