use clap::Parser;
use std::path::PathBuf;

use crate::config::PackConfig;

/// Arguments for the build command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Choose a deployment interactively:\n    intunepack build\n\n\
                  Package a named deployment:\n    intunepack build --select Revit_2023_23.1.7\n\n\
                  Unattended, with a custom tool location:\n    intunepack build --select Revit_2023_23.1.7 --tool C:\\Tools\\IntuneWinAppUtil.exe --yes")]
pub struct BuildArgs {
    /// Directory scanned for deployments
    #[arg(long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Deployment directory name to package (skips the menu)
    #[arg(long, value_name = "NAME")]
    pub select: Option<String>,

    /// Output directory for archives, reports and wrapped packages
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Path to IntuneWinAppUtil.exe
    #[arg(long, value_name = "PATH")]
    pub tool: Option<PathBuf>,

    /// Directory for per-run staging directories
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Answer yes to the large deployment confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl BuildArgs {
    /// Apply flags on top of the loaded configuration
    pub fn apply_to(&self, config: &mut PackConfig) {
        if let Some(root) = &self.source_root {
            config.source_root.clone_from(root);
        }
        if let Some(output) = &self.output {
            config.output_dir.clone_from(output);
        }
        if let Some(tool) = &self.tool {
            config.tool_path.clone_from(tool);
        }
        if let Some(work_dir) = &self.work_dir {
            config.work_dir.clone_from(work_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = BuildArgs::parse_from(["build", "--output", "dist", "--tool", "bin/tool.exe"]);
        let mut config = PackConfig::default();
        let work_dir = config.work_dir.clone();
        args.apply_to(&mut config);
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.tool_path, PathBuf::from("bin/tool.exe"));
        assert_eq!(config.work_dir, work_dir);
    }
}
