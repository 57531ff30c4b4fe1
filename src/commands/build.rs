//! Build command: discover, select and package one deployment

use std::path::Path;

use tracing::info;

use crate::cancel;
use crate::cli::BuildArgs;
use crate::config::{self, PackConfig};
use crate::discovery::Discoverer;
use crate::domain::Stage;
use crate::error::Result;
use crate::pipeline::{Pipeline, RunContext};
use crate::ui::{AutoConfirm, Confirm, InquireConfirm, display};

use super::menu;

/// Run the build command
pub fn run(config_path: Option<&Path>, quiet: bool, args: &BuildArgs) -> Result<()> {
    let mut config = config::load(config_path)?;
    args.apply_to(&mut config);
    config.validate()?;

    let confirm: &dyn Confirm = if args.yes {
        &AutoConfirm
    } else {
        &InquireConfirm
    };
    let ctx = RunContext::new(confirm, quiet);
    cancel::install_interrupt_handler(&ctx.cancel);
    build_with(&config, &ctx, args.select.as_deref())
}

fn build_with(config: &PackConfig, ctx: &RunContext<'_>, select: Option<&str>) -> Result<()> {

    let tree = ctx.stage(Stage::Discover, || {
        let discovery = Discoverer::new(&config.patterns)?.discover(&config.source_root);
        info!(
            "Found {} candidate(s) under {}",
            discovery.candidates.len(),
            config.source_root.display()
        );
        menu::select_candidate(&discovery, &config.source_root, select)
    })?;

    let output = Pipeline::new(config, ctx).run(&tree)?;
    display::display_build_summary(&output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackError;
    use crate::ui::AutoDeny;
    use std::fs;

    #[test]
    fn test_build_reports_discover_stage_for_missing_root() {
        let temp = tempfile::TempDir::new_in(crate::temp::temp_dir_base()).unwrap();
        let config = PackConfig {
            source_root: temp.path().join("absent"),
            output_dir: temp.path().join("out"),
            ..PackConfig::default()
        };
        let ctx = RunContext::new(&AutoDeny, true);
        let err = build_with(&config, &ctx, None).unwrap_err();
        match err {
            PackError::StageFailed { stage, source, .. } => {
                assert_eq!(stage, Stage::Discover);
                assert!(matches!(*source, PackError::SourceRootInaccessible { .. }));
            }
            other => panic!("expected StageFailed, got {other:?}"),
        }
        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn test_build_stops_at_validation() {
        let temp = tempfile::TempDir::new_in(crate::temp::temp_dir_base()).unwrap();
        let root = temp.path().join("deployments");
        fs::create_dir_all(root.join("Revit_2023").join("image")).unwrap();
        let config = PackConfig {
            source_root: root,
            output_dir: temp.path().join("out"),
            ..PackConfig::default()
        };
        let ctx = RunContext::new(&AutoDeny, true);
        let err = build_with(&config, &ctx, Some("Revit_2023")).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            PackError::ValidationFailed { .. }
        ));
        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn test_interrupted_build_stops_before_discovery() {
        let temp = tempfile::TempDir::new_in(crate::temp::temp_dir_base()).unwrap();
        let root = temp.path().join("deployments");
        fs::create_dir_all(root.join("Revit_2023")).unwrap();
        let config = PackConfig {
            source_root: root,
            output_dir: temp.path().join("out"),
            ..PackConfig::default()
        };
        let ctx = RunContext::new(&AutoDeny, true);
        ctx.cancel.cancel();
        let err = build_with(&config, &ctx, Some("Revit_2023")).unwrap_err();
        assert!(matches!(err.root_cause(), PackError::Cancelled));
        assert!(!temp.path().join("out").exists());
    }
}
