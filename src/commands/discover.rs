//! Discover command: list deployments under the source root

use std::path::Path;

use crate::cli::DiscoverArgs;
use crate::config;
use crate::discovery::Discoverer;
use crate::error::{Result, structural};
use crate::ui::display;

/// Run the discover command
pub fn run(config_path: Option<&Path>, args: &DiscoverArgs) -> Result<()> {
    let config = config::load(config_path)?;
    let root = args.source_root.as_ref().unwrap_or(&config.source_root);

    let discovery = Discoverer::new(&config.patterns)?.discover(root);
    if let Some(error) = &discovery.error {
        return Err(structural::root_inaccessible(
            root.display().to_string(),
            error.to_string(),
        ));
    }

    if discovery.is_empty() {
        display::display_unmatched(root, &discovery.unmatched);
    } else {
        display::display_candidates(root, &discovery.candidates);
    }
    Ok(())
}
