//! Candidate selection for the build command

use std::path::Path;

use inquire::{InquireError, Select};
use tracing::{debug, info};

use crate::discovery::Discovery;
use crate::domain::SourceTree;
use crate::error::{PackError, Result, structural};

/// Pick the source tree to package
///
/// An explicit name must match a candidate exactly. A single candidate is
/// chosen without asking. Otherwise an interactive menu is shown; without a
/// terminal the caller must name the candidate.
pub fn select_candidate(
    discovery: &Discovery,
    root: &Path,
    requested: Option<&str>,
) -> Result<SourceTree> {
    if let Some(error) = &discovery.error {
        return Err(structural::root_inaccessible(
            root.display().to_string(),
            error.to_string(),
        ));
    }
    if discovery.is_empty() {
        return Err(structural::no_candidates(root.display().to_string()));
    }

    if let Some(name) = requested {
        return discovery
            .find(name)
            .cloned()
            .ok_or_else(|| structural::candidate_not_found(name));
    }

    if let [only] = discovery.candidates.as_slice() {
        info!("Selected the only candidate: {}", only.name);
        return Ok(only.clone());
    }

    select_interactively(&discovery.candidates)
}

fn menu_label(tree: &SourceTree) -> String {
    format!("{}  ({})", tree.name, tree.created.format("%Y-%m-%d %H:%M"))
}

fn select_interactively(candidates: &[SourceTree]) -> Result<SourceTree> {
    let items: Vec<String> = candidates.iter().map(menu_label).collect();

    let answer = Select::new("Select deployment to package", items.clone())
        .with_starting_cursor(0)
        .with_page_size(10)
        .without_filtering()
        .with_help_message("↑↓ to move, ENTER to select, ESC to cancel")
        .prompt_skippable();

    let selection = match answer {
        Ok(Some(selection)) => selection,
        Ok(None) => return Err(PackError::SelectionCancelled),
        Err(InquireError::NotTTY) => {
            let names: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();
            return Err(structural::selection_required(&names));
        }
        Err(e) => return Err(e.into()),
    };

    debug!("Menu selection: {selection}");
    items
        .iter()
        .position(|item| *item == selection)
        .and_then(|index| candidates.get(index))
        .cloned()
        .ok_or(PackError::SelectionCancelled)
}
