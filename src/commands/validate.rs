//! Validate command: check one deployment for required files

use std::path::Path;

use crate::cli::ValidateArgs;
use crate::config;
use crate::domain::SourceTree;
use crate::error::Result;
use crate::ui::display;
use crate::validation::Validator;

/// Run the validate command
pub fn run(config_path: Option<&Path>, args: &ValidateArgs) -> Result<()> {
    let config = config::load(config_path)?;
    let tree = SourceTree::open(&args.path)?;

    let result = Validator::new(config.requirements()).validate(&tree);
    display::display_validation(&tree, &result);
    result.into_result(&tree).map(|_| ())
}
