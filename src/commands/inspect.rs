//! Inspect command: extract a descriptor from one manifest

use std::path::Path;

use crate::cli::InspectArgs;
use crate::config;
use crate::error::{Result, fs as fs_error};
use crate::metadata::MetadataExtractor;
use crate::ui::display;

/// Run the inspect command
pub fn run(config_path: Option<&Path>, args: &InspectArgs) -> Result<()> {
    let config = config::load(config_path)?;
    if !args.manifest.is_file() {
        return Err(fs_error::not_found(args.manifest.display().to_string()));
    }

    let fallback = tree_name(&args.manifest, &config.manifest_path);
    let extraction = MetadataExtractor::new().extract_file(&args.manifest, fallback.as_deref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
    } else {
        display::display_extraction(&extraction);
    }
    Ok(())
}

/// Name of the deployment directory a manifest sits in
///
/// Walks up as many levels as `manifest_path` has components, so
/// `Revit_2023/image/Summary.txt` yields `Revit_2023`.
fn tree_name(manifest: &Path, manifest_path: &str) -> Option<String> {
    let depth = Path::new(manifest_path).components().count();
    let absolute = dunce::canonicalize(manifest).unwrap_or_else(|_| manifest.to_path_buf());
    absolute
        .ancestors()
        .nth(depth)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().to_string())
}
