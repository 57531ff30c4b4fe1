//! Locating the wrapped package after the utility ran
//!
//! The utility names its output after the entry script, which is not under
//! our control. Files whose name contains the package name, or that were
//! modified within the recency window before the invocation started, are
//! preferred; otherwise the most recently modified wrapped file wins. With
//! concurrent external activity in the output directory this is best effort.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::domain::{FinalArtifact, Resolution};
use crate::error::{PackError, Result};

/// Extension of wrapped packages
pub const WRAPPED_EXTENSION: &str = "intunewin";

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    modified: SystemTime,
    preferred: bool,
}

/// Pick the wrapped package in `dir` for `package_name`
///
/// # Errors
///
/// `NoOutputArtifact` when `dir` holds no wrapped file at all.
pub fn resolve_output(
    dir: &Path,
    package_name: &str,
    started: SystemTime,
    window: Duration,
) -> Result<FinalArtifact> {
    let no_output = || PackError::NoOutputArtifact {
        dir: dir.display().to_string(),
    };
    let threshold = started.checked_sub(window).unwrap_or(SystemTime::UNIX_EPOCH);
    let needle = package_name.to_lowercase();

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(|_| no_output())?.flatten() {
        let path = entry.path();
        let is_wrapped = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(WRAPPED_EXTENSION));
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !is_wrapped || !metadata.is_file() {
            continue;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let name_match = entry
            .file_name()
            .to_string_lossy()
            .to_lowercase()
            .contains(&needle);
        candidates.push(Candidate {
            path,
            modified,
            preferred: name_match || modified >= threshold,
        });
    }
    debug!("Found {} wrapped file(s) in {}", candidates.len(), dir.display());

    let newest = |preferred_only: bool| {
        candidates
            .iter()
            .filter(|c| !preferred_only || c.preferred)
            .max_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)))
    };

    if let Some(candidate) = newest(true) {
        return Ok(FinalArtifact {
            path: candidate.path.clone(),
            resolution: Resolution::Matched,
        });
    }
    newest(false)
        .map(|candidate| FinalArtifact {
            path: candidate.path.clone(),
            resolution: Resolution::MostRecent,
        })
        .ok_or_else(no_output)
}
