//! Deployment discovery
//!
//! Scans a root directory for deployment folders whose names match any of the
//! configured glob patterns. Matching is case-insensitive and uses wax for
//! platform-independent globbing.
//!
//! An inaccessible root is not fatal here: the result is empty and carries the
//! underlying error, so callers decide how to surface it.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use wax::{CandidatePath, Glob, Pattern};

use crate::domain::SourceTree;
use crate::error::{PackError, Result};

/// Outcome of scanning a root directory
#[derive(Debug, Default)]
pub struct Discovery {
    /// Matching directories, unique and sorted by name
    pub candidates: Vec<SourceTree>,
    /// Directory names that matched no pattern, sorted, for diagnosis
    pub unmatched: Vec<String>,
    /// Why the root could not be read, if it could not
    pub error: Option<io::Error>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Find a candidate by exact directory name
    pub fn find(&self, name: &str) -> Option<&SourceTree> {
        self.candidates.iter().find(|c| c.name == name)
    }
}

/// Matches directory names against an ordered list of glob patterns
pub struct Discoverer {
    patterns: Vec<Glob<'static>>,
}

impl Discoverer {
    /// Compile the patterns
    ///
    /// # Errors
    ///
    /// Returns `PackError::ConfigInvalid` naming the first pattern wax rejects.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Glob::new(&pattern.to_lowercase())
                    .map(Glob::into_owned)
                    .map_err(|e| PackError::ConfigInvalid {
                        message: format!("Invalid discovery pattern '{pattern}': {e}"),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether a directory name matches at least one pattern
    pub fn matches(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.patterns
            .iter()
            .any(|glob| glob.is_match(CandidatePath::from(lowered.as_str())))
    }

    /// Scan `root` for matching directories
    pub fn discover(&self, root: &Path) -> Discovery {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read source root {}: {}", root.display(), e);
                return Discovery {
                    error: Some(e),
                    ..Discovery::default()
                };
            }
        };

        let mut matched: BTreeMap<String, SourceTree> = BTreeMap::new();
        let mut unmatched = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", root.display(), e);
                    continue;
                }
            };
            let metadata = match fs::metadata(entry.path()) {
                Ok(metadata) if metadata.is_dir() => metadata,
                _ => continue,
            };

            let name = entry.file_name().to_string_lossy().to_string();
            if self.matches(&name) {
                let path = dunce::canonicalize(entry.path()).unwrap_or_else(|_| entry.path());
                matched
                    .entry(name)
                    .or_insert_with(|| SourceTree::from_metadata(path, &metadata));
            } else {
                unmatched.push(name);
            }
        }

        unmatched.sort();
        debug!(
            "Discovered {} candidate(s) and {} unmatched director(ies) under {}",
            matched.len(),
            unmatched.len(),
            root.display()
        );

        Discovery {
            candidates: matched.into_values().collect(),
            unmatched,
            error: None,
        }
    }
}
