//! Source tree domain types
//!
//! A source tree is one deployment directory staged by the vendor deployment
//! tool. Its identity is fixed at discovery; file count and size are computed
//! on demand by walking the tree.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use walkdir::WalkDir;

use crate::error::{PackError, Result};

/// A candidate deployment directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    /// Directory name (e.g. `Revit_2023_23.1.7`)
    pub name: String,
    /// Absolute path to the directory
    pub path: PathBuf,
    /// Creation time, or modification time where the platform has none
    pub created: DateTime<Local>,
}

/// A regular file inside a source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    pub absolute: PathBuf,
    /// Path relative to the tree root
    pub relative: PathBuf,
    pub size: u64,
}

/// Aggregate file count and byte size of a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub files: usize,
    pub bytes: u64,
}

impl TreeStats {
    pub fn from_files(files: &[TreeFile]) -> Self {
        Self {
            files: files.len(),
            bytes: files.iter().map(|f| f.size).sum(),
        }
    }

    pub fn formatted_size(&self) -> String {
        format_size(self.bytes)
    }
}

impl SourceTree {
    /// Open a directory as a source tree
    ///
    /// # Errors
    ///
    /// Returns `PackError::SourceTreeNotFound` if the path is not a directory.
    pub fn open(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|_| PackError::SourceTreeNotFound {
            path: path.display().to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(PackError::SourceTreeNotFound {
                path: path.display().to_string(),
            });
        }

        let absolute = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self::from_metadata(absolute, &metadata))
    }

    /// Build a source tree from an already-read directory entry
    pub fn from_metadata(path: PathBuf, metadata: &fs::Metadata) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());

        Self {
            name,
            path,
            created,
        }
    }

    /// List every regular file in the tree, sorted by path
    ///
    /// Symlinks are not followed.
    pub fn files(&self) -> Result<Vec<TreeFile>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.path)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let size = entry.metadata()?.len();
            let relative = entry
                .path()
                .strip_prefix(&self.path)
                .unwrap_or(entry.path())
                .to_path_buf();
            files.push(TreeFile {
                absolute: entry.path().to_path_buf(),
                relative,
                size,
            });
        }
        Ok(files)
    }

    /// Compute the aggregate file count and byte size
    pub fn stats(&self) -> Result<TreeStats> {
        Ok(TreeStats::from_files(&self.files()?))
    }

    /// Resolve a path relative to the tree root
    pub fn join(&self, relative: &str) -> PathBuf {
        relative
            .split(['/', '\\'])
            .filter(|part| !part.is_empty())
            .fold(self.path.clone(), |acc, part| acc.join(part))
    }
}

/// Format a byte count as a human-readable string
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    let size = bytes as f64;
    if size < 1024.0 {
        format!("{bytes} B")
    } else if size < 1024.0 * 1024.0 {
        format!("{:.1} KB", size / 1024.0)
    } else if size < 1024.0 * 1024.0 * 1024.0 {
        format!("{:.1} MB", size / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", size / (1024.0 * 1024.0 * 1024.0))
    }
}
