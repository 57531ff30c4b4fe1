//! Per-run staging directories
//!
//! A staging directory holds exactly one archive and one script. It is created
//! fresh under the work directory with a name carrying the package name and a
//! timestamp, and removed when the [`StagedArtifactSet`] is closed or dropped.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{Result, fs as fs_error, tool};

/// An isolated directory owned by one pipeline run
#[derive(Debug)]
pub struct StagedArtifactSet {
    dir: TempDir,
    pub archive: PathBuf,
    pub script: PathBuf,
}

impl StagedArtifactSet {
    /// Copy `archive` and `script` into a new staging directory under `work_dir`
    ///
    /// # Errors
    ///
    /// `FileNotFound` when a source file is missing, `StagingFailed` when the
    /// directory cannot be created or a copy did not land intact.
    pub fn create(
        work_dir: &Path,
        package_name: &str,
        archive: &Path,
        script: &Path,
    ) -> Result<Self> {
        for source in [archive, script] {
            if !source.is_file() {
                return Err(fs_error::not_found(source.display().to_string()));
            }
        }

        fs::create_dir_all(work_dir).map_err(|e| {
            tool::staging_failed(format!("cannot create {}: {e}", work_dir.display()))
        })?;
        let prefix = format!("{package_name}-{}-", Local::now().format("%Y%m%d-%H%M%S"));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(work_dir)
            .map_err(|e| {
                tool::staging_failed(format!(
                    "cannot create staging directory in {}: {e}",
                    work_dir.display()
                ))
            })?;
        debug!("Created staging directory {}", dir.path().display());

        let archive = copy_verified(archive, dir.path())?;
        let script = copy_verified(script, dir.path())?;

        Ok(Self {
            dir,
            archive,
            script,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// File name of the staged script, the tool's entry point
    pub fn script_name(&self) -> String {
        self.script
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Remove the directory, logging instead of failing
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed staging directory {}", path.display()),
            Err(e) => warn!("Failed to remove staging directory {}: {}", path.display(), e),
        }
    }
}

/// Copy `source` into `dir` and check the copy has the same size
fn copy_verified(source: &Path, dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| tool::staging_failed(format!("{} has no file name", source.display())))?;
    let dest = dir.join(name);
    let copied = fs::copy(source, &dest)
        .map_err(|e| tool::staging_failed(format!("cannot copy {}: {e}", source.display())))?;

    let expected = fs::metadata(source).map(|m| m.len()).ok();
    let landed = fs::metadata(&dest).map(|m| m.len()).ok();
    if landed.is_none() || landed != expected || Some(copied) != landed {
        return Err(tool::staging_failed(format!(
            "copy of {} did not land in {}",
            source.display(),
            dir.display()
        )));
    }
    Ok(dest)
}
