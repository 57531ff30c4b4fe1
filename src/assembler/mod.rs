//! Artifact assembly
//!
//! Stages the archive and script of one package into a fresh directory, runs
//! the wrapping utility against it and locates the wrapped package. The
//! staging directory is removed whether the utility succeeds or not.

pub mod resolve;
pub mod staging;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, SystemTime};

use tracing::{debug, info};

pub use resolve::resolve_output;
pub use staging::StagedArtifactSet;

use crate::cancel::CancellationToken;
use crate::domain::FinalArtifact;
use crate::error::{Result, fs as fs_error, tool};

/// Files belonging to one logical package
#[derive(Debug, Clone)]
pub struct AssemblyInput<'a> {
    pub archive: &'a Path,
    pub script: &'a Path,
    pub package_name: &'a str,
    pub output_dir: &'a Path,
}

/// Runs the external wrapping utility on staged artifacts
#[derive(Debug, Clone)]
pub struct ArtifactAssembler {
    tool_path: PathBuf,
    work_dir: PathBuf,
    recent_window: Duration,
}

impl ArtifactAssembler {
    pub fn new(tool_path: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
            work_dir: work_dir.into(),
            recent_window: Duration::from_secs(5 * 60),
        }
    }

    /// How far before the invocation a modification still counts as new
    #[must_use]
    pub fn with_recent_window(mut self, window: Duration) -> Self {
        self.recent_window = window;
        self
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Stage, wrap and locate the final artifact
    ///
    /// # Errors
    ///
    /// - `ToolNotFound` if the utility is missing
    /// - `FileNotFound` / `StagingFailed` if staging fails
    /// - `ToolSpawnFailed` / `ToolFailed` if the utility cannot run or exits non-zero
    /// - `NoOutputArtifact` if it exits zero without leaving a wrapped file
    pub fn assemble(
        &self,
        input: &AssemblyInput<'_>,
        cancel: &CancellationToken,
    ) -> Result<FinalArtifact> {
        if !self.tool_path.is_file() {
            return Err(tool::not_found(self.tool_path.display().to_string()));
        }
        cancel.check()?;

        let staged =
            StagedArtifactSet::create(&self.work_dir, input.package_name, input.archive, input.script)?;
        let started = SystemTime::now();
        let result = self.invoke(&staged, input.output_dir);
        staged.close();
        result?;

        let artifact = resolve_output(
            input.output_dir,
            input.package_name,
            started,
            self.recent_window,
        )?;
        info!(
            "Wrapped package: {} ({:?})",
            artifact.path.display(),
            artifact.resolution
        );
        Ok(artifact)
    }

    /// Run the utility synchronously on a staged directory
    fn invoke(&self, staged: &StagedArtifactSet, output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir).map_err(|e| {
            fs_error::write_failed(output_dir.display().to_string(), e.to_string())
        })?;

        let script_name = staged.script_name();
        let mut command = Command::new(&self.tool_path);
        command
            .arg("-c")
            .arg(staged.path())
            .arg("-s")
            .arg(&script_name)
            .arg("-o")
            .arg(output_dir)
            .arg("-q")
            .stdin(Stdio::null());
        debug!("Running {:?}", command);

        let status = command.status().map_err(|e| crate::error::PackError::ToolSpawnFailed {
            path: self.tool_path.display().to_string(),
            reason: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            let code = status
                .code()
                .map_or_else(|| "no exit code (terminated by signal)".to_string(), |c| format!("exit code {c}"));
            Err(tool::failed(code))
        }
    }
}
