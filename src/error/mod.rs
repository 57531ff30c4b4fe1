//! Error types and handling for intunepack
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`structural`]: Source tree discovery and validation errors
//! - [`compression`]: Archive strategy errors
//! - [`tool`]: Wrapping utility and staging errors
//! - [`fs`]: File system errors
//! - [`config`]: Configuration errors
//!
//! Metadata extraction never fails; unresolved fields are reported as
//! [`crate::metadata::ExtractionWarning`] values instead.

use std::path::PathBuf;

pub mod compression;
pub mod config;
pub mod fs;
pub mod structural;
pub mod tool;


use miette::Diagnostic;
use thiserror::Error;

use crate::domain::Stage;

/// Main error type for intunepack operations
#[derive(Error, Diagnostic, Debug)]
pub enum PackError {
    // Structural errors
    #[error("Source root is not accessible: {path}: {reason}")]
    #[diagnostic(
        code(intunepack::structural::root_inaccessible),
        help("Pass --source-root or set `source_root` in the configuration file")
    )]
    SourceRootInaccessible { path: String, reason: String },

    #[error("No deployment directories matched under {root}")]
    #[diagnostic(
        code(intunepack::structural::no_candidates),
        help("Run 'intunepack discover' to list the directories that were found, or adjust `patterns`")
    )]
    NoCandidates { root: String },

    #[error("Deployment '{name}' not found among discovered candidates")]
    #[diagnostic(
        code(intunepack::structural::candidate_not_found),
        help("Run 'intunepack discover' to see the available deployment names")
    )]
    CandidateNotFound { name: String },

    #[error("Source tree not found: {path}")]
    #[diagnostic(code(intunepack::structural::tree_not_found))]
    SourceTreeNotFound { path: String },

    #[error("Source tree is missing critical files: {}", missing.join(", "))]
    #[diagnostic(
        code(intunepack::structural::validation_failed),
        help("Re-create the deployment with the vendor deployment tool; the image folder is incomplete")
    )]
    ValidationFailed { path: String, missing: Vec<String> },

    #[error("Several deployments match: {candidates}")]
    #[diagnostic(
        code(intunepack::structural::selection_required),
        help("Pass --select NAME to choose one without an interactive terminal")
    )]
    SelectionRequired { candidates: String },

    #[error("No deployment selected")]
    #[diagnostic(code(intunepack::structural::selection_cancelled))]
    SelectionCancelled,

    // Compression errors
    #[error("{strategy} compression failed: {reason}")]
    #[diagnostic(code(intunepack::compression::strategy_failed))]
    StrategyFailed { strategy: String, reason: String },

    #[error("Archive was not produced or is empty: {path}")]
    #[diagnostic(code(intunepack::compression::empty_archive))]
    EmptyArchive { path: String },

    #[error("All compression strategies failed: {attempts}")]
    #[diagnostic(
        code(intunepack::compression::exhausted),
        help("Check free disk space at the output location and that no file in the tree is locked")
    )]
    CompressionFailed { attempts: String },

    #[error("Build aborted: source tree is {size} and continuation was declined")]
    #[diagnostic(
        code(intunepack::compression::aborted),
        help("Re-run with --yes to package very large deployments without confirmation")
    )]
    BuildAborted { size: String },

    // Wrapping tool errors
    #[error("Wrapping utility not found: {path}")]
    #[diagnostic(
        code(intunepack::tool::not_found),
        help("Download IntuneWinAppUtil.exe and pass its location with --tool or `tool_path`")
    )]
    ToolNotFound { path: String },

    #[error("Failed to launch wrapping utility {path}: {reason}")]
    #[diagnostic(code(intunepack::tool::spawn_failed))]
    ToolSpawnFailed { path: String, reason: String },

    #[error("Wrapping utility exited with {code}")]
    #[diagnostic(code(intunepack::tool::failed))]
    ToolFailed { code: String },

    #[error("Wrapping utility succeeded but no wrapped package was found in {dir}")]
    #[diagnostic(code(intunepack::tool::no_output))]
    NoOutputArtifact { dir: String },

    #[error("Staging failed: {message}")]
    #[diagnostic(code(intunepack::tool::staging_failed))]
    StagingFailed { message: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(intunepack::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(intunepack::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(intunepack::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(intunepack::fs::io_error))]
    IoError { message: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(intunepack::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(intunepack::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(intunepack::config::invalid))]
    ConfigInvalid { message: String },

    // Pipeline errors
    #[error("Operation cancelled")]
    #[diagnostic(code(intunepack::pipeline::cancelled))]
    Cancelled,

    #[error("{stage} stage failed: {source}")]
    #[diagnostic(code(intunepack::pipeline::stage_failed))]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<PackError>,
        /// Artifacts produced by earlier stages that remain valid
        partial: Vec<PathBuf>,
    },
}

impl PackError {
    /// Wrap this error with the pipeline stage it came from
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            already @ PackError::StageFailed { .. } => already,
            other => PackError::StageFailed {
                stage,
                source: Box::new(other),
                partial: Vec::new(),
            },
        }
    }

    /// Attach the artifacts that survived a stage failure
    pub fn with_partial(self, artifacts: Vec<PathBuf>) -> Self {
        match self {
            PackError::StageFailed { stage, source, .. } => PackError::StageFailed {
                stage,
                source,
                partial: artifacts,
            },
            other => other,
        }
    }

    /// Artifacts that remain valid despite this failure
    pub fn partial_artifacts(&self) -> &[PathBuf] {
        match self {
            PackError::StageFailed { partial, .. } => partial,
            _ => &[],
        }
    }

    /// The innermost error, skipping stage wrappers
    pub fn root_cause(&self) -> &PackError {
        match self {
            PackError::StageFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the failure came from a strategy that may be retried with another
    pub fn is_retryable_compression(&self) -> bool {
        matches!(
            self.root_cause(),
            PackError::StrategyFailed { .. }
                | PackError::EmptyArchive { .. }
                | PackError::IoError { .. }
                | PackError::FileReadFailed { .. }
                | PackError::FileWriteFailed { .. }
        )
    }
}

impl From<std::io::Error> for PackError {
    fn from(err: std::io::Error) -> Self {
        PackError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<walkdir::Error> for PackError {
    fn from(err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        PackError::FileReadFailed {
            path,
            reason: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for PackError {
    fn from(err: serde_yaml::Error) -> Self {
        PackError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PackError {
    fn from(err: serde_json::Error) -> Self {
        PackError::IoError {
            message: format!("JSON serialization failed: {err}"),
        }
    }
}

impl From<inquire::InquireError> for PackError {
    fn from(err: inquire::InquireError) -> Self {
        PackError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, PackError>;
