//! Build and assembly outcome types

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Compression strategy tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Whole-tree compression in a single pass
    Standard,
    /// Per-file streaming with bounded memory
    Enhanced,
    /// Fixed-size batches combined into one archive
    Chunked,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Standard => "standard",
            StrategyKind::Enhanced => "enhanced",
            StrategyKind::Chunked => "chunked",
        };
        f.write_str(name)
    }
}

/// One strategy run, successful or not
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub strategy: StrategyKind,
    pub elapsed: Duration,
    /// Failure reason; `None` for the attempt that produced the archive
    pub error: Option<String>,
}

impl Attempt {
    pub fn summary(&self) -> String {
        match &self.error {
            Some(reason) => format!("{}: {}", self.strategy, reason),
            None => format!("{}: ok", self.strategy),
        }
    }
}

/// Result of a successful package build
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOutcome {
    /// Strategy that produced the archive
    pub strategy: StrategyKind,
    pub output: PathBuf,
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Total time across every attempt
    pub elapsed: Duration,
    /// Every attempt in order, the last one being the successful strategy
    pub attempts: Vec<Attempt>,
}

impl CompressionOutcome {
    /// Space saved as a percentage of the input size
    ///
    /// Returns `None` when the input is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio_percent(&self) -> Option<f64> {
        compression_ratio(self.input_bytes, self.output_bytes)
    }

    pub fn fell_back(&self) -> bool {
        self.attempts.len() > 1
    }
}

/// `1 - output/input` expressed as a percentage
#[allow(clippy::cast_precision_loss)]
pub fn compression_ratio(input_bytes: u64, output_bytes: u64) -> Option<f64> {
    if input_bytes == 0 {
        return None;
    }
    let saved = input_bytes as f64 - output_bytes as f64;
    Some(saved * 100.0 / input_bytes as f64)
}

/// How the wrapped output file was chosen among candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Name contains the package name or was modified during this invocation
    Matched,
    /// Most recently modified wrapped file in the directory
    MostRecent,
}

/// The wrapped package produced by the external utility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalArtifact {
    pub path: PathBuf,
    pub resolution: Resolution,
}
