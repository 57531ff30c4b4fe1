//! Size-adaptive package builder
//!
//! The builder measures the tree, picks an initial strategy by size and runs a
//! small state machine:
//!
//! ```text
//! Standard --fail--> Failed
//! Enhanced --retryable fail--> Chunked --fail--> Failed
//! ```
//!
//! Trees above the extreme threshold need an explicit confirmation before the
//! enhanced strategy runs; declining aborts with nothing written. After every
//! strategy the destination must exist and be non-empty. On final failure the
//! destination is removed.

pub mod chunked;
pub mod strategy;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

pub use chunked::ChunkedStrategy;
pub use strategy::{ArchiveJob, ArchiveStrategy, EnhancedStrategy, StandardStrategy};

use crate::cancel::CancellationToken;
use crate::config::SizeThresholds;
use crate::domain::{
    Attempt, CompressionOutcome, SourceTree, StrategyKind, TreeStats, format_size,
};
use crate::error::{PackError, Result, compression, fs as fs_error};
use crate::ui::{Confirm, ProgressReporter};

/// Size class of a tree relative to the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    /// Below the enhanced threshold
    Small,
    /// Between the enhanced and extreme thresholds, inclusive
    Large,
    /// Above the extreme threshold
    Extreme,
}

impl SizeClass {
    pub fn of(bytes: u64, thresholds: &SizeThresholds) -> Self {
        if bytes < thresholds.enhanced_bytes {
            SizeClass::Small
        } else if bytes <= thresholds.extreme_bytes {
            SizeClass::Large
        } else {
            SizeClass::Extreme
        }
    }
}

/// Builder state; terminal once `Failed` or after a successful strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Standard,
    Enhanced,
    Chunked,
    Failed,
}

impl BuildState {
    /// First strategy for a size class
    pub fn initial(class: SizeClass) -> Self {
        match class {
            SizeClass::Small => BuildState::Standard,
            SizeClass::Large | SizeClass::Extreme => BuildState::Enhanced,
        }
    }

    /// State after the current strategy failed with `error`
    pub fn on_failure(self, error: &PackError) -> Self {
        match self {
            BuildState::Enhanced if error.is_retryable_compression() => BuildState::Chunked,
            _ => BuildState::Failed,
        }
    }

    fn strategy_kind(self) -> Option<StrategyKind> {
        match self {
            BuildState::Standard => Some(StrategyKind::Standard),
            BuildState::Enhanced => Some(StrategyKind::Enhanced),
            BuildState::Chunked => Some(StrategyKind::Chunked),
            BuildState::Failed => None,
        }
    }
}

/// Question shown before packaging a tree above the extreme threshold
pub fn extreme_size_question(stats: &TreeStats) -> String {
    format!(
        "The deployment is {} ({} files). Archives this large may hit archive tool limits, \
         exceed the upload limit of the management service, take a long time to download \
         on clients, and need the same free space again on disk. Continue?",
        stats.formatted_size(),
        stats.files
    )
}

/// Absolute form of `dest` with its existing ancestors canonicalized
///
/// Relative destinations resolve against the current directory, so a run
/// started from inside the tree is still detected.
pub fn resolve_destination(dest: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(dest)
        .map_err(|e| fs_error::io_error(format!("{}: {e}", dest.display())))?;

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }

    let mut resolved = dunce::canonicalize(existing).unwrap_or_else(|_| existing.to_path_buf());
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

/// Compresses validated trees into one archive
pub struct PackageBuilder<'a> {
    thresholds: SizeThresholds,
    standard: Box<dyn ArchiveStrategy + 'a>,
    enhanced: Box<dyn ArchiveStrategy + 'a>,
    chunked: Box<dyn ArchiveStrategy + 'a>,
    cancel: &'a CancellationToken,
    confirm: &'a dyn Confirm,
    progress: &'a dyn ProgressReporter,
}

impl<'a> PackageBuilder<'a> {
    pub fn new(
        thresholds: SizeThresholds,
        chunk_files: usize,
        cancel: &'a CancellationToken,
        confirm: &'a dyn Confirm,
        progress: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            thresholds,
            standard: Box::new(StandardStrategy),
            enhanced: Box::new(EnhancedStrategy),
            chunked: Box::new(ChunkedStrategy::new(chunk_files)),
            cancel,
            confirm,
            progress,
        }
    }

    /// Replace the enhanced strategy
    #[must_use]
    pub fn with_enhanced(mut self, strategy: impl ArchiveStrategy + 'a) -> Self {
        self.enhanced = Box::new(strategy);
        self
    }

    /// Replace the standard strategy
    #[must_use]
    pub fn with_standard(mut self, strategy: impl ArchiveStrategy + 'a) -> Self {
        self.standard = Box::new(strategy);
        self
    }

    fn strategy(&self, kind: StrategyKind) -> &dyn ArchiveStrategy {
        match kind {
            StrategyKind::Standard => self.standard.as_ref(),
            StrategyKind::Enhanced => self.enhanced.as_ref(),
            StrategyKind::Chunked => self.chunked.as_ref(),
        }
    }

    /// Compress `tree` into `dest`
    ///
    /// # Errors
    ///
    /// - `BuildAborted` when an extreme-size confirmation is declined
    /// - `Cancelled` when the token fires
    /// - `CompressionFailed` listing every attempt once no strategy is left
    pub fn build(&self, tree: &SourceTree, dest: &Path) -> Result<CompressionOutcome> {
        if resolve_destination(dest)?.starts_with(&tree.path) {
            return Err(PackError::ConfigInvalid {
                message: format!(
                    "Archive destination {} lies inside the source tree {}",
                    dest.display(),
                    tree.path.display()
                ),
            });
        }

        let files = tree.files()?;
        let stats = TreeStats::from_files(&files);
        let class = SizeClass::of(stats.bytes, &self.thresholds);
        info!(
            "Packaging {} ({} files, {}) as {:?}",
            tree.name,
            stats.files,
            stats.formatted_size(),
            class
        );

        if class == SizeClass::Extreme {
            warn!(
                "{} exceeds the extreme size threshold of {}",
                tree.name,
                format_size(self.thresholds.extreme_bytes)
            );
            if !self.confirm.confirm(&extreme_size_question(&stats)) {
                return Err(PackError::BuildAborted {
                    size: stats.formatted_size(),
                });
            }
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                fs_error::write_failed(parent.display().to_string(), e.to_string())
            })?;
        }

        let started = Instant::now();
        let mut attempts = Vec::new();
        let mut state = BuildState::initial(class);
        let mut last_error = None;

        while let Some(kind) = state.strategy_kind() {
            let attempt_started = Instant::now();
            let result = self.run_strategy(kind, tree, &files, dest);
            let elapsed = attempt_started.elapsed();

            match result {
                Ok(output_bytes) => {
                    attempts.push(Attempt {
                        strategy: kind,
                        elapsed,
                        error: None,
                    });
                    let outcome = CompressionOutcome {
                        strategy: kind,
                        output: dest.to_path_buf(),
                        input_bytes: stats.bytes,
                        output_bytes,
                        elapsed: started.elapsed(),
                        attempts,
                    };
                    log_outcome(&outcome);
                    return Ok(outcome);
                }
                Err(e) => {
                    warn!("{kind} strategy failed after {elapsed:.2?}: {e}");
                    attempts.push(Attempt {
                        strategy: kind,
                        elapsed,
                        error: Some(e.to_string()),
                    });
                    state = state.on_failure(&e);
                    if state == BuildState::Chunked {
                        info!("Falling back to chunked compression");
                    }
                    last_error = Some(e);
                }
            }
        }

        remove_partial(dest);
        info!(
            "Compression gave up after {:.2?} and {} attempt(s)",
            started.elapsed(),
            attempts.len()
        );
        match last_error {
            Some(PackError::Cancelled) => Err(PackError::Cancelled),
            _ => {
                let summaries: Vec<String> = attempts.iter().map(Attempt::summary).collect();
                Err(compression::exhausted(&summaries))
            }
        }
    }

    /// Run one strategy and validate its output, returning the archive size
    fn run_strategy(
        &self,
        kind: StrategyKind,
        tree: &SourceTree,
        files: &[crate::domain::TreeFile],
        dest: &Path,
    ) -> Result<u64> {
        self.cancel.check()?;
        remove_partial(dest);

        let job = ArchiveJob {
            root: &tree.path,
            files,
            dest,
            cancel: self.cancel,
            progress: self.progress,
        };
        self.strategy(kind).write(&job)?;
        validate_output(dest)
    }
}

/// The destination must exist and hold at least one byte
fn validate_output(dest: &Path) -> Result<u64> {
    match fs::metadata(dest) {
        Ok(metadata) if metadata.is_file() && metadata.len() > 0 => Ok(metadata.len()),
        _ => Err(compression::empty_archive(dest.display().to_string())),
    }
}

fn remove_partial(dest: &Path) {
    if dest.exists() {
        if let Err(e) = fs::remove_file(dest) {
            warn!("Failed to remove partial archive {}: {}", dest.display(), e);
        }
    }
}

fn log_outcome(outcome: &CompressionOutcome) {
    let ratio = outcome
        .ratio_percent()
        .map_or_else(|| "n/a".to_string(), |r| format!("{r:.1}%"));
    info!(
        "{} strategy wrote {} ({} -> {}, ratio {}) in {:.2?}",
        outcome.strategy,
        outcome.output.display(),
        format_size(outcome.input_bytes),
        format_size(outcome.output_bytes),
        ratio,
        outcome.elapsed
    );
    if outcome.fell_back() {
        let summaries: Vec<String> = outcome.attempts.iter().map(Attempt::summary).collect();
        info!("Attempts: {}", summaries.join("; "));
    }
}


#[cfg(test)]
mod tests {
    use super::strategy::test_utils::{EmptyStrategy, FailingStrategy};
    use super::test_support::{fixture_tree, unpack, unpack_container};
    use super::*;
    use crate::ui::{AutoConfirm, AutoDeny, SilentProgressReporter};

    fn thresholds(enhanced_bytes: u64, extreme_bytes: u64) -> SizeThresholds {
        SizeThresholds {
            enhanced_bytes,
            extreme_bytes,
        }
    }

    fn sample_tree() -> (tempfile::TempDir, SourceTree) {
        fixture_tree(&[
            ("image/Installer.exe", b"MZ installer payload".as_slice()),
            ("image/Collection.xml", b"<collection/>".as_slice()),
            ("image/Summary.txt", b"Revit 2023".as_slice()),
        ])
    }

    #[test]
    fn test_size_class_boundaries() {
        let t = thresholds(10, 20);
        assert_eq!(SizeClass::of(9, &t), SizeClass::Small);
        assert_eq!(SizeClass::of(10, &t), SizeClass::Large);
        assert_eq!(SizeClass::of(20, &t), SizeClass::Large);
        assert_eq!(SizeClass::of(21, &t), SizeClass::Extreme);
    }

    #[test]
    fn test_default_thresholds_select_by_gib() {
        let t = SizeThresholds::default();
        let gib = 1024 * 1024 * 1024;
        assert_eq!(BuildState::initial(SizeClass::of(3 * gib, &t)), BuildState::Standard);
        assert_eq!(BuildState::initial(SizeClass::of(5 * gib, &t)), BuildState::Enhanced);
    }

    #[test]
    fn test_transitions() {
        let retryable = compression::strategy_failed("enhanced", "disk full");
        assert_eq!(BuildState::Enhanced.on_failure(&retryable), BuildState::Chunked);
        assert_eq!(BuildState::Standard.on_failure(&retryable), BuildState::Failed);
        assert_eq!(BuildState::Chunked.on_failure(&retryable), BuildState::Failed);
        assert_eq!(
            BuildState::Enhanced.on_failure(&PackError::Cancelled),
            BuildState::Failed
        );
    }

    #[test]
    fn test_small_tree_uses_standard() {
        let (temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        let builder = PackageBuilder::new(
            thresholds(1024, 2048),
            1000,
            &cancel,
            &AutoDeny,
            &SilentProgressReporter,
        );
        let dest = temp.path().join("out/Revit.tar.gz");
        let outcome = builder.build(&tree, &dest).unwrap();

        assert_eq!(outcome.strategy, StrategyKind::Standard);
        assert!(!outcome.fell_back());
        assert_eq!(outcome.output_bytes, fs::metadata(&dest).unwrap().len());
        assert!(outcome.ratio_percent().is_some());
        let files = unpack(&dest);
        assert_eq!(files["image/Installer.exe"], b"MZ installer payload");
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_large_tree_uses_enhanced() {
        let (temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        let builder = PackageBuilder::new(
            thresholds(10, 1024),
            1000,
            &cancel,
            &AutoDeny,
            &SilentProgressReporter,
        );
        let dest = temp.path().join("Revit.tar.gz");
        let outcome = builder.build(&tree, &dest).unwrap();
        assert_eq!(outcome.strategy, StrategyKind::Enhanced);
        assert_eq!(unpack(&dest).len(), 3);
    }

    #[test]
    fn test_enhanced_failure_falls_back_to_chunked() {
        let (temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        let builder = PackageBuilder::new(
            thresholds(10, 1024),
            2,
            &cancel,
            &AutoDeny,
            &SilentProgressReporter,
        )
        .with_enhanced(FailingStrategy::new(StrategyKind::Enhanced));
        let dest = temp.path().join("Revit.tar.gz");
        let outcome = builder.build(&tree, &dest).unwrap();

        assert_eq!(outcome.strategy, StrategyKind::Chunked);
        assert!(outcome.fell_back());
        assert_eq!(outcome.attempts[0].strategy, StrategyKind::Enhanced);
        assert!(outcome.attempts[0].error.is_some());
        assert!(outcome.output_bytes > 0);

        let parts = unpack_container(&dest);
        assert_eq!(parts.len(), 2);
        let total: usize = parts.values().map(|p| p.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_standard_failure_is_terminal_and_cleans_up() {
        let (temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        let builder = PackageBuilder::new(
            thresholds(1024, 2048),
            1000,
            &cancel,
            &AutoDeny,
            &SilentProgressReporter,
        )
        .with_standard(FailingStrategy::new(StrategyKind::Standard));
        let dest = temp.path().join("Revit.tar.gz");

        match builder.build(&tree, &dest) {
            Err(PackError::CompressionFailed { attempts }) => {
                assert!(attempts.contains("standard: "));
                assert!(attempts.contains("injected failure"));
            }
            other => panic!("expected CompressionFailed, got {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn test_empty_output_is_rejected() {
        let (temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        let builder = PackageBuilder::new(
            thresholds(1024, 2048),
            1000,
            &cancel,
            &AutoDeny,
            &SilentProgressReporter,
        )
        .with_standard(EmptyStrategy(StrategyKind::Standard));
        let dest = temp.path().join("Revit.tar.gz");

        let err = builder.build(&tree, &dest).unwrap_err();
        assert!(matches!(err, PackError::CompressionFailed { .. }));
        assert!(err.to_string().contains("empty"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_extreme_tree_declined_leaves_no_output() {
        let (temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        let builder =
            PackageBuilder::new(thresholds(1, 2), 1000, &cancel, &AutoDeny, &SilentProgressReporter);
        let dest = temp.path().join("out/Revit.tar.gz");

        assert!(matches!(
            builder.build(&tree, &dest),
            Err(PackError::BuildAborted { .. })
        ));
        assert!(!dest.exists());
        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn test_extreme_tree_confirmed_proceeds_with_enhanced() {
        let (temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        let builder = PackageBuilder::new(
            thresholds(1, 2),
            1000,
            &cancel,
            &AutoConfirm,
            &SilentProgressReporter,
        );
        let dest = temp.path().join("Revit.tar.gz");
        let outcome = builder.build(&tree, &dest).unwrap();
        assert_eq!(outcome.strategy, StrategyKind::Enhanced);
    }

    #[test]
    fn test_cancelled_build_reports_cancelled() {
        let (temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let builder = PackageBuilder::new(
            thresholds(10, 1024),
            1000,
            &cancel,
            &AutoDeny,
            &SilentProgressReporter,
        );
        let dest = temp.path().join("Revit.tar.gz");
        assert!(matches!(builder.build(&tree, &dest), Err(PackError::Cancelled)));
        assert!(!dest.exists());
    }

    #[test]
    fn test_destination_inside_tree_is_rejected() {
        let (_temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        let builder = PackageBuilder::new(
            SizeThresholds::default(),
            1000,
            &cancel,
            &AutoDeny,
            &SilentProgressReporter,
        );
        let dest = tree.path.join("self.tar.gz");
        assert!(matches!(
            builder.build(&tree, &dest),
            Err(PackError::ConfigInvalid { .. })
        ));
    }

    struct CurrentDirGuard(PathBuf);

    impl Drop for CurrentDirGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_relative_destination_from_inside_tree_is_rejected() {
        let (_temp, tree) = sample_tree();
        let _guard = CurrentDirGuard(std::env::current_dir().unwrap());
        std::env::set_current_dir(&tree.path).unwrap();

        let cancel = CancellationToken::new();
        let builder = PackageBuilder::new(
            SizeThresholds::default(),
            1000,
            &cancel,
            &AutoDeny,
            &SilentProgressReporter,
        );
        let result = builder.build(&tree, Path::new("output/Pkg/Pkg.tar.gz"));
        assert!(matches!(result, Err(PackError::ConfigInvalid { .. })));
        assert!(!tree.path.join("output").exists());
    }

    #[test]
    fn test_destination_spelled_through_parent_is_rejected() {
        let (_temp, tree) = sample_tree();
        let cancel = CancellationToken::new();
        let builder = PackageBuilder::new(
            SizeThresholds::default(),
            1000,
            &cancel,
            &AutoDeny,
            &SilentProgressReporter,
        );
        let dest = tree
            .path
            .join("image")
            .join("..")
            .join("out")
            .join("Pkg.tar.gz");
        assert!(matches!(
            builder.build(&tree, &dest),
            Err(PackError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_resolve_destination_keeps_missing_components() {
        let (temp, _tree) = sample_tree();
        let dest = temp.path().join("out").join("Pkg").join("Pkg.tar.gz");
        let resolved = resolve_destination(&dest).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("out/Pkg/Pkg.tar.gz"));
    }

    #[test]
    fn test_extreme_size_question_mentions_failure_modes() {
        let question = extreme_size_question(&TreeStats {
            files: 3,
            bytes: 9 * 1024 * 1024 * 1024,
        });
        assert!(question.contains("9.00 GB"));
        assert!(question.contains("upload limit"));
        assert!(question.contains("free space"));
    }
}
