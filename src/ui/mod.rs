//! UI/Progress presentation layer
//!
//! This module handles:
//! - Progress reporting while archives are written
//! - The confirmation capability injected into the pipeline ([`prompt`])
//! - Styled terminal summaries ([`display`])
//!
//! All progress reporting goes through the ProgressReporter trait, so quiet
//! mode and tests use a silent implementation.

pub mod display;
pub mod prompt;

pub use prompt::{AutoConfirm, AutoDeny, Confirm, InquireConfirm};

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter trait for archive creation
pub trait ProgressReporter: Send + Sync {
    /// Start a new phase with a total file count
    fn start(&self, phase: &str, total_files: u64);

    /// Record one processed file
    fn advance(&self, file_path: &str);

    /// Finish the current phase
    fn finish(&self);

    /// Abandon the current phase on error
    fn abandon(&self);
}

/// Interactive progress reporter with a visual progress bar
pub struct InteractiveProgressReporter {
    pb: ProgressBar,
}

impl InteractiveProgressReporter {
    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template("{prefix:>10.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let pb = ProgressBar::new(0);
        pb.set_style(style);

        Self { pb }
    }
}

impl Default for InteractiveProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for InteractiveProgressReporter {
    fn start(&self, phase: &str, total_files: u64) {
        self.pb.reset();
        self.pb.set_length(total_files);
        self.pb.set_prefix(phase.to_string());
    }

    fn advance(&self, file_path: &str) {
        // Truncate long paths for display
        let display_path = if file_path.chars().count() > 50 {
            let tail: String = file_path
                .chars()
                .rev()
                .take(47)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{tail}")
        } else {
            file_path.to_string()
        };
        self.pb.set_message(display_path);
        self.pb.inc(1);
    }

    fn finish(&self) {
        self.pb.finish_and_clear();
    }

    fn abandon(&self) {
        self.pb.abandon();
    }
}

/// Silent progress reporter for quiet mode and tests
#[derive(Default)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start(&self, _phase: &str, _total_files: u64) {}

    fn advance(&self, _file_path: &str) {}

    fn finish(&self) {}

    fn abandon(&self) {}
}
