//! Archive strategies
//!
//! Every strategy writes one gzip-compressed tar archive to the job's
//! destination. Entry names are relative to the tree root.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::domain::{StrategyKind, TreeFile};
use crate::error::{Result, compression, fs as fs_error};
use crate::ui::ProgressReporter;

/// Write buffer for the streaming strategies
const STREAM_BUFFER_BYTES: usize = 1024 * 1024;

/// Everything a strategy needs to produce one archive
pub struct ArchiveJob<'a> {
    pub root: &'a Path,
    pub files: &'a [TreeFile],
    pub dest: &'a Path,
    pub cancel: &'a CancellationToken,
    pub progress: &'a dyn ProgressReporter,
}

/// One way of turning a tree into an archive
pub trait ArchiveStrategy {
    fn kind(&self) -> StrategyKind;

    /// Write the archive to `job.dest`
    fn write(&self, job: &ArchiveJob<'_>) -> Result<()>;
}

/// Whole-tree compression at the best compression level in a single pass
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardStrategy;

impl ArchiveStrategy for StandardStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Standard
    }

    fn write(&self, job: &ArchiveJob<'_>) -> Result<()> {
        job.cancel.check()?;
        let failed = |e: std::io::Error| compression::strategy_failed(self.kind(), e.to_string());

        let file = create_dest(job.dest)?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::best()));
        builder.follow_symlinks(false);

        job.progress.start("standard", 1);
        builder.append_dir_all(".", job.root).map_err(failed)?;
        let encoder = builder.into_inner().map_err(failed)?;
        encoder.finish().map_err(failed)?;
        job.progress.advance(&job.root.display().to_string());
        job.progress.finish();

        job.cancel.check()
    }
}

/// Per-file streaming through a bounded write buffer
#[derive(Debug, Default, Clone, Copy)]
pub struct EnhancedStrategy;

impl ArchiveStrategy for EnhancedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Enhanced
    }

    fn write(&self, job: &ArchiveJob<'_>) -> Result<()> {
        job.progress.start("enhanced", job.files.len() as u64);
        let result = write_archive(
            self.kind(),
            job.dest,
            job.files,
            Compression::default(),
            job.cancel,
            job.progress,
        );
        finish_progress(job.progress, &result);
        result
    }
}

/// Stream `files` into a new tar.gz at `dest`
///
/// Checks the cancellation token before every file.
pub(super) fn write_archive(
    kind: StrategyKind,
    dest: &Path,
    files: &[TreeFile],
    level: Compression,
    cancel: &CancellationToken,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let file = create_dest(dest)?;
    let writer = BufWriter::with_capacity(STREAM_BUFFER_BYTES, file);
    let mut builder = tar::Builder::new(GzEncoder::new(writer, level));

    for entry in files {
        cancel.check()?;
        builder
            .append_path_with_name(&entry.absolute, &entry.relative)
            .map_err(|e| {
                compression::strategy_failed(kind, format!("{}: {e}", entry.relative.display()))
            })?;
        progress.advance(&entry.relative.display().to_string());
    }

    let failed = |e: std::io::Error| compression::strategy_failed(kind, e.to_string());
    let encoder = builder.into_inner().map_err(failed)?;
    let mut writer = encoder.finish().map_err(failed)?;
    writer.flush().map_err(failed)?;
    debug!("Wrote {} entries to {}", files.len(), dest.display());
    Ok(())
}

fn create_dest(dest: &Path) -> Result<File> {
    File::create(dest)
        .map_err(|e| fs_error::write_failed(dest.display().to_string(), e.to_string()))
}

pub(super) fn finish_progress(progress: &dyn ProgressReporter, result: &Result<()>) {
    if result.is_ok() {
        progress.finish();
    } else {
        progress.abandon();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::test_support::{fixture_tree, unpack};
    use crate::ui::SilentProgressReporter;

    #[test]
    fn test_standard_round_trip() {
        let (temp, tree) = fixture_tree(&[
            ("image/Installer.exe", b"MZ installer".as_slice()),
            ("image/Collection.xml", b"<collection/>".as_slice()),
            ("image/x64/data.cab", [7u8; 4096].as_slice()),
        ]);
        let files = tree.files().unwrap();
        let dest = temp.path().join("out.tar.gz");
        let job = ArchiveJob {
            root: &tree.path,
            files: &files,
            dest: &dest,
            cancel: &CancellationToken::new(),
            progress: &SilentProgressReporter,
        };
        StandardStrategy.write(&job).unwrap();

        let unpacked = unpack(&dest);
        assert_eq!(unpacked.len(), 3);
        assert_eq!(unpacked["image/Installer.exe"], b"MZ installer");
        assert_eq!(unpacked["image/x64/data.cab"], vec![7u8; 4096]);
    }

    #[test]
    fn test_enhanced_round_trip() {
        let (temp, tree) = fixture_tree(&[
            ("a.txt", b"alpha".as_slice()),
            ("nested/deeper/b.txt", b"beta".as_slice()),
        ]);
        let files = tree.files().unwrap();
        let dest = temp.path().join("out.tar.gz");
        let job = ArchiveJob {
            root: &tree.path,
            files: &files,
            dest: &dest,
            cancel: &CancellationToken::new(),
            progress: &SilentProgressReporter,
        };
        EnhancedStrategy.write(&job).unwrap();

        let unpacked = unpack(&dest);
        assert_eq!(unpacked["a.txt"], b"alpha");
        assert_eq!(unpacked["nested/deeper/b.txt"], b"beta");
    }

    #[test]
    fn test_enhanced_stops_when_cancelled() {
        let (temp, tree) = fixture_tree(&[("a.txt", b"alpha".as_slice())]);
        let files = tree.files().unwrap();
        let dest = temp.path().join("out.tar.gz");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let job = ArchiveJob {
            root: &tree.path,
            files: &files,
            dest: &dest,
            cancel: &cancel,
            progress: &SilentProgressReporter,
        };
        assert!(matches!(
            EnhancedStrategy.write(&job),
            Err(crate::error::PackError::Cancelled)
        ));
    }
}
