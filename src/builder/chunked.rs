//! Chunked fallback strategy
//!
//! Files are split into fixed-size batches, each compressed into its own
//! intermediate archive inside a scratch directory next to the destination.
//! A single batch becomes the final archive; several are wrapped into one
//! container tar.gz whose members are `part-NNNN.tar.gz`.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, warn};

use super::strategy::{ArchiveJob, ArchiveStrategy, finish_progress, write_archive};
use crate::domain::StrategyKind;
use crate::error::{Result, compression, fs as fs_error};

/// Name of the `index`-th intermediate archive, starting at 1
pub fn part_name(index: usize) -> String {
    format!("part-{index:04}.tar.gz")
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkedStrategy {
    chunk_files: usize,
}

impl ChunkedStrategy {
    pub fn new(chunk_files: usize) -> Self {
        Self {
            chunk_files: chunk_files.max(1),
        }
    }

    fn write_parts(&self, job: &ArchiveJob<'_>, scratch: &Path) -> Result<Vec<PathBuf>> {
        let mut parts = Vec::new();
        for (i, batch) in job.files.chunks(self.chunk_files).enumerate() {
            job.cancel.check()?;
            let part = scratch.join(part_name(i + 1));
            write_archive(
                self.kind(),
                &part,
                batch,
                Compression::default(),
                job.cancel,
                job.progress,
            )?;
            debug!("Wrote chunk {} with {} file(s)", part.display(), batch.len());
            parts.push(part);
        }
        Ok(parts)
    }

    fn combine(&self, parts: &[PathBuf], dest: &Path) -> Result<()> {
        if let [only] = parts {
            return fs::rename(only, dest).map_err(|e| {
                fs_error::write_failed(dest.display().to_string(), e.to_string())
            });
        }

        let failed = |e: std::io::Error| compression::strategy_failed(self.kind(), e.to_string());
        let file = fs::File::create(dest)
            .map_err(|e| fs_error::write_failed(dest.display().to_string(), e.to_string()))?;
        // Members are already compressed
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::fast()));
        for (i, part) in parts.iter().enumerate() {
            builder
                .append_path_with_name(part, part_name(i + 1))
                .map_err(failed)?;
        }
        let encoder = builder.into_inner().map_err(failed)?;
        encoder.finish().map_err(failed)?;
        Ok(())
    }
}

impl ArchiveStrategy for ChunkedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Chunked
    }

    fn write(&self, job: &ArchiveJob<'_>) -> Result<()> {
        let parent = job
            .dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let scratch = tempfile::Builder::new()
            .prefix(".chunks-")
            .tempdir_in(parent)
            .map_err(|e| compression::strategy_failed(self.kind(), e.to_string()))?;

        job.progress.start("chunked", job.files.len() as u64);
        let result = if job.files.is_empty() {
            write_archive(
                self.kind(),
                job.dest,
                job.files,
                Compression::default(),
                job.cancel,
                job.progress,
            )
        } else {
            self.write_parts(job, scratch.path())
                .and_then(|parts| self.combine(&parts, job.dest))
        };
        finish_progress(job.progress, &result);

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(
                "Failed to remove chunk directory {}: {}",
                scratch_path.display(),
                e
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::test_support::{fixture_tree, unpack, unpack_container};
    use crate::cancel::CancellationToken;
    use crate::ui::SilentProgressReporter;

    fn leftover_chunk_dirs(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with(".chunks-"))
            .collect()
    }

    #[test]
    fn test_part_name() {
        assert_eq!(part_name(1), "part-0001.tar.gz");
        assert_eq!(part_name(12), "part-0012.tar.gz");
    }

    #[test]
    fn test_single_batch_becomes_final_archive() {
        let (temp, tree) = fixture_tree(&[
            ("a.txt", b"alpha".as_slice()),
            ("b.txt", b"beta".as_slice()),
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
        ChunkedStrategy::new(10).write(&job).unwrap();

        let unpacked = unpack(&dest);
        assert_eq!(unpacked.len(), 2);
        assert_eq!(unpacked["b.txt"], b"beta");
        assert!(leftover_chunk_dirs(temp.path()).is_empty());
    }

    #[test]
    fn test_multiple_batches_wrapped_in_container() {
        let (temp, tree) = fixture_tree(&[
            ("1.txt", b"one".as_slice()),
            ("2.txt", b"two".as_slice()),
            ("3.txt", b"three".as_slice()),
            ("4.txt", b"four".as_slice()),
            ("5.txt", b"five".as_slice()),
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
        ChunkedStrategy::new(2).write(&job).unwrap();

        let parts = unpack_container(&dest);
        let names: Vec<_> = parts.keys().cloned().collect();
        assert_eq!(
            names,
            vec!["part-0001.tar.gz", "part-0002.tar.gz", "part-0003.tar.gz"]
        );
        assert_eq!(parts["part-0003.tar.gz"]["5.txt"], b"five");
        let total: usize = parts.values().map(|p| p.len()).sum();
        assert_eq!(total, 5);
        assert!(leftover_chunk_dirs(temp.path()).is_empty());
    }

    #[test]
    fn test_cancelled_run_removes_intermediates() {
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
        assert!(ChunkedStrategy::new(1).write(&job).is_err());
        assert!(leftover_chunk_dirs(temp.path()).is_empty());
    }
}
