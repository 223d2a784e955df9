use chrono::{DateTime, Utc};
use glob::Pattern;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::error::Error;
use crate::filesystem::FileSystem;
use crate::marks::PathMarks;
use crate::model::{DirectoryEntry, DirectoryLinkRoot, RelocationStatus};
use crate::progress::ProgressReporter;
use crate::relocate::status::classify;

/// Lists the directories under a root and measures each one on a bounded pool.
pub struct DirectoryScanner {
    fs: Arc<dyn FileSystem>,
    pool: ThreadPool,
    ignore_patterns: Vec<Pattern>,
}

impl DirectoryScanner {
    /// `threads == 0` sizes the pool by rayon's default.
    pub fn new(fs: Arc<dyn FileSystem>, threads: usize, ignore_globs: &[String]) -> Result<Self, Error> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("relocator-scan-{}", i))
            .build()
            .map_err(|e| Error::InvalidArgument(format!("Cannot build scan pool: {}", e)))?;

        let ignore_patterns = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        Ok(Self {
            fs,
            pool,
            ignore_patterns,
        })
    }

    /// Paths that belong in the listing of `root`, resolved lazily.
    pub fn candidates<'a>(&'a self, root: &Path, marks: &'a PathMarks) -> Candidates<'a> {
        Candidates {
            fs: self.fs.as_ref(),
            marks,
            ignore_patterns: &self.ignore_patterns,
            root: Some(root.to_path_buf()),
            pending: Vec::new(),
        }
    }

    /// Build the listing of `root`, sorted by size, largest first.
    ///
    /// Entries that cannot be measured keep zero size, the current time and
    /// `Plain` status rather than failing the scan.
    pub fn scan(
        &self,
        root: &DirectoryLinkRoot,
        marks: &PathMarks,
        is_busy: &(dyn Fn(&Path) -> bool + Sync),
        reporter: &dyn ProgressReporter,
    ) -> Vec<DirectoryEntry> {
        let start = Instant::now();
        reporter.on_scan_start(&root.original_path);

        if !self.fs.is_dir(&root.original_path) {
            warn!("Root {} does not exist", root.original_path.display());
            reporter.on_scan_complete(0, start.elapsed().as_secs_f64());
            return Vec::new();
        }

        let candidates: Vec<PathBuf> = self.candidates(&root.original_path, marks).collect();
        let total = candidates.len();
        let measured = AtomicUsize::new(0);

        let mut entries: Vec<DirectoryEntry> = self.pool.install(|| {
            candidates
                .into_par_iter()
                .map(|path| {
                    let mut entry = self.measure(path, root);
                    entry.is_busy = is_busy(&entry.path);
                    let done = measured.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_scan_progress(done, total);
                    entry
                })
                .collect()
        });

        entries.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

        debug!(
            "Scanned {} in {:.2}s, {} entries",
            root.original_path.display(),
            start.elapsed().as_secs_f64(),
            entries.len()
        );
        reporter.on_scan_complete(entries.len(), start.elapsed().as_secs_f64());
        entries
    }

    /// Size, last access and status of a single directory.
    pub fn measure(&self, path: PathBuf, root: &DirectoryLinkRoot) -> DirectoryEntry {
        let mut entry = DirectoryEntry::unmeasured(path);
        let fs = self.fs.as_ref();

        match fs.tree_size(&entry.path) {
            Ok(size) => entry.size_bytes = size,
            Err(err) => warn!("Error measuring size of {}: {}", entry.path.display(), err),
        }

        match fs.list_dir(&entry.path) {
            Ok(listing) => {
                if let Some(earliest) = listing.iter().filter_map(|item| item.accessed).min() {
                    entry.last_accessed = DateTime::<Utc>::from(earliest);
                }
            }
            Err(err) => warn!("Error reading {}: {}", entry.path.display(), err),
        }

        entry.status = match classify(fs, &entry.path, root) {
            Ok(status) => status,
            Err(err) => {
                debug!("Treating {} as plain: {}", entry.path.display(), err);
                RelocationStatus::Plain
            }
        };

        entry
    }
}

/// Iterator over the directories a listing shows: ignored ones dropped,
/// skipped ones replaced by their own children.
pub struct Candidates<'a> {
    fs: &'a dyn FileSystem,
    marks: &'a PathMarks,
    ignore_patterns: &'a [Pattern],
    root: Option<PathBuf>,
    pending: Vec<PathBuf>,
}

impl Candidates<'_> {
    fn push_children(&mut self, dir: &Path) {
        match self.fs.list_dir(dir) {
            Ok(listing) => self
                .pending
                .extend(listing.directories.into_iter().rev().map(|d| d.path)),
            Err(err) => warn!("Error listing {}: {}", dir.display(), err),
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.marks.is_ignored(path)
            || self
                .ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(path))
    }
}

impl Iterator for Candidates<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        if let Some(root) = self.root.take() {
            self.push_children(&root);
        }

        while let Some(path) = self.pending.pop() {
            if self.is_excluded(&path) {
                continue;
            }
            if self.marks.is_skipped(&path) {
                self.push_children(&path);
                continue;
            }
            return Some(path);
        }

        None
    }
}
