use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::Error;
use crate::filesystem::{FileSystem, StdFileSystem};
use crate::marks::PathMarks;
use crate::model::{DirectoryLinkRoot, Listing, RelocationStatus};
use crate::platform::path_key;
use crate::progress::{ProgressReporter, RelocationAction};
use crate::relocate::{classify, JunctionManager};
use crate::scanner::DirectoryScanner;

/// Caller-facing entry point: scans roots, relocates directories and tracks marks.
pub struct RelocationEngine {
    fs: Arc<dyn FileSystem>,
    scanner: DirectoryScanner,
    junctions: JunctionManager,
    marks: RwLock<PathMarks>,
    generation: AtomicU64,
    listing: RwLock<Option<Listing>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RelocationEngine {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        Self::with_fs(Arc::new(StdFileSystem::new()), config)
    }

    pub fn with_fs(fs: Arc<dyn FileSystem>, config: &AppConfig) -> Result<Self, Error> {
        let scanner =
            DirectoryScanner::new(fs.clone(), config.scan_threads, &config.ignore_patterns)?;
        let junctions = JunctionManager::new(fs.clone())
            .with_settle_delay(config.settle_delay())
            .with_clear_read_only(config.clear_read_only);

        Ok(Self {
            fs,
            scanner,
            junctions,
            marks: RwLock::new(PathMarks::default()),
            generation: AtomicU64::new(0),
            listing: RwLock::new(None),
        })
    }

    pub fn with_marks(self, marks: PathMarks) -> Self {
        *write(&self.marks) = marks;
        self
    }

    /// Start a new scan generation. Scans still running under an older
    /// generation will not publish their listing.
    pub fn invalidate(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Scan `root` and publish the listing, unless a newer scan started meanwhile.
    pub fn scan_root(
        &self,
        root: &DirectoryLinkRoot,
        reporter: &dyn ProgressReporter,
    ) -> Result<Listing, Error> {
        let generation = self.invalidate();
        let start = Instant::now();
        info!(
            "Scanning {} (generation {})",
            root.original_path.display(),
            generation
        );

        let marks = self.marks();
        let is_busy = |path: &Path| self.junctions.is_busy(path);
        let entries = self.scanner.scan(root, &marks, &is_busy, reporter);

        let listing = Listing {
            generation,
            root: root.clone(),
            entries,
        };

        let mut published = write(&self.listing);
        if self.current_generation() != generation {
            debug!("Discarding listing of superseded generation {}", generation);
            return Err(Error::Superseded { generation });
        }
        *published = Some(listing.clone());

        info!(
            "Listed {} directories under {} in {:.2}s",
            listing.entries.len(),
            root.original_path.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(listing)
    }

    /// Run [`scan_root`](Self::scan_root) on a background thread.
    pub fn spawn_scan(
        self: &Arc<Self>,
        root: DirectoryLinkRoot,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Receiver<Result<Listing, Error>> {
        let (sender, receiver) = mpsc::channel();
        let engine = Arc::clone(self);
        thread::spawn(move || {
            let result = engine.scan_root(&root, reporter.as_ref());
            if sender.send(result).is_err() {
                debug!("Scan result for {} dropped, receiver gone", root.original_path.display());
            }
        });
        receiver
    }

    /// The most recently published listing.
    pub fn latest_listing(&self) -> Option<Listing> {
        read(&self.listing).clone()
    }

    pub fn create_junction(
        &self,
        root: &DirectoryLinkRoot,
        path: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<RelocationStatus, Error> {
        self.run_action(RelocationAction::CreateJunction, path, reporter, || {
            self.junctions.create_junction(path, root)
        })
    }

    pub fn remove_junction(
        &self,
        root: &DirectoryLinkRoot,
        path: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<RelocationStatus, Error> {
        self.run_action(RelocationAction::RemoveJunction, path, reporter, || {
            self.junctions.remove_junction(path, root)
        })
    }

    pub fn remove_backup(
        &self,
        root: &DirectoryLinkRoot,
        path: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<RelocationStatus, Error> {
        self.run_action(RelocationAction::RemoveBackup, path, reporter, || {
            self.junctions.remove_backup(path, root)
        })
    }

    fn run_action(
        &self,
        action: RelocationAction,
        path: &Path,
        reporter: &dyn ProgressReporter,
        op: impl FnOnce() -> Result<RelocationStatus, Error>,
    ) -> Result<RelocationStatus, Error> {
        reporter.on_relocate_start(path, action);
        match op() {
            Ok(status) => {
                self.update_listed_status(path, status);
                reporter.on_relocate_complete(path, action, status);
                Ok(status)
            }
            Err(err) => {
                warn!("{:?} failed for {}: {}", action, path.display(), err);
                Err(err)
            }
        }
    }

    fn update_listed_status(&self, path: &Path, status: RelocationStatus) {
        if let Some(listing) = write(&self.listing).as_mut() {
            let key = path_key(path);
            for entry in listing
                .entries
                .iter_mut()
                .filter(|e| path_key(&e.path) == key)
            {
                entry.status = status;
            }
        }
    }

    pub fn is_busy(&self, path: &Path) -> bool {
        self.junctions.is_busy(path)
    }

    /// Hide `path` from future listings. Returns false if it was already ignored.
    pub fn mark_ignored(&self, path: &Path) -> bool {
        let changed = write(&self.marks).mark_ignored(path);
        if changed {
            info!("Ignoring {}", path.display());
            self.drop_listed(path);
        }
        changed
    }

    /// List the children of `path` in its place from the next scan on.
    pub fn mark_skipped(&self, path: &Path) -> bool {
        let changed = write(&self.marks).mark_skipped(path);
        if changed {
            info!("Skipping {}", path.display());
            self.drop_listed(path);
        }
        changed
    }

    pub fn unmark(&self, path: &Path) -> Option<RelocationStatus> {
        let previous = write(&self.marks).unmark(path);
        if let Some(status) = previous {
            info!("Cleared {} mark on {}", status, path.display());
        }
        previous
    }

    fn drop_listed(&self, path: &Path) {
        if let Some(listing) = write(&self.listing).as_mut() {
            let key = path_key(path);
            listing
                .entries
                .retain(|e| path_key(&e.path) != key);
        }
    }

    /// Snapshot of the current marks.
    pub fn marks(&self) -> PathMarks {
        read(&self.marks).clone()
    }

    /// Marks win over the on-disk state.
    pub fn status_of(
        &self,
        root: &DirectoryLinkRoot,
        path: &Path,
    ) -> Result<RelocationStatus, Error> {
        if let Some(mark) = read(&self.marks).status_of(path) {
            return Ok(mark);
        }
        classify(self.fs.as_ref(), path, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn engine() -> RelocationEngine {
        let config = AppConfig {
            settle_delay_ms: 0,
            scan_threads: 2,
            ..AppConfig::default()
        };
        RelocationEngine::new(&config).unwrap()
    }

    fn setup() -> (tempfile::TempDir, DirectoryLinkRoot) {
        let tmp = tempdir().unwrap();
        let original = tmp.path().join("original");
        let backup = tmp.path().join("backup");
        fs::create_dir_all(original.join("alpha")).unwrap();
        fs::create_dir_all(original.join("beta")).unwrap();
        fs::create_dir_all(&backup).unwrap();
        fs::write(original.join("alpha").join("a.bin"), vec![1u8; 64]).unwrap();
        let root = DirectoryLinkRoot::new("test", original, backup);
        (tmp, root)
    }

    #[test]
    fn test_marks_override_status() {
        let (_tmp, root) = setup();
        let engine = engine();
        let alpha = root.original_path.join("alpha");

        assert_eq!(engine.status_of(&root, &alpha).unwrap(), RelocationStatus::Plain);
        assert!(engine.mark_skipped(&alpha));
        assert_eq!(engine.status_of(&root, &alpha).unwrap(), RelocationStatus::Skipped);
        assert!(engine.mark_ignored(&alpha));
        assert_eq!(engine.status_of(&root, &alpha).unwrap(), RelocationStatus::Ignored);
        assert!(!engine.marks().is_skipped(&alpha));
        assert_eq!(engine.unmark(&alpha), Some(RelocationStatus::Ignored));
        assert_eq!(engine.status_of(&root, &alpha).unwrap(), RelocationStatus::Plain);
    }

    #[test]
    fn test_scan_publishes_listing() {
        let (_tmp, root) = setup();
        let engine = engine();
        assert!(engine.latest_listing().is_none());

        let listing = engine.scan_root(&root, &SilentReporter).unwrap();
        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.entries[0].short_name, "alpha");
        assert_eq!(listing.total_bytes(), 64);
        assert_eq!(engine.latest_listing().unwrap().generation, listing.generation);
    }

    #[test]
    fn test_ignoring_drops_entry_from_latest_listing() {
        let (_tmp, root) = setup();
        let engine = engine();
        engine.scan_root(&root, &SilentReporter).unwrap();

        engine.mark_ignored(&root.original_path.join("beta"));
        let names: Vec<String> = engine
            .latest_listing()
            .unwrap()
            .entries
            .into_iter()
            .map(|e| e.short_name)
            .collect();
        assert_eq!(names, vec!["alpha".to_string()]);
    }

    #[test]
    fn test_spawn_scan_delivers_result() {
        let (_tmp, root) = setup();
        let engine = Arc::new(engine());
        let receiver = engine.spawn_scan(root, Arc::new(SilentReporter));
        let listing = receiver.recv().unwrap().unwrap();
        assert_eq!(listing.entries.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_relocation_updates_listed_status() {
        let (_tmp, root) = setup();
        let engine = engine();
        engine.scan_root(&root, &SilentReporter).unwrap();

        let alpha: PathBuf = root.original_path.join("alpha");
        let status = engine.create_junction(&root, &alpha, &SilentReporter).unwrap();
        assert_eq!(status, RelocationStatus::JunctionAvailable);

        let listing = engine.latest_listing().unwrap();
        let entry = listing.entries.iter().find(|e| e.path == alpha).unwrap();
        assert_eq!(entry.status, RelocationStatus::JunctionAvailable);
    }
}
