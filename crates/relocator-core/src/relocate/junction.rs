use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Error, IoResultExt};
use crate::filesystem::FileSystem;
use crate::model::{DirectoryLinkRoot, RelocationStatus};
use crate::platform::path_key;
use crate::relocate::compare::structurally_equal;
use crate::relocate::copier::{clear_read_only_tree, copy_tree};
use crate::relocate::path_map::map_to_backup;
use crate::relocate::status::classify;

/// Creates and removes junctions, one operation per path at a time.
pub struct JunctionManager {
    fs: Arc<dyn FileSystem>,
    settle_delay: Duration,
    clear_read_only: bool,
    in_flight: DashMap<String, PathBuf>,
}

/// Exclusive claim on a path for the duration of one operation.
pub struct PathClaim<'a> {
    in_flight: &'a DashMap<String, PathBuf>,
    key: String,
}

impl Drop for PathClaim<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

impl JunctionManager {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            settle_delay: Duration::from_millis(500),
            clear_read_only: true,
            in_flight: DashMap::new(),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_clear_read_only(mut self, clear: bool) -> Self {
        self.clear_read_only = clear;
        self
    }

    /// Claim `path` or fail with `Busy` if another operation holds it.
    pub fn claim(&self, path: &Path) -> Result<PathClaim<'_>, Error> {
        let key = path_key(path);
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => Err(Error::Busy(path.to_path_buf())),
            Entry::Vacant(vacant) => {
                vacant.insert(path.to_path_buf());
                Ok(PathClaim {
                    in_flight: &self.in_flight,
                    key,
                })
            }
        }
    }

    pub fn is_busy(&self, path: &Path) -> bool {
        self.in_flight.contains_key(&path_key(path))
    }

    /// Move `path` to its backup location and leave a junction in its place.
    pub fn create_junction(
        &self,
        path: &Path,
        root: &DirectoryLinkRoot,
    ) -> Result<RelocationStatus, Error> {
        let _claim = self.claim(path)?;
        let fs = self.fs.as_ref();
        let backup = map_to_backup(path, &root.original_path, &root.backup_path)?;

        if fs.exists(&backup) {
            return Err(Error::Conflict(backup));
        }
        if !fs.exists(path) {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        info!("Relocating {} -> {}", path.display(), backup.display());
        self.relocate_tree(path, &backup)?;

        fs.create_link(path, &backup).at(path)?;
        debug!("Created junction {} -> {}", path.display(), backup.display());

        // TODO: poll for the link instead of waiting a fixed delay
        thread::sleep(self.settle_delay);
        classify(fs, path, root)
    }

    /// Replace the junction at `path` with the backed-up tree it points to.
    ///
    /// Refuses with `StructuralMismatch` when the junction's contents no longer
    /// mirror the backup, leaving both in place.
    pub fn remove_junction(
        &self,
        path: &Path,
        root: &DirectoryLinkRoot,
    ) -> Result<RelocationStatus, Error> {
        let _claim = self.claim(path)?;
        let fs = self.fs.as_ref();
        let backup = map_to_backup(path, &root.original_path, &root.backup_path)?;

        if !fs.exists(path) {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        if !fs.is_link(path).at(path)? {
            debug!("{} is not a junction, nothing to remove", path.display());
            return classify(fs, path, root);
        }
        if !fs.is_dir(&backup) {
            return Err(Error::NotFound(backup));
        }

        if !structurally_equal(fs, path, &backup)? {
            warn!(
                "Refusing to remove {}: contents differ from {}",
                path.display(),
                backup.display()
            );
            return Err(Error::StructuralMismatch {
                junction: path.to_path_buf(),
                backup,
            });
        }

        info!("Restoring {} from {}", path.display(), backup.display());
        fs.remove_link(path).at(path)?;
        self.relocate_tree(&backup, path)?;

        classify(fs, path, root)
    }

    /// Delete the backup of a directory that is not currently junctioned.
    pub fn remove_backup(
        &self,
        path: &Path,
        root: &DirectoryLinkRoot,
    ) -> Result<RelocationStatus, Error> {
        let _claim = self.claim(path)?;
        let fs = self.fs.as_ref();
        let backup = map_to_backup(path, &root.original_path, &root.backup_path)?;

        if !fs.exists(path) {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        if fs.is_link(path).at(path)? {
            return Err(Error::Conflict(backup));
        }

        if fs.is_dir(&backup) {
            info!("Removing backup {}", backup.display());
            if self.clear_read_only {
                clear_read_only_tree(fs, &backup)?;
            }
            fs.remove_dir_all(&backup).at(&backup)?;
        }

        classify(fs, path, root)
    }

    /// Move a tree, renaming on one volume and copying then deleting across volumes.
    fn relocate_tree(&self, from: &Path, to: &Path) -> Result<(), Error> {
        let fs = self.fs.as_ref();

        if let Some(parent) = to.parent() {
            fs.create_dir_all(parent).at(parent)?;
        }

        if fs.same_volume(from, to) {
            debug!("Renaming {} -> {}", from.display(), to.display());
            return fs.rename(from, to).at(from);
        }

        debug!("Copying {} -> {} across volumes", from.display(), to.display());
        copy_tree(fs, from, to, self.clear_read_only)?;
        if self.clear_read_only {
            clear_read_only_tree(fs, from)?;
        }
        fs.remove_dir_all(from).at(from)
    }
}
