use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;
use walkdir::WalkDir;

use crate::platform;

/// One child of a listed directory.
#[derive(Debug, Clone)]
pub struct DirItem {
    pub name: OsString,
    pub path: PathBuf,
    pub len: u64,
    pub accessed: Option<SystemTime>,
    pub is_link: bool,
}

/// Immediate children of a directory, split into directories and files.
#[derive(Debug, Clone, Default)]
pub struct DirListing {
    pub directories: Vec<DirItem>,
    pub files: Vec<DirItem>,
}

impl DirListing {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirItem> {
        self.directories.iter().chain(self.files.iter())
    }
}

/// Host filesystem primitives used by the relocation engine.
///
/// Paths that are links are followed when listing, so listing a junction shows
/// the contents of its target.
pub trait FileSystem: Send + Sync {
    /// True for directories, including links that resolve to one.
    fn is_dir(&self, path: &Path) -> bool;

    /// True when anything (including a dangling link) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    fn is_link(&self, path: &Path) -> io::Result<bool>;

    fn list_dir(&self, path: &Path) -> io::Result<DirListing>;

    /// Sum of the lengths of all files below `path`. Links inside the tree are not followed.
    fn tree_size(&self, path: &Path) -> io::Result<u64> {
        let listing = self.list_dir(path)?;
        let mut total: u64 = listing
            .files
            .iter()
            .filter(|f| !f.is_link)
            .map(|f| f.len)
            .sum();
        for dir in listing.directories.iter().filter(|d| !d.is_link) {
            total += self.tree_size(&dir.path)?;
        }
        Ok(total)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove the link itself, never its target.
    fn remove_link(&self, path: &Path) -> io::Result<()>;

    fn is_read_only(&self, path: &Path) -> io::Result<bool>;

    fn set_read_only(&self, path: &Path, read_only: bool) -> io::Result<()>;

    /// Create a directory link (junction) at `link` resolving to `target`.
    fn create_link(&self, link: &Path, target: &Path) -> io::Result<()>;

    /// Target a link points at, as stored in the link.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Whether a rename between the two locations stays on one volume.
    fn same_volume(&self, left: &Path, right: &Path) -> bool;

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>>;
}

/// `FileSystem` backed by the host OS.
///
/// Listings are sorted by name so that positional comparisons of two
/// identical trees line up regardless of the order the OS returns entries in.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl StdFileSystem {
    pub fn new() -> Self {
        StdFileSystem
    }
}

impl FileSystem for StdFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_link(&self, path: &Path) -> io::Result<bool> {
        let metadata = fs::symlink_metadata(path)?;
        Ok(platform::is_link_metadata(&metadata))
    }

    fn list_dir(&self, path: &Path) -> io::Result<DirListing> {
        let mut listing = DirListing::default();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let entry_path = entry.path();
            let own_metadata = fs::symlink_metadata(&entry_path)?;
            let is_link = platform::is_link_metadata(&own_metadata);
            let metadata = if is_link {
                fs::metadata(&entry_path).unwrap_or(own_metadata)
            } else {
                own_metadata
            };

            let item = DirItem {
                name: entry.file_name(),
                path: entry_path,
                len: if metadata.is_dir() { 0 } else { metadata.len() },
                accessed: metadata.accessed().ok(),
                is_link,
            };

            if metadata.is_dir() {
                listing.directories.push(item);
            } else {
                listing.files.push(item);
            }
        }

        listing.directories.sort_by(|a, b| a.name.cmp(&b.name));
        listing.files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }

    fn tree_size(&self, path: &Path) -> io::Result<u64> {
        let mut total = 0u64;

        for entry in WalkDir::new(path) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        match entry.metadata() {
                            Ok(metadata) => total += metadata.len(),
                            Err(err) => warn!(
                                "Error reading metadata for {}: {}",
                                entry.path().display(),
                                err
                            ),
                        }
                    }
                }
                Err(err) if err.depth() == 0 => return Err(err.into()),
                Err(err) => {
                    warn!("Skipping unreadable entry under {}: {}", path.display(), err);
                }
            }
        }

        Ok(total)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn remove_link(&self, path: &Path) -> io::Result<()> {
        platform::remove_directory_link(path)
    }

    fn is_read_only(&self, path: &Path) -> io::Result<bool> {
        Ok(fs::metadata(path)?.permissions().readonly())
    }

    fn set_read_only(&self, path: &Path, read_only: bool) -> io::Result<()> {
        platform::set_read_only(path, read_only)
    }

    fn create_link(&self, link: &Path, target: &Path) -> io::Result<()> {
        platform::create_directory_link(link, target)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn same_volume(&self, left: &Path, right: &Path) -> bool {
        platform::same_volume(left, right)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(path)?))
    }
}
