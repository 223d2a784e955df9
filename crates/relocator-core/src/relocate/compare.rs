use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, IoResultExt};
use crate::filesystem::{DirItem, FileSystem};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Whether two directory trees have the same shape and the same files.
///
/// Subdirectories and files are compared position by position in the order
/// the filesystem lists them. Directory names are compared at every level but
/// the root; files must agree on name, length and content. Links below the
/// root are compared by name only and never followed. Stops at the first
/// difference.
pub fn structurally_equal(fs: &dyn FileSystem, left: &Path, right: &Path) -> Result<bool, Error> {
    trees_match(fs, left, right, true)
}

fn trees_match(fs: &dyn FileSystem, left: &Path, right: &Path, is_root: bool) -> Result<bool, Error> {
    if !is_root && left.file_name() != right.file_name() {
        debug!("Name mismatch: {} vs {}", left.display(), right.display());
        return Ok(false);
    }

    let left_listing = fs.list_dir(left).at(left)?;
    let right_listing = fs.list_dir(right).at(right)?;

    if left_listing.directories.len() != right_listing.directories.len() {
        debug!(
            "Subdirectory count mismatch: {} has {}, {} has {}",
            left.display(),
            left_listing.directories.len(),
            right.display(),
            right_listing.directories.len()
        );
        return Ok(false);
    }

    for (l, r) in left_listing
        .directories
        .iter()
        .zip(right_listing.directories.iter())
    {
        if l.is_link || r.is_link {
            if l.is_link != r.is_link || l.name != r.name {
                debug!("Link mismatch: {} vs {}", l.path.display(), r.path.display());
                return Ok(false);
            }
            continue;
        }
        if !trees_match(fs, &l.path, &r.path, false)? {
            return Ok(false);
        }
    }

    if left_listing.files.len() != right_listing.files.len() {
        debug!(
            "File count mismatch: {} has {}, {} has {}",
            left.display(),
            left_listing.files.len(),
            right.display(),
            right_listing.files.len()
        );
        return Ok(false);
    }

    for (l, r) in left_listing.files.iter().zip(right_listing.files.iter()) {
        if !files_match(fs, l, r)? {
            debug!("File mismatch: {} vs {}", l.path.display(), r.path.display());
            return Ok(false);
        }
    }

    Ok(true)
}

fn files_match(fs: &dyn FileSystem, left: &DirItem, right: &DirItem) -> Result<bool, Error> {
    if left.name != right.name || left.len != right.len {
        return Ok(false);
    }
    Ok(content_hash(fs, &left.path)? == content_hash(fs, &right.path)?)
}

fn content_hash(fs: &dyn FileSystem, path: &Path) -> Result<blake3::Hash, Error> {
    let mut reader = fs.open_read(path).at(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = reader.read(&mut buffer).at(path)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize())
}
