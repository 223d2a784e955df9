use std::path::Path;
use tracing::debug;

use crate::error::{Error, IoResultExt};
use crate::filesystem::FileSystem;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub directories: usize,
    pub files: usize,
    pub links: usize,
    pub bytes: u64,
}

/// Recursively duplicate `source` into a newly created `dest`.
///
/// Subdirectories are copied depth-first before the files of each level.
/// Directory links inside the tree are recreated as links, never followed.
/// Nothing is rolled back on failure: whatever was copied so far stays at `dest`.
pub fn copy_tree(
    fs: &dyn FileSystem,
    source: &Path,
    dest: &Path,
    clear_read_only: bool,
) -> Result<CopyStats, Error> {
    let mut stats = CopyStats::default();
    copy_dir(fs, source, dest, clear_read_only, &mut stats)?;
    debug!(
        "Copied {} -> {}: {} directories, {} files, {} links, {} bytes",
        source.display(),
        dest.display(),
        stats.directories,
        stats.files,
        stats.links,
        stats.bytes
    );
    Ok(stats)
}

fn copy_dir(
    fs: &dyn FileSystem,
    source: &Path,
    dest: &Path,
    clear_read_only: bool,
    stats: &mut CopyStats,
) -> Result<(), Error> {
    fs.create_dir(dest).at(dest)?;
    stats.directories += 1;

    let listing = fs.list_dir(source).at(source)?;

    for directory in &listing.directories {
        let target = dest.join(&directory.name);
        if directory.is_link {
            let link_target = fs.read_link(&directory.path).at(&directory.path)?;
            fs.create_link(&target, &link_target).at(&target)?;
            stats.links += 1;
            continue;
        }
        copy_dir(fs, &directory.path, &target, clear_read_only, stats)?;
    }

    for file in &listing.files {
        let target = dest.join(&file.name);
        stats.bytes += fs.copy_file(&file.path, &target).at(&file.path)?;
        stats.files += 1;
        if clear_read_only {
            fs.set_read_only(&target, false).at(&target)?;
        }
    }

    Ok(())
}

/// Clear the read-only flag on every file below `root` so the tree can be deleted.
pub fn clear_read_only_tree(fs: &dyn FileSystem, root: &Path) -> Result<usize, Error> {
    let listing = fs.list_dir(root).at(root)?;
    let mut cleared = 0;

    for directory in listing.directories.iter().filter(|d| !d.is_link) {
        cleared += clear_read_only_tree(fs, &directory.path)?;
    }

    for file in listing.files.iter().filter(|f| !f.is_link) {
        if fs.is_read_only(&file.path).at(&file.path)? {
            fs.set_read_only(&file.path, false).at(&file.path)?;
            cleared += 1;
        }
    }

    Ok(cleared)
}
