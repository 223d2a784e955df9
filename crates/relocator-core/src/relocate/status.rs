use std::path::Path;

use crate::error::{Error, IoResultExt};
use crate::filesystem::FileSystem;
use crate::model::{DirectoryLinkRoot, RelocationStatus};
use crate::relocate::path_map::map_to_backup;

/// Report whether `path` is a junction, has a stray backup, or is a plain directory.
pub fn classify(
    fs: &dyn FileSystem,
    path: &Path,
    root: &DirectoryLinkRoot,
) -> Result<RelocationStatus, Error> {
    if !fs.exists(path) {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    if fs.is_link(path).at(path)? {
        return Ok(RelocationStatus::JunctionAvailable);
    }

    let backup = map_to_backup(path, &root.original_path, &root.backup_path)?;
    if fs.is_dir(&backup) {
        Ok(RelocationStatus::BackupAvailable)
    } else {
        Ok(RelocationStatus::Plain)
    }
}
