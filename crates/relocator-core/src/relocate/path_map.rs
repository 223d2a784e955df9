use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::platform::components_equal;

/// Map a directory below `root_original` to the same relative location below `root_backup`.
pub fn map_to_backup(
    original: &Path,
    root_original: &Path,
    root_backup: &Path,
) -> Result<PathBuf, Error> {
    let suffix = relative_below(original, root_original).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "{} is not below {}",
            original.display(),
            root_original.display()
        ))
    })?;
    Ok(root_backup.join(suffix))
}

/// Inverse of [`map_to_backup`].
pub fn map_to_original(
    backup: &Path,
    root_original: &Path,
    root_backup: &Path,
) -> Result<PathBuf, Error> {
    let suffix = relative_below(backup, root_backup).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "{} is not below {}",
            backup.display(),
            root_backup.display()
        ))
    })?;
    Ok(root_original.join(suffix))
}

/// The components of `path` after `root`, or `None` unless `path` lies strictly below `root`.
fn relative_below(path: &Path, root: &Path) -> Option<PathBuf> {
    let mut remaining = path.components();
    for root_component in root.components() {
        match remaining.next() {
            Some(component) if components_equal(component, root_component) => {}
            _ => return None,
        }
    }

    let suffix: PathBuf = remaining.collect();
    if suffix.as_os_str().is_empty() {
        None
    } else {
        Some(suffix)
    }
}
