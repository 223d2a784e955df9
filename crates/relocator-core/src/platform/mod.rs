#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(unix)]
pub mod unix;

use std::ffi::OsString;
use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};

#[cfg(target_os = "windows")]
pub fn get_drive_letter(path: &Path) -> Option<OsString> {
    windows::get_drive_letter(path)
}

#[cfg(not(target_os = "windows"))]
pub fn get_drive_letter(_path: &Path) -> Option<OsString> {
    None
}

/// Whether the filesystem treats path names case-insensitively.
pub const CASE_INSENSITIVE_PATHS: bool = cfg!(target_os = "windows");

/// Comparison key for a path: trailing separators and `.` components dropped,
/// lowercased where the filesystem ignores case.
pub fn path_key(path: &Path) -> String {
    let normalized: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let key = normalized.to_string_lossy().into_owned();
    if CASE_INSENSITIVE_PATHS {
        key.to_lowercase()
    } else {
        key
    }
}

/// Component-wise equality following the host's case convention.
pub fn components_equal(left: Component<'_>, right: Component<'_>) -> bool {
    if CASE_INSENSITIVE_PATHS {
        left.as_os_str().to_string_lossy().to_lowercase()
            == right.as_os_str().to_string_lossy().to_lowercase()
    } else {
        left == right
    }
}

/// Whether metadata obtained without following links describes a link or reparse point.
#[cfg(target_os = "windows")]
pub fn is_link_metadata(metadata: &Metadata) -> bool {
    windows::is_reparse_point(metadata)
}

#[cfg(not(target_os = "windows"))]
pub fn is_link_metadata(metadata: &Metadata) -> bool {
    metadata.file_type().is_symlink()
}

#[cfg(target_os = "windows")]
pub fn create_directory_link(link: &Path, target: &Path) -> io::Result<()> {
    windows::create_junction(link, target)
}

#[cfg(unix)]
pub fn create_directory_link(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(any(unix, target_os = "windows")))]
pub fn create_directory_link(_link: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "directory links are not supported on this platform",
    ))
}

/// Remove a link without touching the directory it points at.
#[cfg(target_os = "windows")]
pub fn remove_directory_link(link: &Path) -> io::Result<()> {
    std::fs::remove_dir(link)
}

#[cfg(not(target_os = "windows"))]
pub fn remove_directory_link(link: &Path) -> io::Result<()> {
    std::fs::remove_file(link)
}

#[cfg(target_os = "windows")]
pub fn same_volume(left: &Path, right: &Path) -> bool {
    match (get_drive_letter(left), get_drive_letter(right)) {
        (Some(l), Some(r)) => l.to_string_lossy().eq_ignore_ascii_case(&r.to_string_lossy()),
        _ => false,
    }
}

#[cfg(unix)]
pub fn same_volume(left: &Path, right: &Path) -> bool {
    match (unix::device_id(left), unix::device_id(right)) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

#[cfg(not(any(unix, target_os = "windows")))]
pub fn same_volume(_left: &Path, _right: &Path) -> bool {
    false
}

#[cfg(unix)]
pub fn set_read_only(path: &Path, read_only: bool) -> io::Result<()> {
    unix::set_read_only(path, read_only)
}

#[cfg(not(unix))]
pub fn set_read_only(path: &Path, read_only: bool) -> io::Result<()> {
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_readonly(read_only);
    std::fs::set_permissions(path, permissions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_key_ignores_trailing_separator() {
        assert_eq!(path_key(Path::new("/data/games/")), path_key(Path::new("/data/games")));
        assert_eq!(path_key(Path::new("/data/./games")), path_key(Path::new("/data/games")));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_key_is_case_sensitive_on_unix() {
        assert_ne!(path_key(Path::new("/Data")), path_key(Path::new("/data")));
    }
}
