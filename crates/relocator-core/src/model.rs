use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::platform::path_key;

/// A configured (original, backup) root pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryLinkRoot {
    pub name: String,
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
}

impl DirectoryLinkRoot {
    pub fn new(
        name: impl Into<String>,
        original_path: impl Into<PathBuf>,
        backup_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            original_path: original_path.into(),
            backup_path: backup_path.into(),
        }
    }

    /// Roots are identified by their original path.
    pub fn is_same_root(&self, original_path: &Path) -> bool {
        path_key(&self.original_path) == path_key(original_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelocationStatus {
    Plain,
    BackupAvailable,
    JunctionAvailable,
    Ignored,
    Skipped,
}

impl RelocationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RelocationStatus::Plain => "No backup available",
            RelocationStatus::BackupAvailable => "Backup available",
            RelocationStatus::JunctionAvailable => "Linked to backup",
            RelocationStatus::Ignored => "Ignored",
            RelocationStatus::Skipped => "Skipped",
        }
    }

    pub fn is_mark(&self) -> bool {
        matches!(self, RelocationStatus::Ignored | RelocationStatus::Skipped)
    }
}

impl fmt::Display for RelocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One listed directory under the active root.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub path: PathBuf,
    pub short_name: String,
    pub size_bytes: u64,
    pub last_accessed: DateTime<Utc>,
    pub status: RelocationStatus,
    pub is_busy: bool,
}

impl DirectoryEntry {
    /// An entry with the degraded defaults used when a directory cannot be measured.
    pub fn unmeasured(path: PathBuf) -> Self {
        let short_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path,
            short_name,
            size_bytes: 0,
            last_accessed: Utc::now(),
            status: RelocationStatus::Plain,
            is_busy: false,
        }
    }
}

/// Entries are equal when their paths match ignoring case, on every host.
/// Marks are keyed by [`crate::platform::path_key`] instead, which keeps case
/// on case-sensitive filesystems, so two equal entries may still carry
/// separate marks there.
impl PartialEq for DirectoryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path.to_string_lossy().to_lowercase() == other.path.to_string_lossy().to_lowercase()
    }
}

impl Eq for DirectoryEntry {}

/// The published result of one scan generation.
#[derive(Debug, Clone)]
pub struct Listing {
    pub generation: u64,
    pub root: DirectoryLinkRoot,
    pub entries: Vec<DirectoryEntry>,
}

impl Listing {
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size_bytes).sum()
    }
}

const KILOBYTE: u64 = 1024;
const MEGABYTE: u64 = KILOBYTE * KILOBYTE;
const GIGABYTE: u64 = MEGABYTE * KILOBYTE;
const TERABYTE: u64 = GIGABYTE * KILOBYTE;

/// Human readable size, e.g. `1536` → `1.5KB`.
pub fn format_size(bytes: u64) -> String {
    let (unit, suffix) = match bytes {
        b if b < KILOBYTE => return format!("{}B", b),
        b if b < MEGABYTE => (KILOBYTE, "KB"),
        b if b < GIGABYTE => (MEGABYTE, "MB"),
        b if b < TERABYTE => (GIGABYTE, "GB"),
        _ => (TERABYTE, "TB"),
    };
    let value = format!("{:.2}", bytes as f64 / unit as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", value, suffix)
}
