use std::path::{Path, PathBuf};

use crate::model::RelocationStatus;
use crate::platform::path_key;

/// The operator's ignored and skipped paths. A path is in at most one of the two sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMarks {
    ignored: Vec<PathBuf>,
    skipped: Vec<PathBuf>,
}

impl PathMarks {
    pub fn new(ignored: Vec<PathBuf>, skipped: Vec<PathBuf>) -> Self {
        let mut marks = PathMarks::default();
        for path in ignored {
            marks.mark_ignored(&path);
        }
        for path in skipped {
            marks.mark_skipped(&path);
        }
        marks
    }

    pub fn ignored(&self) -> &[PathBuf] {
        &self.ignored
    }

    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        contains(&self.ignored, path)
    }

    pub fn is_skipped(&self, path: &Path) -> bool {
        contains(&self.skipped, path)
    }

    pub fn status_of(&self, path: &Path) -> Option<RelocationStatus> {
        if self.is_ignored(path) {
            Some(RelocationStatus::Ignored)
        } else if self.is_skipped(path) {
            Some(RelocationStatus::Skipped)
        } else {
            None
        }
    }

    /// Returns false if the path was already ignored.
    pub fn mark_ignored(&mut self, path: &Path) -> bool {
        remove(&mut self.skipped, path);
        if self.is_ignored(path) {
            return false;
        }
        self.ignored.push(path.to_path_buf());
        true
    }

    /// Returns false if the path was already skipped.
    pub fn mark_skipped(&mut self, path: &Path) -> bool {
        remove(&mut self.ignored, path);
        if self.is_skipped(path) {
            return false;
        }
        self.skipped.push(path.to_path_buf());
        true
    }

    /// Drop any mark on `path`, returning the one that was removed.
    pub fn unmark(&mut self, path: &Path) -> Option<RelocationStatus> {
        let previous = self.status_of(path);
        remove(&mut self.ignored, path);
        remove(&mut self.skipped, path);
        previous
    }
}

fn contains(paths: &[PathBuf], path: &Path) -> bool {
    let key = path_key(path);
    paths.iter().any(|p| path_key(p) == key)
}

fn remove(paths: &mut Vec<PathBuf>, path: &Path) {
    let key = path_key(path);
    paths.retain(|p| path_key(p) != key);
}
