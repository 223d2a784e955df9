use std::path::Path;

use crate::model::RelocationStatus;

/// Which relocation step a progress notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationAction {
    CreateJunction,
    RemoveJunction,
    RemoveBackup,
}

/// Trait for reporting scan and relocation progress.
///
/// CLI implements with indicatif, FFI implements with C function pointer callbacks.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &Path) {}
    fn on_scan_progress(&self, _measured: usize, _total: usize) {}
    fn on_scan_complete(&self, _entries: usize, _duration_secs: f64) {}
    fn on_relocate_start(&self, _path: &Path, _action: RelocationAction) {}
    fn on_relocate_complete(&self, _path: &Path, _action: RelocationAction, _status: RelocationStatus) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
