use crate::types::DrProgressCallback;
use relocator_core::{ProgressReporter, RelocationAction, RelocationStatus};
use std::ffi::CString;
use std::path::Path;

/// FFI progress bridge that implements ProgressReporter by forwarding to a C callback.
pub struct FfiProgressBridge {
    callback: DrProgressCallback,
}

// Safety: The C callback function pointer is a static function that is safe to call from any thread.
unsafe impl Send for FfiProgressBridge {}
unsafe impl Sync for FfiProgressBridge {}

impl FfiProgressBridge {
    pub fn new(callback: DrProgressCallback) -> Self {
        Self { callback }
    }

    fn fire(&self, phase: u32, current: u64, total: u64, message: &str) {
        let c_msg = CString::new(message).unwrap_or_default();
        (self.callback)(phase, current, total, c_msg.as_ptr());
    }
}

fn phase_of(action: RelocationAction) -> u32 {
    match action {
        RelocationAction::CreateJunction => 1,
        RelocationAction::RemoveJunction => 2,
        RelocationAction::RemoveBackup => 3,
    }
}

impl ProgressReporter for FfiProgressBridge {
    fn on_scan_start(&self, root: &Path) {
        self.fire(0, 0, 0, &root.to_string_lossy());
    }

    fn on_scan_progress(&self, measured: usize, total: usize) {
        self.fire(0, measured as u64, total as u64, "");
    }

    fn on_scan_complete(&self, entries: usize, _duration_secs: f64) {
        self.fire(0, entries as u64, entries as u64, "scan_complete");
    }

    fn on_relocate_start(&self, path: &Path, action: RelocationAction) {
        self.fire(phase_of(action), 0, 1, &path.to_string_lossy());
    }

    fn on_relocate_complete(&self, _path: &Path, action: RelocationAction, status: RelocationStatus) {
        self.fire(phase_of(action), 1, 1, status.label());
    }
}
