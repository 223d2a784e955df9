use relocator_core::{DirectoryEntry, RelocationStatus};
use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Result codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrResultCode {
    Ok = 0,
    InvalidHandle = 1,
    InvalidArgument = 2,
    IoError = 3,
    NotFound = 4,
    Conflict = 5,
    Busy = 6,
    AccessDenied = 7,
    StructuralMismatch = 8,
    Superseded = 9,
    PreferencesError = 10,
    InternalError = 99,
}

/// Relocation status of a directory.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrStatus {
    Plain = 0,
    BackupAvailable = 1,
    JunctionAvailable = 2,
    Ignored = 3,
    Skipped = 4,
}

impl From<RelocationStatus> for DrStatus {
    fn from(status: RelocationStatus) -> Self {
        match status {
            RelocationStatus::Plain => DrStatus::Plain,
            RelocationStatus::BackupAvailable => DrStatus::BackupAvailable,
            RelocationStatus::JunctionAvailable => DrStatus::JunctionAvailable,
            RelocationStatus::Ignored => DrStatus::Ignored,
            RelocationStatus::Skipped => DrStatus::Skipped,
        }
    }
}

/// The listing of the active root, largest directory first.
#[repr(C)]
pub struct DrEntryPage {
    pub entries: *mut DrEntry,
    pub count: u32,
    pub generation: u64,
    pub total_bytes: u64,
}

/// A single listed directory.
#[repr(C)]
pub struct DrEntry {
    pub path: *mut c_char,
    pub short_name: *mut c_char,
    pub size_bytes: u64,
    /// Seconds since the Unix epoch.
    pub last_accessed: i64,
    pub status: DrStatus,
    pub is_busy: bool,
}

impl From<&DirectoryEntry> for DrEntry {
    fn from(entry: &DirectoryEntry) -> Self {
        DrEntry {
            path: rust_string_to_c(&entry.path.to_string_lossy()),
            short_name: rust_string_to_c(&entry.short_name),
            size_bytes: entry.size_bytes,
            last_accessed: entry.last_accessed.timestamp(),
            status: entry.status.into(),
            is_busy: entry.is_busy,
        }
    }
}

/// Progress callback signature.
pub type DrProgressCallback = extern "C" fn(
    phase: u32, // 0=scan, 1=create_junction, 2=remove_junction, 3=remove_backup
    current: u64,
    total: u64,
    message: *const c_char,
);

/// Helper to convert a Rust string to a C string on the heap.
pub fn rust_string_to_c(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|cs| cs.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Helper to convert a C string to a Rust string.
///
/// # Safety
/// The caller must ensure `ptr` is a valid null-terminated C string.
pub unsafe fn c_string_to_rust(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}
