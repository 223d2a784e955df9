use std::ffi::{c_char, CStr, CString};
use std::fs;
use std::path::Path;
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::{tempdir, TempDir};

use relocator_ffi::actions::*;
use relocator_ffi::error::*;
use relocator_ffi::queries::*;
use relocator_ffi::types::*;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn c_str(s: &str) -> CString {
    CString::new(s).unwrap()
}

fn c_path(path: &Path) -> CString {
    c_str(path.to_str().unwrap())
}

fn create_engine(prefs_path: &Path) -> u64 {
    let path = c_path(prefs_path);
    unsafe { dr_engine_create(path.as_ptr()) }
}

fn last_error() -> String {
    let msg = dr_last_error_message();
    let text = unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned();
    unsafe { dr_free_string(msg) };
    text
}

/// Layout:
///   original/
///     big/     3 files of 100 bytes
///     small/   one 5 byte file
///   backup/
fn create_test_tree(tmp: &TempDir) {
    let original = tmp.path().join("original");
    fs::create_dir_all(original.join("big")).unwrap();
    fs::create_dir_all(original.join("small")).unwrap();
    fs::create_dir_all(tmp.path().join("backup")).unwrap();
    for i in 0..3 {
        fs::write(original.join("big").join(format!("{}.bin", i)), vec![1u8; 100]).unwrap();
    }
    fs::write(original.join("small").join("note.txt"), "hello").unwrap();
}

fn add_root(handle: u64, tmp: &TempDir) -> DrResultCode {
    let name = c_str("Test");
    let original = c_path(&tmp.path().join("original"));
    let backup = c_path(&tmp.path().join("backup"));
    unsafe { dr_add_root(handle, name.as_ptr(), original.as_ptr(), backup.as_ptr()) }
}

fn empty_page() -> DrEntryPage {
    DrEntryPage {
        entries: ptr::null_mut(),
        count: 0,
        generation: 0,
        total_bytes: 0,
    }
}

fn entry_names(page: &DrEntryPage) -> Vec<String> {
    let entries = unsafe { std::slice::from_raw_parts(page.entries, page.count as usize) };
    entries
        .iter()
        .map(|e| unsafe { CStr::from_ptr(e.short_name) }.to_string_lossy().into_owned())
        .collect()
}

// ── Handle lifecycle ─────────────────────────────────────────────────────────

#[test]
fn test_handle_create_and_destroy() {
    let dir = tempdir().unwrap();
    let handle = create_engine(&dir.path().join("prefs.toml"));
    assert_ne!(handle, 0, "handle should be non-zero");
    assert_eq!(dr_engine_destroy(handle), DrResultCode::Ok);
}

#[test]
fn test_destroy_invalid_handle() {
    assert_eq!(dr_engine_destroy(999999), DrResultCode::InvalidHandle);
    assert_eq!(last_error(), "Invalid handle");
}

#[test]
fn test_double_destroy() {
    let dir = tempdir().unwrap();
    let handle = create_engine(&dir.path().join("prefs.toml"));
    assert_eq!(dr_engine_destroy(handle), DrResultCode::Ok);
    assert_eq!(dr_engine_destroy(handle), DrResultCode::InvalidHandle);
}

#[test]
fn test_create_with_null_path_keeps_preferences_in_memory() {
    let handle = unsafe { dr_engine_create(ptr::null()) };
    assert_ne!(handle, 0);
    let mut page = empty_page();
    assert_eq!(unsafe { dr_scan_active_root(handle, &mut page) }, DrResultCode::Ok);
    assert_eq!(page.count, 0);
    dr_engine_destroy(handle);
}

#[test]
fn test_create_with_malformed_preferences_fails() {
    let dir = tempdir().unwrap();
    let prefs = dir.path().join("prefs.toml");
    fs::write(&prefs, "[[roots]\nname =").unwrap();
    assert_eq!(create_engine(&prefs), 0);
    assert!(last_error().contains("preferences"));
}

// ── Roots ────────────────────────────────────────────────────────────────────

#[test]
fn test_add_and_select_roots_persist() {
    let tmp = tempdir().unwrap();
    create_test_tree(&tmp);
    let prefs = tmp.path().join("prefs.toml");
    let handle = create_engine(&prefs);

    assert_eq!(add_root(handle, &tmp), DrResultCode::Ok);
    // same original path again is a conflict
    assert_eq!(add_root(handle, &tmp), DrResultCode::Conflict);

    let name = c_str("Other");
    let original = c_path(&tmp.path().join("other"));
    let backup = c_path(&tmp.path().join("other_backup"));
    assert_eq!(
        unsafe { dr_add_root(handle, name.as_ptr(), original.as_ptr(), backup.as_ptr()) },
        DrResultCode::Ok
    );

    let test = c_str("Test");
    assert_eq!(unsafe { dr_select_root(handle, test.as_ptr()) }, DrResultCode::Ok);
    let missing = c_str("Missing");
    assert_eq!(
        unsafe { dr_select_root(handle, missing.as_ptr()) },
        DrResultCode::InvalidArgument
    );
    dr_engine_destroy(handle);

    let text = fs::read_to_string(&prefs).unwrap();
    assert!(text.contains("name = \"Test\""));
    assert!(text.contains("name = \"Other\""));
}

#[test]
fn test_add_root_with_null_argument() {
    let dir = tempdir().unwrap();
    let handle = create_engine(&dir.path().join("prefs.toml"));
    let name = c_str("Test");
    let result = unsafe { dr_add_root(handle, name.as_ptr(), ptr::null(), ptr::null()) };
    assert_eq!(result, DrResultCode::InvalidArgument);
    dr_engine_destroy(handle);
}

#[test]
fn test_add_root_nested_paths_rejected() {
    let dir = tempdir().unwrap();
    let handle = create_engine(&dir.path().join("prefs.toml"));
    let name = c_str("Nested");
    let original = c_path(&dir.path().join("data"));
    let backup = c_path(&dir.path().join("data").join("backup"));
    let result = unsafe { dr_add_root(handle, name.as_ptr(), original.as_ptr(), backup.as_ptr()) };
    assert_eq!(result, DrResultCode::InvalidArgument);
    dr_engine_destroy(handle);
}

// ── Scanning ─────────────────────────────────────────────────────────────────

#[test]
fn test_scan_returns_sorted_page() {
    let tmp = tempdir().unwrap();
    create_test_tree(&tmp);
    let handle = create_engine(&tmp.path().join("prefs.toml"));
    add_root(handle, &tmp);

    let mut page = empty_page();
    assert_eq!(unsafe { dr_scan_active_root(handle, &mut page) }, DrResultCode::Ok);
    assert_eq!(page.count, 2);
    assert_eq!(page.total_bytes, 305);
    assert_eq!(entry_names(&page), vec!["big", "small"]);

    let entries = unsafe { std::slice::from_raw_parts(page.entries, page.count as usize) };
    assert_eq!(entries[0].size_bytes, 300);
    assert_eq!(entries[0].status, DrStatus::Plain);
    assert!(!entries[0].is_busy);

    unsafe { dr_free_entry_page(&mut page) };
    assert!(page.entries.is_null());
    dr_engine_destroy(handle);
}

#[test]
fn test_scan_null_out_page() {
    let dir = tempdir().unwrap();
    let handle = create_engine(&dir.path().join("prefs.toml"));
    assert_eq!(
        unsafe { dr_scan_active_root(handle, ptr::null_mut()) },
        DrResultCode::InvalidArgument
    );
    dr_engine_destroy(handle);
}

#[test]
fn test_marks_hide_entries_and_persist() {
    let tmp = tempdir().unwrap();
    create_test_tree(&tmp);
    let prefs = tmp.path().join("prefs.toml");
    let handle = create_engine(&prefs);
    add_root(handle, &tmp);

    let small = tmp.path().join("original").join("small");
    let small_c = c_path(&small);
    assert_eq!(unsafe { dr_mark_ignored(handle, small_c.as_ptr()) }, DrResultCode::Ok);

    let mut status = DrStatus::Plain;
    assert_eq!(
        unsafe { dr_status_of(handle, small_c.as_ptr(), &mut status) },
        DrResultCode::Ok
    );
    assert_eq!(status, DrStatus::Ignored);

    let mut page = empty_page();
    unsafe { dr_scan_active_root(handle, &mut page) };
    assert_eq!(entry_names(&page), vec!["big"]);
    unsafe { dr_free_entry_page(&mut page) };
    dr_engine_destroy(handle);

    // a fresh handle over the same preferences sees the mark
    let handle = create_engine(&prefs);
    let mut status = DrStatus::Plain;
    unsafe { dr_status_of(handle, small_c.as_ptr(), &mut status) };
    assert_eq!(status, DrStatus::Ignored);

    assert_eq!(unsafe { dr_mark_skipped(handle, small_c.as_ptr()) }, DrResultCode::Ok);
    unsafe { dr_status_of(handle, small_c.as_ptr(), &mut status) };
    assert_eq!(status, DrStatus::Skipped);

    assert_eq!(unsafe { dr_unmark(handle, small_c.as_ptr()) }, DrResultCode::Ok);
    unsafe { dr_status_of(handle, small_c.as_ptr(), &mut status) };
    assert_eq!(status, DrStatus::Plain);
    dr_engine_destroy(handle);
}

// ── Relocation ───────────────────────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn test_create_and_remove_junction() {
    let tmp = tempdir().unwrap();
    create_test_tree(&tmp);
    let handle = create_engine(&tmp.path().join("prefs.toml"));
    add_root(handle, &tmp);

    let big = tmp.path().join("original").join("big");
    let big_c = c_path(&big);

    let mut status = DrStatus::Plain;
    assert_eq!(
        unsafe { dr_create_junction(handle, big_c.as_ptr(), &mut status) },
        DrResultCode::Ok
    );
    assert_eq!(status, DrStatus::JunctionAvailable);
    assert!(tmp.path().join("backup").join("big").join("0.bin").exists());

    // the backup is live behind the junction
    assert_eq!(
        unsafe { dr_remove_backup(handle, big_c.as_ptr(), ptr::null_mut()) },
        DrResultCode::Conflict
    );

    assert_eq!(
        unsafe { dr_remove_junction(handle, big_c.as_ptr(), &mut status) },
        DrResultCode::Ok
    );
    assert_eq!(status, DrStatus::Plain);
    assert_eq!(fs::read(big.join("2.bin")).unwrap(), vec![1u8; 100]);
    dr_engine_destroy(handle);
}

#[test]
fn test_create_junction_onto_existing_backup() {
    let tmp = tempdir().unwrap();
    create_test_tree(&tmp);
    fs::create_dir_all(tmp.path().join("backup").join("small")).unwrap();
    let handle = create_engine(&tmp.path().join("prefs.toml"));
    add_root(handle, &tmp);

    let small = c_path(&tmp.path().join("original").join("small"));
    let result = unsafe { dr_create_junction(handle, small.as_ptr(), ptr::null_mut()) };
    assert_eq!(result, DrResultCode::Conflict);
    assert!(last_error().contains("already exists"));

    let mut status = DrStatus::Plain;
    assert_eq!(
        unsafe { dr_remove_backup(handle, small.as_ptr(), &mut status) },
        DrResultCode::Ok
    );
    assert_eq!(status, DrStatus::Plain);
    dr_engine_destroy(handle);
}

#[test]
fn test_relocation_without_root() {
    let dir = tempdir().unwrap();
    let handle = create_engine(&dir.path().join("prefs.toml"));
    let path = c_path(dir.path());
    assert_eq!(
        unsafe { dr_create_junction(handle, path.as_ptr(), ptr::null_mut()) },
        DrResultCode::InvalidArgument
    );
    assert_eq!(
        unsafe { dr_create_junction(424242, path.as_ptr(), ptr::null_mut()) },
        DrResultCode::InvalidHandle
    );
    dr_engine_destroy(handle);
}

// ── Progress callback ────────────────────────────────────────────────────────

static SCAN_EVENTS: AtomicU32 = AtomicU32::new(0);

extern "C" fn count_scan_events(phase: u32, _current: u64, _total: u64, _message: *const c_char) {
    if phase == 0 {
        SCAN_EVENTS.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_progress_callback_fires_during_scan() {
    let tmp = tempdir().unwrap();
    create_test_tree(&tmp);
    let handle = create_engine(&tmp.path().join("prefs.toml"));
    add_root(handle, &tmp);

    assert_eq!(
        dr_set_progress_callback(handle, count_scan_events),
        DrResultCode::Ok
    );
    let mut page = empty_page();
    unsafe { dr_scan_active_root(handle, &mut page) };
    unsafe { dr_free_entry_page(&mut page) };

    // start, one per entry, complete
    assert!(SCAN_EVENTS.load(Ordering::SeqCst) >= 4);

    assert_eq!(dr_clear_progress_callback(handle), DrResultCode::Ok);
    dr_engine_destroy(handle);
}
