use crate::error::{dr_free_string, map_core_error, set_last_error};
use crate::handle::snapshot;
use crate::types::*;
use relocator_core::{ProgressReporter, SilentReporter};
use std::ffi::c_char;
use std::path::PathBuf;
use std::ptr;

/// Scan the active root and return its listing. Blocks until complete.
///
/// A scan overtaken by a newer one (for instance after `dr_select_root`)
/// returns `Superseded` and leaves `out_page` untouched.
///
/// # Safety
/// `out_page` must be a valid pointer. The returned page must be freed with `dr_free_entry_page`.
#[no_mangle]
pub unsafe extern "C" fn dr_scan_active_root(handle: u64, out_page: *mut DrEntryPage) -> DrResultCode {
    if out_page.is_null() {
        set_last_error("out_page is null".to_string());
        return DrResultCode::InvalidArgument;
    }

    let snapshot = match snapshot(handle) {
        Some(s) => s,
        None => {
            set_last_error("Invalid handle".to_string());
            return DrResultCode::InvalidHandle;
        }
    };
    let root = match snapshot.active_root {
        Some(root) => root,
        None => {
            // No root yet, return an empty page
            *out_page = DrEntryPage {
                entries: ptr::null_mut(),
                count: 0,
                generation: 0,
                total_bytes: 0,
            };
            return DrResultCode::Ok;
        }
    };

    let reporter: &dyn ProgressReporter = match snapshot.progress_bridge.as_deref() {
        Some(bridge) => bridge,
        None => &SilentReporter,
    };

    match snapshot.engine.scan_root(&root, reporter) {
        Ok(listing) => {
            let c_entries: Vec<DrEntry> = listing.entries.iter().map(DrEntry::from).collect();
            let count = c_entries.len() as u32;
            let entries = if c_entries.is_empty() {
                ptr::null_mut()
            } else {
                Box::into_raw(c_entries.into_boxed_slice()) as *mut DrEntry
            };

            *out_page = DrEntryPage {
                entries,
                count,
                generation: listing.generation,
                total_bytes: listing.total_bytes(),
            };
            DrResultCode::Ok
        }
        Err(e) => map_core_error(e),
    }
}

/// Free an entry page allocated by `dr_scan_active_root`.
///
/// # Safety
/// `page` must have been filled by `dr_scan_active_root`.
#[no_mangle]
pub unsafe extern "C" fn dr_free_entry_page(page: *mut DrEntryPage) {
    if page.is_null() {
        return;
    }
    let page = &mut *page;
    if !page.entries.is_null() && page.count > 0 {
        let slice = std::slice::from_raw_parts_mut(page.entries, page.count as usize);
        for entry in slice.iter() {
            dr_free_string(entry.path);
            dr_free_string(entry.short_name);
        }
        drop(Box::from_raw(slice as *mut [DrEntry]));
    }
    page.entries = ptr::null_mut();
    page.count = 0;
}

/// Current status of `path` under the active root, marks included.
///
/// # Safety
/// `path` must be a valid null-terminated C string and `out_status` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn dr_status_of(
    handle: u64,
    path: *const c_char,
    out_status: *mut DrStatus,
) -> DrResultCode {
    if out_status.is_null() {
        set_last_error("out_status is null".to_string());
        return DrResultCode::InvalidArgument;
    }
    let path = match c_string_to_rust(path) {
        Some(s) => PathBuf::from(s),
        None => {
            set_last_error("path is null".to_string());
            return DrResultCode::InvalidArgument;
        }
    };

    let snapshot = match snapshot(handle) {
        Some(s) => s,
        None => {
            set_last_error("Invalid handle".to_string());
            return DrResultCode::InvalidHandle;
        }
    };
    let root = match snapshot.active_root {
        Some(root) => root,
        None => {
            set_last_error("No root is configured".to_string());
            return DrResultCode::InvalidArgument;
        }
    };

    match snapshot.engine.status_of(&root, &path) {
        Ok(status) => {
            *out_status = status.into();
            DrResultCode::Ok
        }
        Err(e) => map_core_error(e),
    }
}
