use crate::types::{rust_string_to_c, DrResultCode};
use relocator_core::Error;
use std::cell::RefCell;
use std::ffi::c_char;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = RefCell::new(None);
}

pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some(msg);
    });
}

pub fn map_core_error(e: Error) -> DrResultCode {
    set_last_error(e.to_string());
    match e {
        Error::NotFound(_) => DrResultCode::NotFound,
        Error::Conflict(_) => DrResultCode::Conflict,
        Error::Busy(_) => DrResultCode::Busy,
        Error::AccessDenied(_) => DrResultCode::AccessDenied,
        Error::StructuralMismatch { .. } => DrResultCode::StructuralMismatch,
        Error::InvalidArgument(_) => DrResultCode::InvalidArgument,
        Error::Superseded { .. } => DrResultCode::Superseded,
        Error::Io(_) => DrResultCode::IoError,
        Error::Config(_) | Error::Preferences(_) => DrResultCode::PreferencesError,
    }
}

/// Get the last error message. Returns a C string that must be freed with `dr_free_string`.
#[no_mangle]
pub extern "C" fn dr_last_error_message() -> *mut c_char {
    LAST_ERROR.with(|e| {
        let msg = e.borrow();
        match msg.as_ref() {
            Some(s) => rust_string_to_c(s),
            None => rust_string_to_c(""),
        }
    })
}

/// Free a string allocated by the FFI layer.
///
/// # Safety
/// `ptr` must have been allocated by this library (e.g., from `dr_last_error_message`).
#[no_mangle]
pub unsafe extern "C" fn dr_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(std::ffi::CString::from_raw(ptr));
    }
}
