use crate::callbacks::FfiProgressBridge;
use crate::error::{map_core_error, set_last_error};
use crate::handle::{allocate_handle, destroy_handle, snapshot, with_handle, EngineState};
use crate::types::*;
use relocator_core::{
    AppConfig, DirectoryLinkRoot, Error, Preferences, ProgressReporter, RelocationEngine,
    RelocationStatus, SilentReporter,
};
use std::ffi::c_char;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Create a new engine instance. Returns a handle (u64) or 0 on failure.
///
/// Preferences are read from and saved to `prefs_path`; a null path keeps
/// them in memory for the lifetime of the handle.
///
/// # Safety
/// `prefs_path` must be null or a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn dr_engine_create(prefs_path: *const c_char) -> u64 {
    let config = relocator_core::config::load_configuration().unwrap_or_else(|e| {
        warn!("Using default configuration: {}", e);
        AppConfig::default()
    });

    let prefs_path = c_string_to_rust(prefs_path).map(PathBuf::from);
    let prefs = match &prefs_path {
        Some(path) => match Preferences::load(path) {
            Ok(prefs) => prefs,
            Err(e) => {
                set_last_error(format!("Failed to load preferences: {}", e));
                return 0;
            }
        },
        None => Preferences::default(),
    };

    let engine = match RelocationEngine::new(&config) {
        Ok(engine) => engine.with_marks(prefs.marks.clone()),
        Err(e) => {
            set_last_error(format!("Failed to create engine: {}", e));
            return 0;
        }
    };

    allocate_handle(EngineState {
        engine: Arc::new(engine),
        prefs,
        prefs_path,
        progress_bridge: None,
    })
}

/// Destroy an engine instance and free its resources.
#[no_mangle]
pub extern "C" fn dr_engine_destroy(handle: u64) -> DrResultCode {
    if destroy_handle(handle) {
        DrResultCode::Ok
    } else {
        set_last_error("Invalid handle".to_string());
        DrResultCode::InvalidHandle
    }
}

fn save_prefs(state: &EngineState) -> DrResultCode {
    match &state.prefs_path {
        Some(path) => match state.prefs.save(path) {
            Ok(()) => DrResultCode::Ok,
            Err(e) => map_core_error(e),
        },
        None => DrResultCode::Ok,
    }
}

/// Add a root pair and make it the active one.
///
/// # Safety
/// All string arguments must be valid null-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn dr_add_root(
    handle: u64,
    name: *const c_char,
    original_path: *const c_char,
    backup_path: *const c_char,
) -> DrResultCode {
    let (name, original, backup) = match (
        c_string_to_rust(name),
        c_string_to_rust(original_path),
        c_string_to_rust(backup_path),
    ) {
        (Some(n), Some(o), Some(b)) => (n, o, b),
        _ => {
            set_last_error("name, original_path and backup_path are required".to_string());
            return DrResultCode::InvalidArgument;
        }
    };

    let result = with_handle(handle, |state| {
        let mut draft = state.prefs.roots.begin_new();
        draft.name = name;
        draft.original_path = PathBuf::from(original);
        draft.backup_path = PathBuf::from(backup);
        if let Err(e) = state.prefs.roots.commit(draft) {
            return map_core_error(e);
        }
        state.engine.invalidate();
        save_prefs(state)
    });

    result.unwrap_or(DrResultCode::InvalidHandle)
}

/// Make a root pair active, by name or original path.
///
/// # Safety
/// `root` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn dr_select_root(handle: u64, root: *const c_char) -> DrResultCode {
    let root = match c_string_to_rust(root) {
        Some(s) => s,
        None => {
            set_last_error("root is null".to_string());
            return DrResultCode::InvalidArgument;
        }
    };

    let result = with_handle(handle, |state| {
        if let Err(e) = state.prefs.roots.select(&root) {
            return map_core_error(e);
        }
        state.engine.invalidate();
        save_prefs(state)
    });

    result.unwrap_or(DrResultCode::InvalidHandle)
}

/// Set a progress callback for scans and relocations.
#[no_mangle]
pub extern "C" fn dr_set_progress_callback(
    handle: u64,
    callback: DrProgressCallback,
) -> DrResultCode {
    let result = with_handle(handle, |state| {
        state.progress_bridge = Some(Arc::new(FfiProgressBridge::new(callback)));
        DrResultCode::Ok
    });

    result.unwrap_or(DrResultCode::InvalidHandle)
}

/// Clear the progress callback.
#[no_mangle]
pub extern "C" fn dr_clear_progress_callback(handle: u64) -> DrResultCode {
    let result = with_handle(handle, |state| {
        state.progress_bridge = None;
        DrResultCode::Ok
    });

    result.unwrap_or(DrResultCode::InvalidHandle)
}

/// Run a relocation step on `path` under the active root, writing the
/// resulting status to `out_status`.
unsafe fn run_relocation<F>(
    handle: u64,
    path: *const c_char,
    out_status: *mut DrStatus,
    op: F,
) -> DrResultCode
where
    F: FnOnce(
        &RelocationEngine,
        &DirectoryLinkRoot,
        &Path,
        &dyn ProgressReporter,
    ) -> Result<RelocationStatus, Error>,
{
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

    let reporter: &dyn ProgressReporter = match snapshot.progress_bridge.as_deref() {
        Some(bridge) => bridge,
        None => &SilentReporter,
    };
    let outcome = op(snapshot.engine.as_ref(), &root, path.as_path(), reporter);

    match outcome {
        Ok(status) => {
            if !out_status.is_null() {
                *out_status = status.into();
            }
            DrResultCode::Ok
        }
        Err(e) => map_core_error(e),
    }
}

/// Move `path` to the backup location and leave a junction in its place.
///
/// # Safety
/// `path` must be a valid null-terminated C string; `out_status` may be null.
#[no_mangle]
pub unsafe extern "C" fn dr_create_junction(
    handle: u64,
    path: *const c_char,
    out_status: *mut DrStatus,
) -> DrResultCode {
    run_relocation(handle, path, out_status, |engine, root, path, reporter| {
        engine.create_junction(root, path, reporter)
    })
}

/// Replace the junction at `path` with its backed-up contents.
///
/// # Safety
/// `path` must be a valid null-terminated C string; `out_status` may be null.
#[no_mangle]
pub unsafe extern "C" fn dr_remove_junction(
    handle: u64,
    path: *const c_char,
    out_status: *mut DrStatus,
) -> DrResultCode {
    run_relocation(handle, path, out_status, |engine, root, path, reporter| {
        engine.remove_junction(root, path, reporter)
    })
}

/// Delete the stray backup of a directory that is not relocated.
///
/// # Safety
/// `path` must be a valid null-terminated C string; `out_status` may be null.
#[no_mangle]
pub unsafe extern "C" fn dr_remove_backup(
    handle: u64,
    path: *const c_char,
    out_status: *mut DrStatus,
) -> DrResultCode {
    run_relocation(handle, path, out_status, |engine, root, path, reporter| {
        engine.remove_backup(root, path, reporter)
    })
}

unsafe fn update_marks<F>(handle: u64, path: *const c_char, op: F) -> DrResultCode
where
    F: FnOnce(&RelocationEngine, &Path),
{
    let path = match c_string_to_rust(path) {
        Some(s) => PathBuf::from(s),
        None => {
            set_last_error("path is null".to_string());
            return DrResultCode::InvalidArgument;
        }
    };

    let result = with_handle(handle, |state| {
        op(state.engine.as_ref(), path.as_path());
        state.prefs.marks = state.engine.marks();
        save_prefs(state)
    });

    result.unwrap_or(DrResultCode::InvalidHandle)
}

/// Hide a directory from listings.
///
/// # Safety
/// `path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn dr_mark_ignored(handle: u64, path: *const c_char) -> DrResultCode {
    update_marks(handle, path, |engine, path| {
        engine.mark_ignored(path);
    })
}

/// List the children of a directory in its place.
///
/// # Safety
/// `path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn dr_mark_skipped(handle: u64, path: *const c_char) -> DrResultCode {
    update_marks(handle, path, |engine, path| {
        engine.mark_skipped(path);
    })
}

/// Clear an ignore or skip mark.
///
/// # Safety
/// `path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn dr_unmark(handle: u64, path: *const c_char) -> DrResultCode {
    update_marks(handle, path, |engine, path| {
        engine.unmark(path);
    })
}
