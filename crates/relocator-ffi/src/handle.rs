use relocator_core::{DirectoryLinkRoot, Preferences, RelocationEngine};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::callbacks::FfiProgressBridge;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

pub struct EngineState {
    pub engine: Arc<RelocationEngine>,
    pub prefs: Preferences,
    /// Where preferences are persisted; `None` keeps them in memory only.
    pub prefs_path: Option<PathBuf>,
    pub progress_bridge: Option<Arc<FfiProgressBridge>>,
}

/// What a long-running call needs, taken out of the handle table so the
/// table lock is not held while the filesystem work runs.
pub struct EngineSnapshot {
    pub engine: Arc<RelocationEngine>,
    pub active_root: Option<DirectoryLinkRoot>,
    pub progress_bridge: Option<Arc<FfiProgressBridge>>,
}

lazy_static! {
    static ref HANDLES: Mutex<HashMap<u64, Box<EngineState>>> = Mutex::new(HashMap::new());
}

fn handles() -> MutexGuard<'static, HashMap<u64, Box<EngineState>>> {
    HANDLES.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn allocate_handle(state: EngineState) -> u64 {
    let handle = NEXT_HANDLE.fetch_add(1, Ordering::SeqCst);
    handles().insert(handle, Box::new(state));
    handle
}

pub fn with_handle<F, R>(handle: u64, f: F) -> Option<R>
where
    F: FnOnce(&mut EngineState) -> R,
{
    handles().get_mut(&handle).map(|state| f(state))
}

pub fn snapshot(handle: u64) -> Option<EngineSnapshot> {
    with_handle(handle, |state| EngineSnapshot {
        engine: Arc::clone(&state.engine),
        active_root: state.prefs.roots.active().cloned(),
        progress_bridge: state.progress_bridge.clone(),
    })
}

pub fn destroy_handle(handle: u64) -> bool {
    handles().remove(&handle).is_some()
}
