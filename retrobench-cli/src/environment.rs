//! Process environment setup
//!
//! Must run on the main thread before any engine is constructed or any other
//! thread is spawned: cores read these variables when they load.

use retrobench_core::{HW_RENDER_ENV, N64_GFXPLUGIN_ENV};

/// Thread-pool variables pinned to 1 unless the operator already set them
pub const SINGLE_THREAD_HINTS: [&str; 5] = [
    "OMP_NUM_THREADS",
    "OPENBLAS_NUM_THREADS",
    "MKL_NUM_THREADS",
    "VECLIB_MAXIMUM_THREADS",
    "NUMEXPR_NUM_THREADS",
];

/// Best-effort single-thread hints. Returns the variables that were set.
pub fn apply_single_thread_hints() -> Vec<&'static str> {
    SINGLE_THREAD_HINTS
        .into_iter()
        .filter(|name| set_if_unset(name, "1"))
        .collect()
}

/// Export the engine toggles read by cores at load time.
pub fn export_engine_toggles(hw_render: bool, n64_gfxplugin: Option<&str>) {
    if hw_render {
        set(HW_RENDER_ENV, "1");
    }
    if let Some(plugin) = n64_gfxplugin {
        set(N64_GFXPLUGIN_ENV, plugin);
    }
}

fn set_if_unset(name: &str, value: &str) -> bool {
    if std::env::var_os(name).is_some() {
        return false;
    }
    set(name, value);
    true
}

fn set(name: &str, value: &str) {
    tracing::debug!("export {name}={value}");
    // SAFETY: called from the main thread during startup, before any engine
    // or helper thread exists.
    unsafe { std::env::set_var(name, value) };
}
