//! Ctrl-C handling
//!
//! The first SIGINT only raises a flag; the runner checks it between entries
//! and reports partial results. The handler resets itself to the default
//! action, so a second Ctrl-C terminates the process immediately.

use std::sync::atomic::{AtomicBool, Ordering};

/// Set by the SIGINT handler.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Install the one-shot SIGINT handler and return the flag it sets.
/// The handler is async-signal-safe (only sets an atomic).
#[cfg(unix)]
pub fn install() -> &'static AtomicBool {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigint_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART | libc::SA_RESETHAND;
        libc::sigemptyset(&mut sa.sa_mask);
        if libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut()) != 0 {
            tracing::warn!(
                "failed to install Ctrl-C handler: {}",
                std::io::Error::last_os_error()
            );
        }
    }
    &INTERRUPTED
}

#[cfg(unix)]
extern "C" fn sigint_handler(_sig: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// No-op on non-Unix: Ctrl-C keeps its default behavior.
#[cfg(not(unix))]
pub fn install() -> &'static AtomicBool {
    &INTERRUPTED
}
