//! Engine Exclusivity
//!
//! Most core libraries keep their state in process globals, so two live
//! instances corrupt each other and skew timing. The process-wide engine slot
//! makes "at most one live engine" an ownership fact instead of a convention:
//!
//! - [`EngineSlot`] can only be acquired while no other slot is held.
//! - [`LiveEngine`] owns both the slot and the engine; dropping it releases the
//!   engine first, then the slot, on every exit path (return, `?`, unwind).

use crate::engine::{Engine, EngineError};
use std::sync::atomic::{AtomicBool, Ordering};

static ENGINE_LIVE: AtomicBool = AtomicBool::new(false);

/// Whether an engine slot is currently held anywhere in the process.
pub fn engine_is_live() -> bool {
    ENGINE_LIVE.load(Ordering::Acquire)
}

/// Token proving exclusive ownership of the process-wide engine slot.
#[derive(Debug)]
pub struct EngineSlot {
    _private: (),
}

impl EngineSlot {
    /// Claim the slot, failing if another holder exists.
    pub fn acquire() -> Result<Self, EngineError> {
        ENGINE_LIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::AlreadyLive)?;
        tracing::trace!("engine slot acquired");
        Ok(Self { _private: () })
    }
}

impl Drop for EngineSlot {
    fn drop(&mut self) {
        ENGINE_LIVE.store(false, Ordering::Release);
        tracing::trace!("engine slot released");
    }
}

/// Scoped handle over the one live engine.
///
/// [`Engine::release`] should not panic; if it does, the panic is logged and
/// swallowed so the slot is still freed.
pub struct LiveEngine {
    // Field order matters: the engine is dropped before the slot is freed.
    engine: Box<dyn Engine>,
    _slot: EngineSlot,
}

impl LiveEngine {
    /// Bind an already constructed engine to a held slot.
    pub fn new(slot: EngineSlot, engine: Box<dyn Engine>) -> Self {
        Self {
            engine,
            _slot: slot,
        }
    }

    /// Mutable access to the engine.
    pub fn engine(&mut self) -> &mut dyn Engine {
        &mut *self.engine
    }
}

impl Drop for LiveEngine {
    fn drop(&mut self) {
        // A panicking release must not escape a drop that may already be
        // running during unwind.
        let engine = &mut self.engine;
        if let Err(payload) =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| engine.release()))
        {
            tracing::error!("engine release panicked: {}", panic_message(&*payload));
        }
    }
}

/// Text of a panic payload, for `&str` and `String` payloads.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard};

    static SLOT_TESTS: Mutex<()> = Mutex::new(());

    /// Serialize tests that touch the process-wide slot.
    pub(crate) fn serial() -> MutexGuard<'static, ()> {
        SLOT_TESTS.lock().unwrap_or_else(|e| e.into_inner())
    }
}
