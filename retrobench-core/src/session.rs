//! Engine Session - One Timed Measurement
//!
//! Runs the measurement protocol for a single benchmark entry:
//!
//! ```text
//! acquire slot ─▶ construct ─▶ configure ─▶ init step ─▶ warmup ─▶ timed loop ─▶ release
//!                     │            │            │           │           │
//!                     └────────────┴────────────┴───────────┴───────────┴──▶ EngineError
//! ```
//!
//! Release is tied to the [`LiveEngine`] handle, so it runs on success, on an
//! engine error and on a panic alike. Panics are caught and reported as
//! [`EngineError::Panicked`] once the handle has been dropped.

use crate::engine::{AuxDescriptor, EngineError, EngineFactory};
use crate::measure::{Deadline, floor_elapsed};
use crate::slot::{EngineSlot, LiveEngine, panic_message};
use std::path::Path;

/// Default timed duration per entry, in seconds
pub const DEFAULT_DURATION_SECONDS: f64 = 5.0;

/// Default number of discarded warmup steps
pub const DEFAULT_WARMUP_STEPS: u64 = 30;

/// Parameters of one session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum wall time of the timed phase. Must be finite and > 0.
    pub duration_seconds: f64,
    /// Steps run (and discarded) before timing starts
    pub warmup_steps: u64,
    /// Capture a frame after every warmup and timed step
    pub capture_screen: bool,
    /// Descriptor passed to `Engine::configure`
    pub aux: AuxDescriptor,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_DURATION_SECONDS,
            warmup_steps: DEFAULT_WARMUP_STEPS,
            capture_screen: false,
            aux: AuxDescriptor::default(),
        }
    }
}

impl SessionConfig {
    /// Reject durations the timed loop cannot honor.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.duration_seconds.is_finite() && self.duration_seconds > 0.0 {
            Ok(())
        } else {
            Err(EngineError::InvalidDuration(self.duration_seconds))
        }
    }
}

/// Raw outcome of a timed phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Steps completed inside the timed phase
    pub steps: u64,
    /// Wall time of the timed phase, never below the epsilon floor
    pub elapsed_seconds: f64,
}

impl Measurement {
    /// Build a measurement, flooring the interval.
    pub fn new(steps: u64, elapsed_seconds: f64) -> Self {
        Self {
            steps,
            elapsed_seconds: floor_elapsed(elapsed_seconds),
        }
    }

    /// Throughput in steps per second
    pub fn steps_per_sec(&self) -> f64 {
        self.steps as f64 / self.elapsed_seconds
    }
}

/// Runs timed measurements against engines from one factory
pub struct EngineSession<'a> {
    factory: &'a dyn EngineFactory,
    config: SessionConfig,
}

impl<'a> EngineSession<'a> {
    /// Create a session runner
    pub fn new(factory: &'a dyn EngineFactory, config: SessionConfig) -> Self {
        Self { factory, config }
    }

    /// Session parameters
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Measure `core_lib` on the content at `content_path`.
    ///
    /// The engine is constructed, measured and released inside this call; no
    /// engine outlives it.
    pub fn run_benchmark(
        &self,
        core_lib: &str,
        content_path: &Path,
    ) -> Result<Measurement, EngineError> {
        self.config.validate()?;

        let slot = EngineSlot::acquire()?;

        // LiveEngine is dropped inside the closure, before the panic payload
        // is inspected, so the slot is already free by the time we return.
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let engine = self
                .factory
                .construct(core_lib, content_path)
                .map_err(|source| EngineError::Construct {
                    core_lib: core_lib.to_string(),
                    path: content_path.to_path_buf(),
                    source,
                })?;
            let mut live = LiveEngine::new(slot, engine);
            self.measure(&mut live)
        }));

        match outcome {
            Ok(result) => result,
            Err(panic) => Err(EngineError::Panicked {
                message: panic_message(&*panic),
            }),
        }
    }

    fn measure(&self, live: &mut LiveEngine) -> Result<Measurement, EngineError> {
        let cfg = &self.config;
        let engine = live.engine();

        engine.configure(&cfg.aux).map_err(EngineError::Configure)?;

        // Settle the engine into its running state; neither timed nor counted.
        engine.step().map_err(EngineError::Step)?;

        for _ in 0..cfg.warmup_steps {
            engine.step().map_err(EngineError::Step)?;
            if cfg.capture_screen {
                std::hint::black_box(engine.capture_frame().map_err(EngineError::Capture)?);
            }
        }

        let deadline = Deadline::start(cfg.duration_seconds);
        let mut steps: u64 = 0;
        // Deadline checked before issuing each step: no step starts late, and
        // the last step always completes.
        while !deadline.expired() {
            engine.step().map_err(EngineError::Step)?;
            if cfg.capture_screen {
                std::hint::black_box(engine.capture_frame().map_err(EngineError::Capture)?);
            }
            steps += 1;
        }

        let measurement = Measurement::new(steps, deadline.elapsed_seconds());
        tracing::debug!(
            steps = measurement.steps,
            elapsed_seconds = measurement.elapsed_seconds,
            "timed phase complete"
        );
        Ok(measurement)
    }
}
