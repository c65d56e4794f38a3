//! Benchmark Executor
//!
//! Runs declared entries and renders what came out of them.
//!
//! ## Pipeline Overview
//!
//! ```text
//! BenchmarkSpec (from the declaration)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  Validate, resolve, measure; one result or skip per entry
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │  finalize   │  Sort, exit status (retrobench-report)
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - The serial runner
//! - [`formatting`] - Human-readable output formatting
//! - [`metadata`] - System metadata collection

mod execution;
mod formatting;
mod metadata;

// Re-export public API
pub use execution::Runner;
pub use formatting::format_human_output;
pub use metadata::build_report_meta;

#[cfg(test)]
pub(crate) mod test_support {
    use retrobench_core::{AuxDescriptor, BoxError, Engine, EngineFactory, Frame};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard};

    static SESSION_TESTS: Mutex<()> = Mutex::new(());

    /// Serialize tests that run engine sessions; the engine slot is process-wide.
    pub(crate) fn serial() -> MutexGuard<'static, ()> {
        SESSION_TESTS.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stand-in factory tracking how many engines are alive at once
    #[derive(Default)]
    pub(crate) struct CountingFactory {
        live: Arc<AtomicUsize>,
        max_live: Arc<AtomicUsize>,
        constructed: AtomicUsize,
        fail_on: Option<String>,
    }

    impl CountingFactory {
        /// Engines for content whose path contains `game` fail mid-session.
        pub(crate) fn failing_on(game: &str) -> Self {
            Self {
                fail_on: Some(game.to_string()),
                ..Self::default()
            }
        }

        pub(crate) fn max_live(&self) -> usize {
            self.max_live.load(Ordering::SeqCst)
        }

        pub(crate) fn constructed(&self) -> usize {
            self.constructed.load(Ordering::SeqCst)
        }
    }

    impl EngineFactory for CountingFactory {
        fn construct(
            &self,
            _core_lib: &str,
            content_path: &Path,
        ) -> Result<Box<dyn Engine>, BoxError> {
            self.constructed.fetch_add(1, Ordering::SeqCst);
            let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_live.fetch_max(now, Ordering::SeqCst);
            let fail = self
                .fail_on
                .as_deref()
                .is_some_and(|game| content_path.to_string_lossy().contains(game));
            Ok(Box::new(CountingEngine {
                live: Arc::clone(&self.live),
                fail,
                steps: 0,
            }))
        }
    }

    struct CountingEngine {
        live: Arc<AtomicUsize>,
        fail: bool,
        steps: u64,
    }

    impl Engine for CountingEngine {
        fn configure(&mut self, _aux: &AuxDescriptor) -> Result<(), BoxError> {
            Ok(())
        }

        fn step(&mut self) -> Result<(), BoxError> {
            self.steps += 1;
            if self.fail && self.steps > 3 {
                return Err("core crashed mid-session".into());
            }
            Ok(())
        }

        fn capture_frame(&mut self) -> Result<Frame, BoxError> {
            Ok(Frame::default())
        }

        fn release(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
