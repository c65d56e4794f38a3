//! Benchmark Execution
//!
//! Runs declared entries one at a time and turns each into a result or a skip.
//!
//! ## Data Flow
//!
//! ```text
//! BenchmarkSpec (declaration order)
//!        │
//!        ├─ cancelled? ──────────────────────────▶ stop (interrupted)
//!        ├─ registry: core mismatch ─────────────▶ CoreSkip::Mismatch
//!        ├─ catalog: content missing ────────────▶ CoreSkip::ContentNotFound
//!        ├─ EngineSession::run_benchmark fails ──▶ CoreSkip::EngineFailure
//!        ▼
//!  CoreBenchResult
//! ```
//!
//! No failure of one entry affects the next; only cancellation ends the run early.

use indicatif::{ProgressBar, ProgressStyle};
use retrobench_core::{BenchmarkSpec, ContentCatalog, EngineSession, Integrations, SystemRegistry};
use retrobench_report::{CoreBenchResult, CoreSkip, RunOutcome, SkipReason};
use std::sync::atomic::{AtomicBool, Ordering};

/// Orchestrates entries against the registry, the catalog and the engine session
pub struct Runner<'a> {
    registry: &'a dyn SystemRegistry,
    catalog: &'a dyn ContentCatalog,
    session: EngineSession<'a>,
    scope: Integrations,
    show_progress: bool,
}

impl<'a> Runner<'a> {
    pub fn new(
        registry: &'a dyn SystemRegistry,
        catalog: &'a dyn ContentCatalog,
        session: EngineSession<'a>,
        scope: Integrations,
    ) -> Self {
        Self {
            registry,
            catalog,
            session,
            scope,
            show_progress: false,
        }
    }

    /// Show a progress bar on stderr while running
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Process `specs` in order until done or `cancel` is set.
    ///
    /// The flag is checked before each entry, never during a measurement.
    pub fn run(&self, specs: &[BenchmarkSpec], cancel: &AtomicBool) -> RunOutcome {
        let pb = if self.show_progress {
            let pb = ProgressBar::new(specs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut outcome = RunOutcome::default();

        for spec in specs {
            if cancel.load(Ordering::SeqCst) {
                tracing::warn!(
                    remaining = specs.len() - outcome.results.len() - outcome.skips.len(),
                    "interrupted, stopping before {}",
                    spec
                );
                outcome.interrupted = true;
                break;
            }

            pb.set_message(spec.id());
            match self.run_one(spec) {
                Ok(result) => {
                    tracing::info!(
                        entry = %spec,
                        steps = result.steps(),
                        steps_per_sec = result.steps_per_sec(),
                        "benchmarked"
                    );
                    outcome.results.push(result);
                }
                Err(skip) => {
                    tracing::warn!(entry = %spec, "skipped: {}", skip.reason);
                    outcome.skips.push(skip);
                }
            }
            pb.inc(1);
        }

        if outcome.interrupted {
            pb.abandon_with_message("Interrupted");
        } else {
            pb.finish_with_message("Complete");
        }
        outcome
    }

    /// Validate, resolve and measure a single entry.
    fn run_one(&self, spec: &BenchmarkSpec) -> Result<CoreBenchResult, CoreSkip> {
        match self.registry.core_lib_for(&spec.system) {
            Some(registered) if registered != spec.core_lib => {
                return Err(CoreSkip::new(
                    spec.core_lib.clone(),
                    SkipReason::Mismatch {
                        system: spec.system.clone(),
                        declared: spec.core_lib.clone(),
                        registered: registered.to_string(),
                    },
                ));
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    system = %spec.system,
                    "system is not in the registry; running {} as declared",
                    spec.core_lib
                );
            }
        }

        let content_path = self
            .catalog
            .resolve(&spec.game, self.scope)
            .map_err(|e| {
                CoreSkip::new(
                    spec.core_lib.clone(),
                    SkipReason::ContentNotFound {
                        game: spec.game.clone(),
                        system: spec.system.clone(),
                        cause: e.to_string(),
                    },
                )
            })?;

        tracing::debug!(entry = %spec, content = %content_path.display(), "measuring");

        let measurement = self
            .session
            .run_benchmark(&spec.core_lib, &content_path)
            .map_err(|e| {
                CoreSkip::new(
                    spec.core_lib.clone(),
                    SkipReason::EngineFailure {
                        game: spec.game.clone(),
                        cause: e.to_string(),
                    },
                )
            })?;

        Ok(CoreBenchResult::new(
            spec,
            measurement,
            self.session.config().capture_screen,
        ))
    }
}
