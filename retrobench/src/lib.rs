#![warn(missing_docs)]
//! # RetroBench
//!
//! Single-threaded throughput benchmark harness for emulation engines.
//!
//! RetroBench runs a declared list of `(core_lib, system, game)` entries, one
//! at a time, and reports steps per second for each:
//! - **Uniform engine interface**: any core that can step and capture a frame
//! - **One live engine**: at most one engine instance exists in the process
//! - **Fail-soft runs**: mismatched, missing or failing entries become skips
//! - **Libretro adapter**: drives real `<core>_libretro` shared libraries
//!
//! ## Quick Start
//!
//! ```ignore
//! use retrobench::prelude::*;
//! use std::sync::atomic::AtomicBool;
//!
//! let registry = StaticRegistry::builtin();
//! let catalog = DirectoryCatalog::new("data", &registry);
//! let factory = LibretroFactory::new("cores");
//! let session = EngineSession::new(&factory, SessionConfig::default());
//!
//! let specs = vec![BenchmarkSpec::new("fceumm", "Nes", "Tetris-Nes")];
//! let outcome = Runner::new(&registry, &catalog, session, Integrations::All)
//!     .run(&specs, &AtomicBool::new(false));
//! ```
//!
//! The `retrobench` binary wraps the same pipeline behind a command line; see
//! [`run`].

// Re-export core types
pub use retrobench_core::{
    AuxDescriptor, BenchmarkSpec, BoxError, Candidate, CatalogError, ContentCatalog,
    DirectoryCatalog, Engine, EngineError, EngineFactory, EngineSession, Frame, Integrations,
    LibretroEngine, LibretroError, LibretroFactory, Measurement, SessionConfig, StaticRegistry,
    SystemEntry, SystemRegistry, engine_is_live, pick_representatives, plan_representative_specs,
};

// Re-export report types
pub use retrobench_report::{
    CoreBenchResult, CoreSkip, ExitStatus, OutputFormat, Report, ReportMeta, RunOutcome,
    RunSettings, SkipReason, finalize, generate_json_report,
};

// Re-export the command line
pub use retrobench_cli::{
    Cli, Runner, build_report_meta, declaration, exit_code, format_human_output, run, run_from,
    run_with_cli,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchmarkSpec, ContentCatalog, DirectoryCatalog, Engine, EngineFactory, EngineSession,
        Integrations, LibretroFactory, Runner, SessionConfig, StaticRegistry, SystemRegistry,
    };
}
