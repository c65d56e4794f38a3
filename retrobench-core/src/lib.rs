//! RetroBench Core - Measurement Runtime
//!
//! This crate provides the pieces a benchmark run is built from:
//! - `Engine` / `EngineFactory`: the uniform step/capture interface
//! - `EngineSession`: the timed measurement protocol (warmup + deadline-bounded stepping)
//! - `EngineSlot` / `LiveEngine`: at most one live engine per process
//! - `SystemRegistry` and `ContentCatalog` with their built-in adapters
//! - Representative workload selection
//! - A libretro adapter for real cores

mod catalog;
mod engine;
mod libretro;
mod measure;
mod registry;
mod representative;
mod session;
mod slot;

pub use catalog::{CatalogError, ContentCatalog, DirectoryCatalog, Integrations, Tier};
pub use engine::{AuxDescriptor, BoxError, Engine, EngineError, EngineFactory, Frame};
pub use libretro::{
    HW_RENDER_ENV, LibretroEngine, LibretroError, LibretroFactory, N64_GFXPLUGIN_ENV,
    N64_GFXPLUGIN_VARIABLE, default_variables,
};
pub use measure::{Deadline, MIN_ELAPSED_SECONDS, floor_elapsed};
pub use registry::{StaticRegistry, SystemEntry, SystemRegistry};
pub use representative::{pick_representatives, plan_representative_specs};
pub use session::{
    DEFAULT_DURATION_SECONDS, DEFAULT_WARMUP_STEPS, EngineSession, Measurement, SessionConfig,
};
pub use slot::{EngineSlot, LiveEngine, engine_is_live};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One declared benchmark entry. Identity is the full triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenchmarkSpec {
    /// Core library expected to run `system`
    pub core_lib: String,
    /// System the workload belongs to
    pub system: String,
    /// Workload identifier, resolved through the content catalog
    pub game: String,
}

impl BenchmarkSpec {
    /// Build a spec
    pub fn new(
        core_lib: impl Into<String>,
        system: impl Into<String>,
        game: impl Into<String>,
    ) -> Self {
        Self {
            core_lib: core_lib.into(),
            system: system.into(),
            game: game.into(),
        }
    }

    /// `core_lib/system/game`, used for filtering and logs
    pub fn id(&self) -> String {
        format!("{}/{}/{}", self.core_lib, self.system, self.game)
    }
}

impl std::fmt::Display for BenchmarkSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.core_lib, self.system, self.game)
    }
}

/// An installed workload found by the content catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// System owning the content's extension
    pub system: String,
    /// Workload identifier (directory name)
    pub game: String,
    /// Path of the content file
    pub content_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_id_joins_the_triple() {
        let spec = BenchmarkSpec::new("fceumm", "Nes", "SuperMarioBros-Nes");
        assert_eq!(spec.id(), "fceumm/Nes/SuperMarioBros-Nes");
        assert_eq!(spec.to_string(), spec.id());
    }

    #[test]
    fn spec_serializes_with_declaration_keys() {
        let spec = BenchmarkSpec::new("snes9x", "Snes", "F-Zero-Snes");
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["core_lib"], "snes9x");
        assert_eq!(value["system"], "Snes");
        assert_eq!(value["game"], "F-Zero-Snes");
    }
}
