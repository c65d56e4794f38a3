//! Report Data Structures

use chrono::{DateTime, Utc};
use retrobench_core::{BenchmarkSpec, Measurement};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete benchmark report
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    /// Sorted by `steps_per_sec`, fastest first
    pub results: Vec<CoreBenchResult>,
    /// In processing order
    pub skips: Vec<CoreSkip>,
    pub summary: ReportSummary,
    pub interrupted: bool,
}

/// Throughput measured for one benchmark entry.
///
/// Fields are read-only: `steps_per_sec` is always `steps / elapsed_seconds`
/// and `elapsed_seconds` is never below the epsilon floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreBenchResult {
    core_lib: String,
    system: String,
    game: String,
    elapsed_seconds: f64,
    steps: u64,
    steps_per_sec: f64,
    captured_screen: bool,
}

impl CoreBenchResult {
    /// Result of measuring `spec`
    pub fn new(spec: &BenchmarkSpec, measurement: Measurement, captured_screen: bool) -> Self {
        // Re-floor: Measurement fields are public.
        let measurement = Measurement::new(measurement.steps, measurement.elapsed_seconds);
        Self {
            core_lib: spec.core_lib.clone(),
            system: spec.system.clone(),
            game: spec.game.clone(),
            elapsed_seconds: measurement.elapsed_seconds,
            steps: measurement.steps,
            steps_per_sec: measurement.steps_per_sec(),
            captured_screen,
        }
    }

    pub fn core_lib(&self) -> &str {
        &self.core_lib
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn steps_per_sec(&self) -> f64 {
        self.steps_per_sec
    }

    /// Whether frame capture was part of every measured step
    pub fn captured_screen(&self) -> bool {
        self.captured_screen
    }
}

/// Why an entry produced no result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The declared core library disagrees with the registry
    Mismatch {
        system: String,
        declared: String,
        registered: String,
    },
    /// The catalog has no content for the game
    ContentNotFound {
        game: String,
        system: String,
        cause: String,
    },
    /// Construction, configuration or stepping failed
    EngineFailure { game: String, cause: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Mismatch {
                system,
                declared,
                registered,
            } => write!(
                f,
                "system/core mismatch for {system}: spec says {declared}, registry says {registered}"
            ),
            SkipReason::ContentNotFound {
                game,
                system,
                cause,
            } => write!(f, "content not found for game {game} ({system}): {cause}"),
            SkipReason::EngineFailure { game, cause } => {
                write!(f, "error running {game}: {cause}")
            }
        }
    }
}

/// An entry that was processed but not measured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSkip {
    pub core_lib: String,
    pub reason: SkipReason,
}

impl CoreSkip {
    pub fn new(core_lib: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            core_lib: core_lib.into(),
            reason,
        }
    }
}

/// What the runner produced before aggregation
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// In processing order
    pub results: Vec<CoreBenchResult>,
    /// In processing order
    pub skips: Vec<CoreSkip>,
    /// The run was cancelled before every entry was processed
    pub interrupted: bool,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Declaration file the entries came from
    pub benchmark_spec: PathBuf,
    pub settings: RunSettings,
    pub system: SystemInfo,
}

/// Effective run settings captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    pub seconds: f64,
    pub warmup_steps: u64,
    pub screen: bool,
    pub integrations: String,
    pub hw_render: bool,
    pub n64_gfxplugin: Option<String>,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: u32,
    pub memory_gb: f64,
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Entries that yielded a result or a skip
    pub processed: usize,
    pub benchmarked: usize,
    pub skipped: usize,
    pub mismatches: usize,
    pub content_missing: usize,
    pub engine_failures: usize,
    /// Highest `steps_per_sec`, if anything ran
    pub best_steps_per_sec: Option<f64>,
}

impl ReportSummary {
    /// Tally results and skips
    pub fn from_parts(results: &[CoreBenchResult], skips: &[CoreSkip]) -> Self {
        let mut summary = Self {
            processed: results.len() + skips.len(),
            benchmarked: results.len(),
            skipped: skips.len(),
            best_steps_per_sec: results
                .iter()
                .map(CoreBenchResult::steps_per_sec)
                .reduce(f64::max),
            ..Default::default()
        };
        for skip in skips {
            match skip.reason {
                SkipReason::Mismatch { .. } => summary.mismatches += 1,
                SkipReason::ContentNotFound { .. } => summary.content_missing += 1,
                SkipReason::EngineFailure { .. } => summary.engine_failures += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> BenchmarkSpec {
        BenchmarkSpec::new("fceumm", "Nes", "SuperMarioBros-Nes")
    }

    #[test]
    fn result_throughput_matches_steps_over_elapsed() {
        let result = CoreBenchResult::new(&spec(), Measurement::new(600, 2.0), false);
        assert_eq!(result.steps(), 600);
        assert_eq!(result.elapsed_seconds(), 2.0);
        assert_eq!(result.steps_per_sec(), 300.0);
        assert_eq!(result.core_lib(), "fceumm");
    }

    #[test]
    fn result_floors_unfloored_measurement() {
        let raw = Measurement {
            steps: 3,
            elapsed_seconds: 0.0,
        };
        let result = CoreBenchResult::new(&spec(), raw, true);
        assert!(result.elapsed_seconds() > 0.0);
        assert!(result.steps_per_sec().is_finite());
        assert!(result.captured_screen());
    }

    #[test]
    fn skip_reasons_render_distinctly() {
        let mismatch = SkipReason::Mismatch {
            system: "Nes".into(),
            declared: "snes9x".into(),
            registered: "fceumm".into(),
        };
        assert_eq!(
            mismatch.to_string(),
            "system/core mismatch for Nes: spec says snes9x, registry says fceumm"
        );

        let missing = SkipReason::ContentNotFound {
            game: "Tetris-Nes".into(),
            system: "Nes".into(),
            cause: "not installed".into(),
        };
        assert_eq!(
            missing.to_string(),
            "content not found for game Tetris-Nes (Nes): not installed"
        );

        let failed = SkipReason::EngineFailure {
            game: "Tetris-Nes".into(),
            cause: "step failed: boom".into(),
        };
        assert_eq!(failed.to_string(), "error running Tetris-Nes: step failed: boom");
    }

    #[test]
    fn skip_reason_serializes_tagged() {
        let skip = CoreSkip::new(
            "fceumm",
            SkipReason::EngineFailure {
                game: "Tetris-Nes".into(),
                cause: "boom".into(),
            },
        );
        let value = serde_json::to_value(&skip).unwrap();
        assert_eq!(value["core_lib"], "fceumm");
        assert_eq!(value["reason"]["kind"], "engine_failure");
        assert_eq!(value["reason"]["cause"], "boom");
    }

    #[test]
    fn summary_counts_by_kind() {
        let results = vec![
            CoreBenchResult::new(&spec(), Measurement::new(100, 1.0), false),
            CoreBenchResult::new(&spec(), Measurement::new(400, 1.0), false),
        ];
        let skips = vec![CoreSkip::new(
            "snes9x",
            SkipReason::ContentNotFound {
                game: "F-Zero-Snes".into(),
                system: "Snes".into(),
                cause: "missing".into(),
            },
        )];
        let summary = ReportSummary::from_parts(&results, &skips);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.benchmarked, 2);
        assert_eq!(summary.content_missing, 1);
        assert_eq!(summary.best_steps_per_sec, Some(400.0));
    }
}
