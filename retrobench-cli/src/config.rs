//! Configuration loading from retrobench.toml
//!
//! RetroBench configuration can be specified in a `retrobench.toml` file.
//! The configuration is automatically discovered by walking up from the current directory.
//! Command-line flags always win over file values.

use retrobench_core::{DEFAULT_DURATION_SECONDS, DEFAULT_WARMUP_STEPS, Integrations};
use retrobench_report::OutputFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for by [`RetroBenchConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "retrobench.toml";

/// Fatal configuration problems, reported before any engine runs
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--seconds must be a finite number greater than 0, got {0}")]
    InvalidSeconds(f64),

    #[error("invalid --filter pattern {pattern:?}: {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// RetroBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RetroBenchConfig {
    /// Measurement protocol
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Content and core locations
    #[serde(default)]
    pub paths: PathsConfig,
    /// Engine toggles and core variables
    #[serde(default)]
    pub engine: EngineConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Timed duration per entry, in seconds
    #[serde(default = "default_seconds")]
    pub seconds: f64,
    /// Discarded steps before timing starts
    #[serde(default = "default_warmup_steps")]
    pub warmup_steps: u64,
    /// Capture a frame after every step
    #[serde(default)]
    pub screen: bool,
    /// Integration tiers searched for content
    #[serde(default)]
    pub integrations: Integrations,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seconds: default_seconds(),
            warmup_steps: default_warmup_steps(),
            screen: false,
            integrations: Integrations::default(),
        }
    }
}

fn default_seconds() -> f64 {
    DEFAULT_DURATION_SECONDS
}
fn default_warmup_steps() -> u64 {
    DEFAULT_WARMUP_STEPS
}

/// Filesystem locations. Relative defaults resolve next to the executable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    /// Root holding `stable/`, `experimental/` and `contrib/`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Directory holding `<core>_libretro.<so|dylib>`
    #[serde(default)]
    pub core_dir: Option<PathBuf>,
    /// Directories searched for the `custom` tier
    #[serde(default)]
    pub custom_dirs: Vec<PathBuf>,
    /// Default declaration file
    #[serde(default)]
    pub benchmark_json: Option<PathBuf>,
}

/// Engine toggles exported before any engine is constructed
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Export `STABLE_RETRO_HW_RENDER=1`
    #[serde(default)]
    pub hw_render: bool,
    /// Export `STABLE_RETRO_PARALLEL_N64_GFXPLUGIN`
    #[serde(default)]
    pub n64_gfxplugin: Option<String>,
    /// Extra core variables passed to every engine
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default)]
    pub format: OutputFormat,
    /// Show a progress bar on stderr
    #[serde(default = "default_progress")]
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            progress: default_progress(),
        }
    }
}

fn default_progress() -> bool {
    true
}

impl RetroBenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Try to discover and load configuration by walking up from current directory.
    ///
    /// A file that exists but fails to load is reported and ignored.
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Same as [`discover`](Self::discover), starting at `start`
    pub fn discover_from(start: &Path) -> Option<Self> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => {
                        tracing::debug!(path = %config_path.display(), "loaded configuration");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!("ignoring configuration: {e}");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# RetroBench Configuration

[runner]
# Timed duration per benchmark entry, in seconds
seconds = 5.0
# Steps run and discarded before timing starts
warmup_steps = 30
# Include frame capture overhead in every step
screen = false
# Integration tiers searched for content: default, stable, contrib, experimental, custom, all
integrations = "all"

[paths]
# Content root with stable/, experimental/ and contrib/ (defaults to ./data next to the binary)
# data_dir = "data"
# Directory holding <core>_libretro.so (defaults to ./cores next to the binary)
# core_dir = "cores"
# Directories searched for the custom tier
custom_dirs = []
# Declaration file (defaults to benchmark.json next to the binary)
# benchmark_json = "benchmark.json"

[engine]
# Export STABLE_RETRO_HW_RENDER=1
hw_render = false
# Export STABLE_RETRO_PARALLEL_N64_GFXPLUGIN (uncomment to enable)
# n64_gfxplugin = "angrylion"

[engine.variables]
# Extra core variables, e.g.
# "genesis_plus_gx_bram" = "per game"

[output]
# Output format: human or json
format = "human"
# Progress bar on stderr
progress = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetroBenchConfig::default();
        assert_eq!(config.runner.seconds, 5.0);
        assert_eq!(config.runner.warmup_steps, 30);
        assert_eq!(config.runner.integrations, Integrations::All);
        assert!(!config.engine.hw_render);
        assert!(config.output.progress);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            seconds = 0.5
            integrations = "contrib"

            [engine]
            n64_gfxplugin = "glide64"

            [engine.variables]
            "snes9x_overclock" = "2x"
        "#;

        let config: RetroBenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.seconds, 0.5);
        assert_eq!(config.runner.integrations, Integrations::Contrib);
        assert_eq!(config.engine.n64_gfxplugin.as_deref(), Some("glide64"));
        assert_eq!(config.engine.variables["snes9x_overclock"], "2x");
        // Defaults should still apply
        assert_eq!(config.runner.warmup_steps, 30);
        assert_eq!(config.output.format, OutputFormat::Human);
    }

    #[test]
    fn test_default_toml_parses() {
        let config: RetroBenchConfig = toml::from_str(&RetroBenchConfig::default_toml()).unwrap();
        assert_eq!(config.runner.seconds, 5.0);
        assert!(config.paths.custom_dirs.is_empty());
        assert!(config.engine.variables.is_empty());
    }

    #[test]
    fn test_discover_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[runner]\nwarmup_steps = 7\n",
        )
        .unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = RetroBenchConfig::discover_from(&nested).unwrap();
        assert_eq!(config.runner.warmup_steps, 7);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[runner\n").unwrap();
        let err = RetroBenchConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
