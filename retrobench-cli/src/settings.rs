//! Effective settings: `retrobench.toml` values with command-line overrides.

use crate::Cli;
use crate::config::{ConfigError, RetroBenchConfig};
use regex::Regex;
use retrobench_core::{AuxDescriptor, Integrations, N64_GFXPLUGIN_VARIABLE, SessionConfig};
use retrobench_report::{OutputFormat, RunSettings};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything a run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub seconds: f64,
    pub warmup_steps: u64,
    pub screen: bool,
    pub integrations: Integrations,
    pub benchmark_json: PathBuf,
    pub data_dir: PathBuf,
    pub core_dir: PathBuf,
    pub custom_dirs: Vec<PathBuf>,
    pub hw_render: bool,
    pub n64_gfxplugin: Option<String>,
    /// Core variables from the config file
    pub variables: BTreeMap<String, String>,
    pub filter: Option<Regex>,
    pub format: OutputFormat,
    pub progress: bool,
}

impl Settings {
    /// Layer: built-in defaults → `retrobench.toml` → command-line flags.
    pub fn resolve(cli: &Cli, config: &RetroBenchConfig) -> Result<Self, ConfigError> {
        let seconds = cli.seconds.unwrap_or(config.runner.seconds);
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(ConfigError::InvalidSeconds(seconds));
        }

        let filter = cli
            .filter
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidFilter {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;

        let n64_gfxplugin = cli
            .n64_gfxplugin
            .clone()
            .or_else(|| config.engine.n64_gfxplugin.clone())
            .filter(|p| !p.trim().is_empty());

        Ok(Self {
            seconds,
            warmup_steps: cli.warmup_steps.unwrap_or(config.runner.warmup_steps),
            screen: cli.screen || config.runner.screen,
            integrations: cli.integrations.unwrap_or(config.runner.integrations),
            benchmark_json: cli
                .benchmark_json
                .clone()
                .or_else(|| config.paths.benchmark_json.clone())
                .unwrap_or_else(|| beside_executable("benchmark.json")),
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| config.paths.data_dir.clone())
                .unwrap_or_else(|| beside_executable("data")),
            core_dir: cli
                .core_dir
                .clone()
                .or_else(|| config.paths.core_dir.clone())
                .unwrap_or_else(|| beside_executable("cores")),
            custom_dirs: config.paths.custom_dirs.clone(),
            hw_render: cli.hw_render || config.engine.hw_render,
            n64_gfxplugin,
            variables: config.engine.variables.clone(),
            filter,
            format: cli.format.unwrap_or(config.output.format),
            progress: !cli.no_progress && config.output.progress,
        })
    }

    /// Session parameters for every entry
    pub fn session_config(&self) -> SessionConfig {
        let mut aux = AuxDescriptor::empty();
        for (key, value) in &self.variables {
            aux = aux.with_variable(key, value);
        }
        if let Some(plugin) = &self.n64_gfxplugin {
            aux = aux.with_variable(N64_GFXPLUGIN_VARIABLE, plugin);
        }
        SessionConfig {
            duration_seconds: self.seconds,
            warmup_steps: self.warmup_steps,
            capture_screen: self.screen,
            aux,
        }
    }

    /// Settings as recorded in report metadata
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            seconds: self.seconds,
            warmup_steps: self.warmup_steps,
            screen: self.screen,
            integrations: self.integrations.to_string(),
            hw_render: self.hw_render,
            n64_gfxplugin: self.n64_gfxplugin.clone(),
        }
    }
}

/// `name` in the directory of the running binary, or the working directory
/// if that cannot be determined.
fn beside_executable(name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("retrobench").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_come_from_config() {
        let settings = Settings::resolve(&cli(&[]), &RetroBenchConfig::default()).unwrap();
        assert_eq!(settings.seconds, 5.0);
        assert_eq!(settings.warmup_steps, 30);
        assert_eq!(settings.integrations, Integrations::All);
        assert_eq!(settings.format, OutputFormat::Human);
        assert!(settings.benchmark_json.ends_with("benchmark.json"));
        assert!(settings.progress);
    }

    #[test]
    fn flags_override_config() {
        let mut config = RetroBenchConfig::default();
        config.runner.seconds = 2.0;
        config.runner.warmup_steps = 5;
        config.engine.n64_gfxplugin = Some("angrylion".to_string());

        let settings = Settings::resolve(
            &cli(&[
                "--seconds",
                "0.25",
                "--integrations",
                "stable",
                "--n64-gfxplugin",
                "glide64",
                "--format",
                "json",
                "--no-progress",
            ]),
            &config,
        )
        .unwrap();
        assert_eq!(settings.seconds, 0.25);
        assert_eq!(settings.warmup_steps, 5);
        assert_eq!(settings.integrations, Integrations::Stable);
        assert_eq!(settings.n64_gfxplugin.as_deref(), Some("glide64"));
        assert_eq!(settings.format, OutputFormat::Json);
        assert!(!settings.progress);

        let session = settings.session_config();
        assert_eq!(session.aux.variables[N64_GFXPLUGIN_VARIABLE], "glide64");
        assert_eq!(session.duration_seconds, 0.25);
    }

    #[test]
    fn rejects_non_positive_seconds() {
        let config = RetroBenchConfig::default();
        for bad in ["0", "-1", "NaN", "inf"] {
            let err = Settings::resolve(&cli(&["--seconds", bad]), &config).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidSeconds(_)), "{bad}");
        }
    }

    #[test]
    fn rejects_bad_filter() {
        let err =
            Settings::resolve(&cli(&["--filter", "("]), &RetroBenchConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFilter { .. }));
    }
}
