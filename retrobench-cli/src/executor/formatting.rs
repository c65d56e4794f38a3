//! Output Formatting
//!
//! Human-readable output for benchmark reports: a settings header, the results
//! table (fastest first) and the skipped entries.
//!
//! The table uses explicit ` | ` separators rather than padding, so no cell
//! can look empty.

use retrobench_core::{HW_RENDER_ENV, N64_GFXPLUGIN_ENV};
use retrobench_report::{Report, format_fps, format_seconds};

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();
    let settings = &report.meta.settings;

    output.push_str(&format!(
        "Benchmark spec: {}\n",
        report.meta.benchmark_spec.display()
    ));
    output.push_str(&format!(
        "Benchmark: {}s per entry | warmup_steps={} | screen={}\n",
        format_seconds(settings.seconds),
        settings.warmup_steps,
        settings.screen
    ));
    if settings.hw_render {
        output.push_str(&format!("Env: {}=1\n", HW_RENDER_ENV));
    }
    if let Some(plugin) = &settings.n64_gfxplugin {
        output.push_str(&format!("Env: {}={}\n", N64_GFXPLUGIN_ENV, plugin));
    }
    output.push('\n');

    if report.interrupted {
        output.push_str("Interrupted (Ctrl-C). Showing partial results.\n\n");
    }

    if !report.results.is_empty() {
        output.push_str("fps | core | system | game\n");
        output.push_str("--- | ---- | ------ | ----\n");
        for result in &report.results {
            output.push_str(&format!(
                "{} | {} | {} | {}\n",
                format_fps(result.steps_per_sec()),
                result.core_lib(),
                result.system(),
                result.game()
            ));
        }
        output.push('\n');
    }

    if !report.skips.is_empty() {
        output.push_str("Skipped:\n");
        for skip in &report.skips {
            output.push_str(&format!("- {}: {}\n", skip.core_lib, skip.reason));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::build_report_meta;
    use retrobench_core::{BenchmarkSpec, Measurement};
    use retrobench_report::{
        CoreBenchResult, CoreSkip, RunOutcome, RunSettings, SkipReason, finalize,
    };
    use std::path::Path;

    fn settings(hw_render: bool, plugin: Option<&str>) -> RunSettings {
        RunSettings {
            seconds: 5.0,
            warmup_steps: 30,
            screen: false,
            integrations: "all".to_string(),
            hw_render,
            n64_gfxplugin: plugin.map(str::to_string),
        }
    }

    fn result(core: &str, system: &str, game: &str, steps: u64) -> CoreBenchResult {
        CoreBenchResult::new(
            &BenchmarkSpec::new(core, system, game),
            Measurement::new(steps, 1.0),
            false,
        )
    }

    #[test]
    fn renders_header_table_and_skips() {
        let outcome = RunOutcome {
            results: vec![
                result("fceumm", "Nes", "Tetris-Nes", 2500),
                result("snes9x", "Snes", "F-Zero-Snes", 60),
            ],
            skips: vec![CoreSkip::new(
                "mgba",
                SkipReason::ContentNotFound {
                    game: "Kirby-GbAdvance".into(),
                    system: "GbAdvance".into(),
                    cause: "not installed".into(),
                },
            )],
            interrupted: false,
        };
        let meta = build_report_meta(Path::new("benchmark.json"), settings(false, None));
        let (report, _) = finalize(outcome, meta);

        let expected = "\
Benchmark spec: benchmark.json
Benchmark: 5.0s per entry | warmup_steps=30 | screen=false

fps | core | system | game
--- | ---- | ------ | ----
2,500 | fceumm | Nes | Tetris-Nes
60.00 | snes9x | Snes | F-Zero-Snes

Skipped:
- mgba: content not found for game Kirby-GbAdvance (GbAdvance): not installed
";
        assert_eq!(format_human_output(&report), expected);
    }

    #[test]
    fn renders_env_lines_and_interruption_without_table() {
        let outcome = RunOutcome {
            results: vec![],
            skips: vec![],
            interrupted: true,
        };
        let meta = build_report_meta(Path::new("b.json"), settings(true, Some("angrylion")));
        let (report, _) = finalize(outcome, meta);
        let output = format_human_output(&report);

        assert!(output.contains("Env: STABLE_RETRO_HW_RENDER=1\n"));
        assert!(output.contains("Env: STABLE_RETRO_PARALLEL_N64_GFXPLUGIN=angrylion\n"));
        assert!(output.contains("Interrupted (Ctrl-C). Showing partial results.\n"));
        assert!(!output.contains("fps | core"));
        assert!(!output.contains("Skipped:"));
    }
}
