//! Result aggregation
//!
//! Turns the runner's raw outcome into the final report and process exit status.

use crate::report::{Report, ReportMeta, ReportSummary, RunOutcome};

/// Process exit status of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// At least one entry produced a result
    Success,
    /// No entry produced a result (everything skipped, or nothing processed)
    NothingRan,
}

impl ExitStatus {
    /// Numeric process exit code
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::NothingRan => 2,
        }
    }
}

/// Sort results fastest first and decide the exit status.
///
/// The sort is stable: entries with equal throughput keep processing order.
/// The exit status depends only on whether any result exists, not on skips or
/// interruption.
pub fn finalize(outcome: RunOutcome, meta: ReportMeta) -> (Report, ExitStatus) {
    let RunOutcome {
        mut results,
        skips,
        interrupted,
    } = outcome;

    results.sort_by(|a, b| b.steps_per_sec().total_cmp(&a.steps_per_sec()));

    let status = if results.is_empty() {
        ExitStatus::NothingRan
    } else {
        ExitStatus::Success
    };
    let summary = ReportSummary::from_parts(&results, &skips);

    (
        Report {
            meta,
            results,
            skips,
            summary,
            interrupted,
        },
        status,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CoreBenchResult, CoreSkip, RunSettings, SkipReason, SystemInfo};
    use retrobench_core::{BenchmarkSpec, Measurement};

    fn meta() -> ReportMeta {
        ReportMeta {
            schema_version: 1,
            version: "test".to_string(),
            timestamp: chrono::Utc::now(),
            benchmark_spec: "benchmark.json".into(),
            settings: RunSettings {
                seconds: 5.0,
                warmup_steps: 30,
                screen: false,
                integrations: "all".to_string(),
                hw_render: false,
                n64_gfxplugin: None,
            },
            system: SystemInfo {
                os: "linux".to_string(),
                arch: "x86_64".to_string(),
                cpu: "test".to_string(),
                cpu_cores: 1,
                memory_gb: 1.0,
            },
        }
    }

    fn result(game: &str, steps: u64) -> CoreBenchResult {
        let spec = BenchmarkSpec::new("core", "Sys", game);
        CoreBenchResult::new(&spec, Measurement::new(steps, 1.0), false)
    }

    fn skip() -> CoreSkip {
        CoreSkip::new(
            "core",
            SkipReason::EngineFailure {
                game: "g".to_string(),
                cause: "boom".to_string(),
            },
        )
    }

    #[test]
    fn sorts_descending_and_stable() {
        let outcome = RunOutcome {
            results: vec![
                result("slow", 10),
                result("tie-a", 50),
                result("fast", 90),
                result("tie-b", 50),
            ],
            skips: vec![],
            interrupted: false,
        };
        let (report, status) = finalize(outcome, meta());
        let order: Vec<_> = report.results.iter().map(|r| r.game()).collect();
        assert_eq!(order, vec!["fast", "tie-a", "tie-b", "slow"]);
        assert_eq!(status, ExitStatus::Success);
    }

    #[test]
    fn nothing_ran_exits_two() {
        let (_, status) = finalize(RunOutcome::default(), meta());
        assert_eq!(status.code(), 2);

        let outcome = RunOutcome {
            results: vec![],
            skips: vec![skip(), skip()],
            interrupted: false,
        };
        let (report, status) = finalize(outcome, meta());
        assert_eq!(status, ExitStatus::NothingRan);
        assert_eq!(report.summary.skipped, 2);
    }

    #[test]
    fn one_result_exits_zero_despite_skips_and_interruption() {
        let outcome = RunOutcome {
            results: vec![result("only", 1)],
            skips: vec![skip()],
            interrupted: true,
        };
        let (report, status) = finalize(outcome, meta());
        assert_eq!(status.code(), 0);
        assert!(report.interrupted);
    }
}
