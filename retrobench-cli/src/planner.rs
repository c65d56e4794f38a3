//! Benchmark Planner
//!
//! Builds the execution plan from the declared entries.
//!
//! Filtering: optional regex matched against `core_lib/system/game`.
//!
//! Ordering: declaration order is kept. Entries are never reordered, since
//! the order is part of what the operator declared.

use regex::Regex;
use retrobench_core::BenchmarkSpec;

/// Execution plan for benchmarks
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    /// Entries to run, in declaration order
    pub specs: Vec<BenchmarkSpec>,
    /// Entries removed by the filter
    pub filtered_out: usize,
}

/// Build execution plan from declared entries
pub fn build_plan(specs: Vec<BenchmarkSpec>, filter: Option<&Regex>) -> ExecutionPlan {
    let total = specs.len();
    let selected: Vec<_> = specs
        .into_iter()
        .filter(|spec| filter.is_none_or(|re| re.is_match(&spec.id())))
        .collect();

    ExecutionPlan {
        filtered_out: total - selected.len(),
        specs: selected,
    }
}
