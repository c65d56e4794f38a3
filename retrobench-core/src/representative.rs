//! Representative workload selection
//!
//! Benchmarking every installed game is pointless: one workload per system is
//! enough to characterize a core, and one system per core library is enough to
//! rank the libraries.

use crate::registry::SystemRegistry;
use crate::{BenchmarkSpec, Candidate};
use std::collections::BTreeMap;

/// First installed workload per system. Input order decides ties.
pub fn pick_representatives(candidates: &[Candidate]) -> BTreeMap<String, Candidate> {
    let mut picked: BTreeMap<String, Candidate> = BTreeMap::new();
    for candidate in candidates {
        picked
            .entry(candidate.system.clone())
            .or_insert_with(|| candidate.clone());
    }
    picked
}

/// One spec per core library, using its first system (sorted) that has a
/// representative. Libraries with no installed workload are left out.
pub fn plan_representative_specs(
    registry: &dyn SystemRegistry,
    candidates: &[Candidate],
) -> Vec<BenchmarkSpec> {
    let representatives = pick_representatives(candidates);

    registry
        .group_systems_by_lib()
        .into_iter()
        .filter_map(|(core_lib, systems)| {
            let candidate = systems.iter().find_map(|s| representatives.get(s))?;
            Some(BenchmarkSpec::new(
                core_lib,
                candidate.system.clone(),
                candidate.game.clone(),
            ))
        })
        .collect()
}
