//! Seed derivation between the passes, and projection of both passes'
//! results onto method bodies.

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

use super::result_cache::ResultCache;
use crate::features::fact_model::{CriterionSets, StatementSequence};
use crate::features::icfg::BlockedIcfg;
use crate::features::ifds::IFDSSolverResult;
use crate::shared::models::{MethodId, PointId};

/// Top-down seeds from the bottom-up facts found at the entry method's start.
///
/// Without extension only complete criteria survive. With extension, facts
/// that are strict suffixes of another fact are dropped first; of the rest,
/// only facts ending with a whole criterion are kept.
pub fn derive_seeds(facts: &FxHashSet<StatementSequence>, sets: &CriterionSets) -> Vec<StatementSequence> {
    let mut seeds: Vec<StatementSequence> = if sets.has_extension() {
        facts
            .iter()
            .filter(|f| !facts.iter().any(|g| f.is_strict_suffix_of(g)))
            .filter(|f| {
                sets.criteria()
                    .iter()
                    .any(|c| c == *f || c.is_strict_suffix_of(f))
            })
            .cloned()
            .collect()
    } else {
        facts
            .iter()
            .filter(|f| sets.is_literal_criterion(f))
            .cloned()
            .collect()
    };
    seeds.sort();
    seeds
}

/// Kept statements per method, in body order.
///
/// `u` is kept when a completed match passes it inside the bottom-up region,
/// or when a fact waiting at `u` top-down was also built at `u` bottom-up.
pub fn project(
    icfg: &BlockedIcfg<'_>,
    bottom_up: &ResultCache,
    top_down: &IFDSSolverResult<StatementSequence>,
) -> BTreeMap<MethodId, Vec<PointId>> {
    let program = icfg.program();
    let mut methods = BTreeMap::new();
    for m in icfg.methods_with_bodies() {
        let kept: Vec<PointId> = program
            .method(m)
            .body
            .iter()
            .copied()
            .filter(|&u| keeps(u, bottom_up, top_down))
            .collect();
        if !kept.is_empty() {
            methods.insert(m, kept);
        }
    }
    methods
}

fn keeps(u: PointId, bottom_up: &ResultCache, top_down: &IFDSSolverResult<StatementSequence>) -> bool {
    let waiting = top_down.results_at(u);
    if waiting.is_empty() {
        return false;
    }
    let built = bottom_up.ifds_results_at(u);
    if built.is_empty() {
        return false;
    }
    waiting.iter().any(|t| t.is_epsilon()) || waiting.iter().any(|t| built.iter().any(|b| t.same_content(b)))
}
