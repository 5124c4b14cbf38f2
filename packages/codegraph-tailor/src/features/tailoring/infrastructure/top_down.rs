/*
 * Top-down pass
 *
 * Runs forward from the first statement of the entry method, seeded with the
 * complete matches found bottom-up, and consumes them left to right: each
 * criterion call site pops its point off the head of a waiting fact, and the
 * last pop leaves `Epsilon`. The view is restricted to points the bottom-up
 * pass reached, so the walk never leaves the region where a match can still
 * complete.
 *
 * Calls to methods with bodies are analysed through the callee only; the
 * call-to-return edge is killed so facts cannot skip a callee.
 */

use std::time::Instant;

use crate::config::TailorConfig;
use crate::errors::{Result, TailorError};
use crate::features::fact_model::{CriterionSets, StatementSequence};
use crate::features::icfg::{BlockedIcfg, IcfgView};
use crate::features::ifds::{
    fact_set, flow_fn, FlowFunction, IFDSProblem, IFDSSolver, IFDSSolverResult,
    IdentityFlowFunction, KillFlowFunction,
};
use crate::shared::models::{MethodId, PointId};
use rustc_hash::FxHashSet;

pub struct TopDownProblem<'p, 'a> {
    icfg: &'p BlockedIcfg<'a>,
    sets: &'p CriterionSets,
    config: &'p TailorConfig,
    start: PointId,
    seeds: Vec<StatementSequence>,
}

impl<'p, 'a> TopDownProblem<'p, 'a> {
    /// Fails when the entry method has no body.
    pub fn new(
        icfg: &'p BlockedIcfg<'a>,
        sets: &'p CriterionSets,
        config: &'p TailorConfig,
        seeds: Vec<StatementSequence>,
    ) -> Result<Self> {
        let entry = icfg.entry_method();
        let start = icfg
            .program()
            .method(entry)
            .body
            .first()
            .copied()
            .ok_or_else(|| {
                TailorError::program(format!(
                    "entry method {} has no body",
                    icfg.program().method(entry).name
                ))
            })?;
        Ok(Self {
            icfg,
            sets,
            config,
            start,
            seeds,
        })
    }

    fn pop_matching(p: PointId) -> impl Fn(&StatementSequence) -> FxHashSet<StatementSequence> {
        move |f: &StatementSequence| {
            if f.head() == Some(p) {
                fact_set([f.remove_head()])
            } else {
                fact_set([f.clone()])
            }
        }
    }

    /// Some callee is analysed through its body
    fn enters_callee(&self, call: PointId) -> bool {
        let program = self.icfg.program();
        self.icfg.callees_of_call_at(call).into_iter().any(|m| {
            let method = program.method(m);
            method.has_body() && !self.config.is_static_initializer(&method.name)
        })
    }
}

impl IFDSProblem<StatementSequence> for TopDownProblem<'_, '_> {
    fn initial_seeds(&self) -> Vec<(PointId, StatementSequence)> {
        let mut seeds: Vec<(PointId, StatementSequence)> =
            self.seeds.iter().map(|f| (self.start, f.clone())).collect();
        seeds.push((self.start, StatementSequence::empty()));
        seeds
    }

    fn normal_flow(&self, _curr: PointId, _succ: PointId) -> Box<dyn FlowFunction<StatementSequence> + '_> {
        Box::new(IdentityFlowFunction)
    }

    fn call_flow(&self, call_site: PointId, _callee: MethodId) -> Box<dyn FlowFunction<StatementSequence> + '_> {
        if self.sets.has_extension() {
            flow_fn(Self::pop_matching(call_site))
        } else {
            Box::new(IdentityFlowFunction)
        }
    }

    fn return_flow(
        &self,
        _call_site: PointId,
        _callee: MethodId,
        _exit: PointId,
        _return_site: PointId,
    ) -> Box<dyn FlowFunction<StatementSequence> + '_> {
        Box::new(IdentityFlowFunction)
    }

    fn call_to_return_flow(
        &self,
        call_site: PointId,
        _return_site: PointId,
    ) -> Box<dyn FlowFunction<StatementSequence> + '_> {
        if self.sets.is_criterion_point(call_site) {
            flow_fn(Self::pop_matching(call_site))
        } else if self.enters_callee(call_site) {
            Box::new(KillFlowFunction)
        } else {
            Box::new(IdentityFlowFunction)
        }
    }
}

/// Solve the top-down problem on the forward view restricted to `reachable`
pub fn solve_top_down(
    icfg: &BlockedIcfg<'_>,
    sets: &CriterionSets,
    config: &TailorConfig,
    seeds: Vec<StatementSequence>,
    reachable: &FxHashSet<PointId>,
) -> Result<IFDSSolverResult<StatementSequence>> {
    let started = Instant::now();
    let seed_count = seeds.len();
    let problem = TopDownProblem::new(icfg, sets, config, seeds)?;
    let view = IcfgView::forward_restricted(icfg, reachable);
    let result = IFDSSolver::new(&problem, &view).solve();
    tracing::info!(
        seeds = seed_count,
        path_edges = result.statistics().num_path_edges,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "top-down pass done"
    );
    Ok(result)
}
