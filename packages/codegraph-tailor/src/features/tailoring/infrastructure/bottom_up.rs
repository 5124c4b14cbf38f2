/*
 * Bottom-up pass
 *
 * Runs on the backward view from the end points of the entry method and
 * builds partial matches right to left: when execution (read backwards)
 * passes a criterion call site `r` whose registered followers include the
 * current fact, `r` is prepended.
 *
 * Backward roles (see `IcfgView`):
 * - call statement   = forward return site
 * - return site      = forward call statement `r`
 * - callee exit      = forward start point
 *
 * Return edges only flow back to `r` when `r` is a real forward caller of the
 * callee; edges introduced by the view itself are killed.
 */

use std::time::Instant;

use crate::features::fact_model::{CriterionSets, StatementSequence};
use crate::features::icfg::{BlockedIcfg, IcfgView};
use crate::features::ifds::{
    fact_set, flow_fn, FlowFunction, IFDSProblem, IFDSSolver, IFDSSolverResult,
    IdentityFlowFunction, KillFlowFunction,
};
use crate::shared::models::{MethodId, PointId};

pub struct BottomUpProblem<'p, 'a> {
    icfg: &'p BlockedIcfg<'a>,
    sets: &'p CriterionSets,
}

impl<'p, 'a> BottomUpProblem<'p, 'a> {
    pub fn new(icfg: &'p BlockedIcfg<'a>, sets: &'p CriterionSets) -> Self {
        Self { icfg, sets }
    }

    /// `{f}` plus `r·f` when `r` may extend the match headed by `f`
    fn extended(&self, r: PointId, f: &StatementSequence) -> bool {
        self.sets.has_extension() && self.sets.can_extend(r, f)
    }
}

impl IFDSProblem<StatementSequence> for BottomUpProblem<'_, '_> {
    fn initial_seeds(&self) -> Vec<(PointId, StatementSequence)> {
        let entry = self.icfg.entry_method();
        self.icfg
            .end_points_of(entry)
            .iter()
            .map(|&p| (p, StatementSequence::empty()))
            .collect()
    }

    fn normal_flow(&self, _curr: PointId, _succ: PointId) -> Box<dyn FlowFunction<StatementSequence> + '_> {
        Box::new(IdentityFlowFunction)
    }

    fn call_flow(&self, _call_site: PointId, _callee: MethodId) -> Box<dyn FlowFunction<StatementSequence> + '_> {
        Box::new(IdentityFlowFunction)
    }

    fn return_flow(
        &self,
        _call_site: PointId,
        callee: MethodId,
        _exit: PointId,
        return_site: PointId,
    ) -> Box<dyn FlowFunction<StatementSequence> + '_> {
        if !self.icfg.callers_of(callee).contains(&return_site) {
            return Box::new(KillFlowFunction);
        }
        if !self.sets.has_extension() {
            return Box::new(IdentityFlowFunction);
        }
        flow_fn(move |f: &StatementSequence| {
            if self.extended(return_site, f) {
                fact_set([f.clone(), f.add_head(return_site)])
            } else {
                fact_set([f.clone()])
            }
        })
    }

    fn call_to_return_flow(
        &self,
        _call_site: PointId,
        return_site: PointId,
    ) -> Box<dyn FlowFunction<StatementSequence> + '_> {
        let r = return_site;
        if !self.sets.is_criterion_point(r) {
            return Box::new(IdentityFlowFunction);
        }
        flow_fn(move |f: &StatementSequence| {
            if f.is_empty() {
                if self.sets.is_tail(r) {
                    fact_set([f.clone(), StatementSequence::from_points(vec![r])])
                } else {
                    fact_set([f.clone()])
                }
            } else if self.sets.can_add_head(r, f) || self.extended(r, f) {
                fact_set([f.clone(), f.add_head(r)])
            } else {
                fact_set([f.clone()])
            }
        })
    }
}

/// Solve the bottom-up problem on the backward view of `icfg`
pub fn solve_bottom_up(icfg: &BlockedIcfg<'_>, sets: &CriterionSets) -> IFDSSolverResult<StatementSequence> {
    let started = Instant::now();
    let problem = BottomUpProblem::new(icfg, sets);
    let view = IcfgView::backward(icfg);
    let result = IFDSSolver::new(&problem, &view).solve();
    tracing::info!(
        path_edges = result.statistics().num_path_edges,
        extension = sets.has_extension(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "bottom-up pass done"
    );
    result
}
