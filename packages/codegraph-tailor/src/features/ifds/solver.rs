/*
 * IFDS Tabulation Algorithm (Solver)
 *
 * Worklist-based tabulation in the style of Naeem, Lhoták, Rodriguez (2010):
 * 1. Seed the worklist with (ZERO, seed_node, seed_fact)
 * 2. Pop path edge (d1, n, d2)
 * 3. Dispatch on n:
 *    - call statement: enter callees (call flow), record incoming edges,
 *      apply existing end summaries, pass through (call-to-return flow)
 *    - exit statement: record end summary, return to every recorded
 *      caller context (return flow)
 *    - otherwise: propagate to CFG successors (normal flow)
 * 4. Repeat until worklist empty (fixpoint)
 *
 * ZERO is propagated implicitly. Results exclude ZERO.
 */

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::time::Instant;

use super::framework::{
    DataflowFact, FlowFunction, IFDSProblem, IFDSStatistics, InterproceduralCfg, PathEdge,
};
use crate::shared::models::{MethodId, PointId};

/// IFDS Solver
///
/// Usage:
/// ```text
/// let result = IFDSSolver::new(&problem, &icfg).solve();
/// let facts = result.results_at(point);
/// ```
pub struct IFDSSolver<'a, F, P, I>
where
    F: DataflowFact,
    P: IFDSProblem<F>,
    I: InterproceduralCfg,
{
    problem: &'a P,
    icfg: &'a I,

    /// Path edges: n → d2 → {d1}
    /// "If d1 holds at the method start, then d2 holds at n"
    path_edges: FxHashMap<PointId, FxHashMap<F, FxHashSet<F>>>,

    /// Incoming: (start point, d3) → call site → {d2 at call site}
    incoming: FxHashMap<(PointId, F), FxHashMap<PointId, FxHashSet<F>>>,

    /// End summaries: (start point, d1) → {(exit, d2)}
    end_summary: FxHashMap<(PointId, F), FxHashSet<(PointId, F)>>,

    /// Worklist of path edges to process
    worklist: VecDeque<PathEdge<F>>,

    stats: IFDSStatistics,
}

impl<'a, F, P, I> IFDSSolver<'a, F, P, I>
where
    F: DataflowFact,
    P: IFDSProblem<F>,
    I: InterproceduralCfg,
{
    pub fn new(problem: &'a P, icfg: &'a I) -> Self {
        Self {
            problem,
            icfg,
            path_edges: FxHashMap::default(),
            incoming: FxHashMap::default(),
            end_summary: FxHashMap::default(),
            worklist: VecDeque::new(),
            stats: IFDSStatistics::default(),
        }
    }

    /// Solve the IFDS problem
    pub fn solve(mut self) -> IFDSSolverResult<F> {
        let start_time = Instant::now();

        for (node, fact) in self.problem.initial_seeds() {
            self.propagate(F::zero(), node, fact);
        }

        while let Some(edge) = self.worklist.pop_front() {
            self.stats.num_iterations += 1;
            self.process_path_edge(edge);
        }

        self.stats.num_path_edges = self
            .path_edges
            .values()
            .flat_map(|facts| facts.values())
            .map(|sources| sources.len())
            .sum();
        self.stats.num_summary_edges = self.end_summary.values().map(|s| s.len()).sum();
        self.stats.analysis_time_ms = start_time.elapsed().as_millis() as u64;

        tracing::debug!(
            path_edges = self.stats.num_path_edges,
            summaries = self.stats.num_summary_edges,
            iterations = self.stats.num_iterations,
            "IFDS fixpoint reached"
        );

        IFDSSolverResult {
            path_edges: self.path_edges,
            stats: self.stats,
        }
    }

    /// Apply a flow function, keeping ZERO alive
    fn apply(flow: &dyn FlowFunction<F>, fact: &F) -> FxHashSet<F> {
        let mut out = flow.compute(fact);
        if fact.is_zero() {
            out.insert(F::zero());
        }
        out
    }

    fn process_path_edge(&mut self, edge: PathEdge<F>) {
        let PathEdge {
            source_fact: d1,
            target_node: n,
            target_fact: d2,
        } = edge;

        if self.icfg.is_call_stmt(n) {
            self.process_call(&d1, n, &d2);
        } else {
            // throw-like statements can be both exits and normal statements
            if self.icfg.is_exit_stmt(n) {
                self.process_exit(&d1, n, &d2);
            }
            self.process_normal(&d1, n, &d2);
        }
    }

    fn process_normal(&mut self, d1: &F, n: PointId, d2: &F) {
        for m in self.icfg.succs_of(n) {
            let flow = self.problem.normal_flow(n, m);
            let targets = Self::apply(flow.as_ref(), d2);
            drop(flow);
            for d3 in targets {
                self.propagate(d1.clone(), m, d3);
            }
        }
    }

    fn process_call(&mut self, d1: &F, n: PointId, d2: &F) {
        let return_sites = self.icfg.return_sites_of_call_at(n);

        for callee in self.icfg.callees_of_call_at(n) {
            let flow = self.problem.call_flow(n, callee);
            let targets = Self::apply(flow.as_ref(), d2);
            drop(flow);

            for sp in self.icfg.start_points_of(callee) {
                for d3 in &targets {
                    self.propagate(d3.clone(), sp, d3.clone());

                    self.incoming
                        .entry((sp, d3.clone()))
                        .or_default()
                        .entry(n)
                        .or_default()
                        .insert(d2.clone());

                    let summaries: Vec<(PointId, F)> = self
                        .end_summary
                        .get(&(sp, d3.clone()))
                        .map(|s| s.iter().cloned().collect())
                        .unwrap_or_default();
                    for (exit, d4) in summaries {
                        self.stats.num_summary_reuses += 1;
                        for &ret in &return_sites {
                            let flow = self.problem.return_flow(n, callee, exit, ret);
                            let returned = Self::apply(flow.as_ref(), &d4);
                            drop(flow);
                            for d5 in returned {
                                self.propagate(d1.clone(), ret, d5);
                            }
                        }
                    }
                }
            }
        }

        for ret in return_sites {
            let flow = self.problem.call_to_return_flow(n, ret);
            let targets = Self::apply(flow.as_ref(), d2);
            drop(flow);
            for d3 in targets {
                self.propagate(d1.clone(), ret, d3);
            }
        }
    }

    fn process_exit(&mut self, d1: &F, n: PointId, d2: &F) {
        let method: MethodId = self.icfg.method_of(n);

        for sp in self.icfg.start_points_of(method) {
            let key = (sp, d1.clone());
            self.end_summary
                .entry(key.clone())
                .or_default()
                .insert((n, d2.clone()));

            let callers: Vec<(PointId, Vec<F>)> = self
                .incoming
                .get(&key)
                .map(|inc| {
                    inc.iter()
                        .map(|(c, ds)| (*c, ds.iter().cloned().collect()))
                        .collect()
                })
                .unwrap_or_default();

            for (call_site, caller_facts) in callers {
                for ret in self.icfg.return_sites_of_call_at(call_site) {
                    let flow = self.problem.return_flow(call_site, method, n, ret);
                    let targets = Self::apply(flow.as_ref(), d2);
                    drop(flow);

                    for d4 in &caller_facts {
                        let caller_sources: Vec<F> = self
                            .path_edges
                            .get(&call_site)
                            .and_then(|facts| facts.get(d4))
                            .map(|s| s.iter().cloned().collect())
                            .unwrap_or_default();
                        for d3 in &caller_sources {
                            for d5 in &targets {
                                self.propagate(d3.clone(), ret, d5.clone());
                            }
                        }
                    }
                }
            }
        }
    }

    /// Add path edge to worklist (if new)
    fn propagate(&mut self, d1: F, n: PointId, d2: F) {
        let sources = self
            .path_edges
            .entry(n)
            .or_default()
            .entry(d2.clone())
            .or_default();
        if sources.insert(d1.clone()) {
            self.worklist.push_back(PathEdge::new(d1, n, d2));
        }
    }
}

/// IFDS Solver Result
pub struct IFDSSolverResult<F: DataflowFact> {
    /// n → d2 → {d1}
    path_edges: FxHashMap<PointId, FxHashMap<F, FxHashSet<F>>>,

    pub stats: IFDSStatistics,
}

impl<F: DataflowFact> IFDSSolverResult<F> {
    /// Facts holding at `n`, ZERO excluded
    pub fn results_at(&self, n: PointId) -> FxHashSet<F> {
        self.path_edges
            .get(&n)
            .map(|facts| facts.keys().filter(|d| !d.is_zero()).cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_fact_at_node(&self, n: PointId, fact: &F) -> bool {
        self.path_edges
            .get(&n)
            .is_some_and(|facts| facts.contains_key(fact))
    }

    /// Nodes reached with any fact, ZERO included
    pub fn visited_points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.path_edges.keys().copied()
    }

    pub fn statistics(&self) -> &IFDSStatistics {
        &self.stats
    }
}
