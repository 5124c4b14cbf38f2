/*
 * IFDS problem framework
 *
 * A problem is a seed set plus one flow-function factory per ICFG edge kind
 * (normal, call, return, call-to-return). Flow functions map one fact to a
 * set of facts and are distributive by construction.
 *
 * Problems never see concrete graphs: they are solved over an
 * `InterproceduralCfg`, so the tailoring passes run one solver over a
 * forward, a backward and a restricted forward view of the same ICFG.
 *
 * The zero fact is implicit. The solver adds it to the output of every flow
 * function applied to zero, so problems only describe what zero generates.
 *
 * Algorithm: Reps, Horwitz, Sagiv (1995), with the worklist and end-summary
 * tables of Naeem, Lhoták, Rodriguez (2010).
 */

use rustc_hash::FxHashSet;
use std::fmt::Debug;
use std::hash::Hash;

use crate::shared::models::{MethodId, PointId};

/// Element of the dataflow domain
pub trait DataflowFact: Clone + Eq + Hash + Debug {
    /// The distinguished zero fact (holds everywhere reachable)
    fn is_zero(&self) -> bool;

    fn zero() -> Self;
}

/// `D → 2^D`
pub trait FlowFunction<F: DataflowFact> {
    fn compute(&self, input: &F) -> FxHashSet<F>;
}

/// `d ↦ {d}`
pub struct IdentityFlowFunction;

impl<F: DataflowFact> FlowFunction<F> for IdentityFlowFunction {
    fn compute(&self, input: &F) -> FxHashSet<F> {
        fact_set([input.clone()])
    }
}

/// `d ↦ ∅` (zero still survives, see module docs)
pub struct KillFlowFunction;

impl<F: DataflowFact> FlowFunction<F> for KillFlowFunction {
    fn compute(&self, _input: &F) -> FxHashSet<F> {
        FxHashSet::default()
    }
}

/// Closure-backed flow function
pub struct FnFlowFunction<C>(pub C);

impl<F, C> FlowFunction<F> for FnFlowFunction<C>
where
    F: DataflowFact,
    C: Fn(&F) -> FxHashSet<F>,
{
    fn compute(&self, input: &F) -> FxHashSet<F> {
        (self.0)(input)
    }
}

/// Box a closure as a flow function; the closure may borrow the problem.
pub fn flow_fn<'a, F, C>(f: C) -> Box<dyn FlowFunction<F> + 'a>
where
    F: DataflowFact + 'a,
    C: Fn(&F) -> FxHashSet<F> + 'a,
{
    Box::new(FnFlowFunction(f))
}

pub fn fact_set<F: DataflowFact>(facts: impl IntoIterator<Item = F>) -> FxHashSet<F> {
    facts.into_iter().collect()
}

/// The graph a solver walks.
///
/// Orientation belongs to the implementation: a backward view swaps
/// successors with predecessors, start points with end points, and call
/// statements with return sites.
pub trait InterproceduralCfg {
    fn method_of(&self, n: PointId) -> MethodId;

    fn succs_of(&self, n: PointId) -> Vec<PointId>;

    fn callees_of_call_at(&self, n: PointId) -> Vec<MethodId>;

    fn callers_of(&self, m: MethodId) -> Vec<PointId>;

    fn start_points_of(&self, m: MethodId) -> Vec<PointId>;

    fn return_sites_of_call_at(&self, n: PointId) -> Vec<PointId>;

    fn is_call_stmt(&self, n: PointId) -> bool;

    fn is_exit_stmt(&self, n: PointId) -> bool;
}

/// `<sp, d1> → <n, d2>`: `d2` holds at `n` whenever `d1` held at the start
/// of `n`'s method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathEdge<F: DataflowFact> {
    pub source_fact: F,
    pub target_node: PointId,
    pub target_fact: F,
}

impl<F: DataflowFact> PathEdge<F> {
    pub fn new(source_fact: F, target_node: PointId, target_fact: F) -> Self {
        Self {
            source_fact,
            target_node,
            target_fact,
        }
    }
}

/// Seeds and flow functions of one analysis.
///
/// Returned flow functions may borrow the problem (`+ '_`).
pub trait IFDSProblem<F: DataflowFact> {
    /// `(point, fact)` pairs; zero is a valid seed fact
    fn initial_seeds(&self) -> Vec<(PointId, F)>;

    fn normal_flow(&self, curr: PointId, succ: PointId) -> Box<dyn FlowFunction<F> + '_>;

    /// Call statement into the callee's start points
    fn call_flow(&self, call_site: PointId, callee: MethodId) -> Box<dyn FlowFunction<F> + '_>;

    /// Callee exit back to one return site of `call_site`
    fn return_flow(
        &self,
        call_site: PointId,
        callee: MethodId,
        exit: PointId,
        return_site: PointId,
    ) -> Box<dyn FlowFunction<F> + '_>;

    /// Around the callee, from the call statement to a return site
    fn call_to_return_flow(
        &self,
        call_site: PointId,
        return_site: PointId,
    ) -> Box<dyn FlowFunction<F> + '_>;
}

/// Counters collected by one solver run
#[derive(Debug, Clone, Default)]
pub struct IFDSStatistics {
    /// Distinct `(n, d1, d2)` triples at the fixpoint
    pub num_path_edges: usize,

    /// Distinct `(exit, d2)` summaries over all callee contexts
    pub num_summary_edges: usize,

    /// Calls answered from an existing summary instead of re-entering
    pub num_summary_reuses: usize,

    pub num_iterations: usize,

    pub analysis_time_ms: u64,
}
