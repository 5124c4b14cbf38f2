//! Intraprocedural cycles: back edges, natural loops, loop exits
//!
//! A back edge `(n, d)` has `d` dominating `n` (self loops included).
//! Cutting it and redirecting `n` to the loop's exits makes the body
//! acyclic while keeping every statement reachable.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::no_exception_graph::{DominatorTree, NoExceptionGraph};
use crate::shared::models::{MethodId, PointId, PointKind};
use crate::shared::ports::ProgramGraph;

/// Loops of one method
#[derive(Debug, Clone, Default)]
pub struct MethodLoops {
    /// Back edges in discovery order
    pub back_edges: Vec<(PointId, PointId)>,
    /// Header → merged natural loop nodes
    pub loops: FxHashMap<PointId, FxHashSet<PointId>>,
    /// Header → exit set, outer headers replaced by their own exits
    pub exits: FxHashMap<PointId, FxHashSet<PointId>>,
    /// Back edge → redirection targets
    pub redirections: FxHashMap<(PointId, PointId), FxHashSet<PointId>>,
}

impl MethodLoops {
    pub fn loop_nodes(&self) -> FxHashSet<PointId> {
        self.loops.values().flatten().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.back_edges.is_empty()
    }
}

pub fn find_back_edges(graph: &NoExceptionGraph, dom: &DominatorTree) -> Vec<(PointId, PointId)> {
    let mut back_edges = Vec::new();
    for n in graph.nodes() {
        for d in graph.succs(n) {
            if dom.dominates(d, n) {
                back_edges.push((n, d));
            }
        }
    }
    back_edges
}

/// `{n, d}` plus everything reaching `n` backwards without passing `d`
pub fn natural_loop(graph: &NoExceptionGraph, (source, header): (PointId, PointId)) -> FxHashSet<PointId> {
    let mut visited: FxHashSet<PointId> = [source, header].into_iter().collect();
    let mut queue = VecDeque::from([source]);
    while let Some(n) = queue.pop_front() {
        if n == header {
            continue;
        }
        for pred in graph.preds(n) {
            if visited.insert(pred) {
                queue.push_back(pred);
            }
        }
    }
    visited
}

fn is_catch(program: &dyn ProgramGraph, p: PointId) -> bool {
    matches!(program.point(p).kind, PointKind::CatchEntry)
}

/// Loop structure of one method body
pub fn find_method_loops(program: &dyn ProgramGraph, method: MethodId) -> MethodLoops {
    let graph = NoExceptionGraph::build(program, method);
    let Some(dom) = graph.dominators() else {
        return MethodLoops::default();
    };

    let back_edges = find_back_edges(&graph, &dom);
    let mut loops: FxHashMap<PointId, FxHashSet<PointId>> = FxHashMap::default();
    for &edge in &back_edges {
        if !is_catch(program, edge.1) {
            loops.entry(edge.1).or_default().extend(natural_loop(&graph, edge));
        }
    }

    let mut exits = FxHashMap::default();
    let headers: Vec<PointId> = loops.keys().copied().collect();
    for header in headers {
        let mut in_progress = FxHashSet::default();
        exits_of_loop(header, &graph, &dom, &loops, &mut exits, &mut in_progress);
    }

    let mut redirections = FxHashMap::default();
    for &(n, d) in &back_edges {
        let targets = if is_catch(program, d) {
            FxHashSet::default()
        } else {
            exits.get(&d).cloned().unwrap_or_default()
        };
        tracing::debug!(method = %method, from = %n, to = %d, exits = targets.len(), "back edge");
        redirections.insert((n, d), targets);
    }

    MethodLoops {
        back_edges,
        loops,
        exits,
        redirections,
    }
}

fn exits_of_loop(
    header: PointId,
    graph: &NoExceptionGraph,
    dom: &DominatorTree,
    loops: &FxHashMap<PointId, FxHashSet<PointId>>,
    memo: &mut FxHashMap<PointId, FxHashSet<PointId>>,
    in_progress: &mut FxHashSet<PointId>,
) -> FxHashSet<PointId> {
    if let Some(done) = memo.get(&header) {
        return done.clone();
    }
    let Some(nodes) = loops.get(&header) else {
        return FxHashSet::default();
    };
    if !in_progress.insert(header) {
        return FxHashSet::default();
    }

    let mut exits: FxHashSet<PointId> = nodes
        .iter()
        .flat_map(|&n| graph.succs(n))
        .filter(|s| !nodes.contains(s))
        .collect();

    // leaving an inner loop through an outer header continues the outer loop
    let outer_heads: Vec<PointId> = exits
        .iter()
        .copied()
        .filter(|&e| dom.dominates(e, header))
        .collect();
    for outer in outer_heads {
        exits.remove(&outer);
        exits.extend(exits_of_loop(outer, graph, dom, loops, memo, in_progress));
    }

    in_progress.remove(&header);
    memo.insert(header, exits.clone());
    exits
}

/// Loops of every method with a body, keyed by method
#[derive(Debug, Clone, Default)]
pub struct IntraCycles {
    per_method: FxHashMap<MethodId, MethodLoops>,
}

impl IntraCycles {
    pub fn find(program: &dyn ProgramGraph) -> Self {
        let methods: Vec<MethodId> = program
            .methods()
            .iter()
            .filter(|m| m.has_body())
            .map(|m| m.id)
            .collect();

        #[cfg(feature = "parallel")]
        let found: Vec<(MethodId, MethodLoops)> = methods
            .par_iter()
            .map(|&m| (m, find_method_loops(program, m)))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let found: Vec<(MethodId, MethodLoops)> = methods
            .iter()
            .map(|&m| (m, find_method_loops(program, m)))
            .collect();

        let per_method: FxHashMap<MethodId, MethodLoops> =
            found.into_iter().filter(|(_, l)| !l.is_empty()).collect();
        tracing::info!(
            methods_with_loops = per_method.len(),
            back_edges = per_method.values().map(|l| l.back_edges.len()).sum::<usize>(),
            "intraprocedural cycles found"
        );
        Self { per_method }
    }

    pub fn of_method(&self, m: MethodId) -> Option<&MethodLoops> {
        self.per_method.get(&m)
    }

    /// Back edge → redirection targets, across all methods
    pub fn redirections(
        &self,
    ) -> impl Iterator<Item = (&(PointId, PointId), &FxHashSet<PointId>)> + '_ {
        self.per_method.values().flat_map(|l| l.redirections.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.per_method.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Program, ProgramBuilder};
    use pretty_assertions::assert_eq;

    fn sorted(set: &FxHashSet<PointId>) -> Vec<PointId> {
        let mut v: Vec<_> = set.iter().copied().collect();
        v.sort();
        v
    }

    /// 0 → 1(header) → 2 → 3 → 1, 1 → 4(exit)
    fn single_loop() -> (Program, MethodId, Vec<PointId>) {
        let mut b = ProgramBuilder::new();
        let cls = b.class("app.Main");
        let main = b.static_method(cls, "main");
        let p: Vec<PointId> = (0..5).map(|i| b.plain(main, i)).collect();
        b.chain(&[p[0], p[1], p[2], p[3], p[1]]);
        b.edge(p[1], p[4]);
        b.entry(main);
        (b.build().unwrap(), main, p)
    }

    #[test]
    fn test_single_back_edge() {
        let (program, main, p) = single_loop();
        let loops = find_method_loops(&program, main);
        assert_eq!(loops.back_edges, vec![(p[3], p[1])]);
        assert_eq!(sorted(&loops.loops[&p[1]]), vec![p[1], p[2], p[3]]);
        assert_eq!(sorted(&loops.exits[&p[1]]), vec![p[4]]);
        assert_eq!(sorted(&loops.redirections[&(p[3], p[1])]), vec![p[4]]);
    }

    #[test]
    fn test_self_loop_is_back_edge() {
        let mut b = ProgramBuilder::new();
        let cls = b.class("app.Main");
        let main = b.static_method(cls, "main");
        let a = b.plain(main, 1);
        let spin = b.plain(main, 2);
        let out = b.plain(main, 3);
        b.chain(&[a, spin, spin]);
        b.edge(spin, out);
        b.entry(main);
        let program = b.build().unwrap();

        let loops = find_method_loops(&program, main);
        assert_eq!(loops.back_edges, vec![(spin, spin)]);
        assert_eq!(sorted(&loops.redirections[&(spin, spin)]), vec![out]);
    }

    #[test]
    fn test_nested_loop_exit_through_outer_header() {
        // 0 → 1(outer) → 2(inner) → 3 → 2; 3 → 1; 1 → 4
        let mut b = ProgramBuilder::new();
        let cls = b.class("app.Main");
        let main = b.static_method(cls, "main");
        let p: Vec<PointId> = (0..5).map(|i| b.plain(main, i)).collect();
        b.chain(&[p[0], p[1], p[2], p[3], p[2]]);
        b.edge(p[3], p[1]);
        b.edge(p[1], p[4]);
        b.entry(main);
        let program = b.build().unwrap();

        let loops = find_method_loops(&program, main);
        assert_eq!(loops.back_edges.len(), 2);
        // the inner loop leaves through the outer header, which is replaced
        // by the outer loop's exits
        assert_eq!(sorted(&loops.exits[&p[2]]), vec![p[4]]);
        assert_eq!(sorted(&loops.exits[&p[1]]), vec![p[4]]);
    }

    #[test]
    fn test_acyclic_method_has_no_loops() {
        let mut b = ProgramBuilder::new();
        let cls = b.class("app.Main");
        let main = b.static_method(cls, "main");
        let a = b.plain(main, 1);
        let c = b.plain(main, 2);
        b.chain(&[a, c]);
        b.entry(main);
        let program = b.build().unwrap();

        assert!(find_method_loops(&program, main).is_empty());
        assert!(IntraCycles::find(&program).is_empty());
    }

    #[test]
    fn test_all_methods() {
        let (program, main, p) = single_loop();
        let cycles = IntraCycles::find(&program);
        assert!(cycles.of_method(main).is_some());
        let redirections: Vec<_> = cycles.redirections().map(|(e, _)| *e).collect();
        assert_eq!(redirections, vec![(p[3], p[1])]);
    }
}
