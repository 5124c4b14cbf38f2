/*
 * No-Exception Graph
 *
 * Normal-flow subgraph of one method body, rooted at its unique non-catch
 * head. Exceptional edges blur loop and branch structure, so both the
 * cycle finder and the branch tagger work on this view.
 *
 * Dominators and post-dominators come from petgraph (Cooper et al.
 * "simple fast" algorithm); post-dominators use the reversed graph with a
 * virtual exit wired to every tail.
 */

use petgraph::algo::dominators::{simple_fast, Dominators};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Reversed;
use petgraph::Direction;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::shared::models::{MethodId, PointId, PointKind};
use crate::shared::ports::ProgramGraph;

/// Sentinel node standing for "after every tail"
const VIRTUAL_EXIT: PointId = PointId(u32::MAX);

#[derive(Debug, Clone)]
pub struct NoExceptionGraph {
    method: MethodId,
    head: Option<PointId>,
    graph: DiGraphMap<PointId, ()>,
}

impl NoExceptionGraph {
    pub fn build(program: &dyn ProgramGraph, method: MethodId) -> Self {
        let candidates: Vec<PointId> = program
            .start_points_of(method)
            .iter()
            .copied()
            .filter(|&p| {
                !matches!(
                    program.point(p).kind,
                    PointKind::CatchEntry | PointKind::Nop
                )
            })
            .collect();
        if candidates.len() > 1 {
            tracing::warn!(
                method = %method,
                heads = candidates.len(),
                "multiple normal-flow heads, using the first"
            );
        }
        let head = candidates.first().copied();

        let mut graph = DiGraphMap::new();
        if let Some(h) = head {
            graph.add_node(h);
            let mut queue = VecDeque::from([h]);
            while let Some(n) = queue.pop_front() {
                for &s in program.normal_succs_of(n) {
                    if !graph.contains_node(s) {
                        graph.add_node(s);
                        queue.push_back(s);
                    }
                    graph.add_edge(n, s, ());
                }
            }
        }

        Self {
            method,
            head,
            graph,
        }
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    pub fn head(&self) -> Option<PointId> {
        self.head
    }

    pub fn contains(&self, p: PointId) -> bool {
        self.graph.contains_node(p)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Nodes in discovery (BFS) order
    pub fn nodes(&self) -> impl Iterator<Item = PointId> + '_ {
        self.graph.nodes()
    }

    pub fn succs(&self, p: PointId) -> impl Iterator<Item = PointId> + '_ {
        self.graph.neighbors_directed(p, Direction::Outgoing)
    }

    pub fn preds(&self, p: PointId) -> impl Iterator<Item = PointId> + '_ {
        self.graph.neighbors_directed(p, Direction::Incoming)
    }

    pub fn tails(&self) -> Vec<PointId> {
        self.graph
            .nodes()
            .filter(|&n| self.succs(n).next().is_none())
            .collect()
    }

    pub fn dominators(&self) -> Option<DominatorTree> {
        let head = self.head?;
        Some(DominatorTree {
            doms: simple_fast(&self.graph, head),
        })
    }

    /// Post-dominator tree rooted at a virtual exit. `None` for graphs
    /// without a head.
    pub fn post_dominators(&self) -> Option<DominatorTree> {
        self.head?;
        let mut extended = self.graph.clone();
        for tail in self.tails() {
            extended.add_edge(tail, VIRTUAL_EXIT, ());
        }
        // infinite loops without tails still need the exit in the graph
        extended.add_node(VIRTUAL_EXIT);
        Some(DominatorTree {
            doms: simple_fast(Reversed(&extended), VIRTUAL_EXIT),
        })
    }
}

/// Dominator (or post-dominator) relation over points
#[derive(Debug, Clone)]
pub struct DominatorTree {
    doms: Dominators<PointId>,
}

impl DominatorTree {
    /// `a` dominates `b` (reflexive). False when `b` is unreachable.
    pub fn dominates(&self, a: PointId, b: PointId) -> bool {
        match self.doms.dominators(b) {
            Some(mut chain) => chain.any(|d| d == a),
            None => false,
        }
    }

    /// All dominators of `n` including `n`, virtual exit excluded
    pub fn dominators_of(&self, n: PointId) -> Vec<PointId> {
        self.doms
            .dominators(n)
            .map(|chain| chain.filter(|&d| d != VIRTUAL_EXIT).collect())
            .unwrap_or_default()
    }

    pub fn dominator_set(&self, n: PointId) -> FxHashSet<PointId> {
        self.dominators_of(n).into_iter().collect()
    }

    pub fn immediate_dominator(&self, n: PointId) -> Option<PointId> {
        self.doms
            .immediate_dominator(n)
            .filter(|&d| d != VIRTUAL_EXIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Program, ProgramBuilder};

    /// 0 → 1 → {2, 3} → 4, plus a handler reached exceptionally from 1
    fn diamond() -> (Program, MethodId, Vec<PointId>) {
        let mut b = ProgramBuilder::new();
        let cls = b.class("app.Main");
        let main = b.static_method(cls, "main");
        let p: Vec<PointId> = (0..5).map(|i| b.plain(main, i)).collect();
        let handler = b.catch_entry(main, 9);
        b.chain(&[p[0], p[1], p[2], p[4]]);
        b.chain(&[p[1], p[3], p[4]]);
        b.exceptional_edge(p[1], handler);
        b.entry(main);
        (b.build().unwrap(), main, p)
    }

    #[test]
    fn test_excludes_handlers() {
        let (program, main, p) = diamond();
        let g = NoExceptionGraph::build(&program, main);
        assert_eq!(g.head(), Some(p[0]));
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.tails(), vec![p[4]]);
    }

    #[test]
    fn test_dominators_and_post_dominators() {
        let (program, main, p) = diamond();
        let g = NoExceptionGraph::build(&program, main);
        let dom = g.dominators().unwrap();
        assert!(dom.dominates(p[1], p[4]));
        assert!(!dom.dominates(p[2], p[4]));
        assert_eq!(dom.immediate_dominator(p[4]), Some(p[1]));
        assert_eq!(dom.dominators_of(p[2]).len(), 3);

        let pdom = g.post_dominators().unwrap();
        assert!(pdom.dominates(p[4], p[1]));
        assert!(!pdom.dominates(p[2], p[1]));
        assert_eq!(pdom.dominators_of(p[4]), vec![p[4]]);
    }

    #[test]
    fn test_infinite_loop_post_dominators() {
        let mut b = ProgramBuilder::new();
        let cls = b.class("app.Main");
        let main = b.static_method(cls, "main");
        let a = b.plain(main, 1);
        let c = b.plain(main, 2);
        b.chain(&[a, c, a]);
        b.entry(main);
        let program = b.build().unwrap();

        let g = NoExceptionGraph::build(&program, main);
        assert!(g.tails().is_empty());
        let pdom = g.post_dominators().unwrap();
        // nothing reaches the virtual exit
        assert!(pdom.dominators_of(a).is_empty());
    }
}
