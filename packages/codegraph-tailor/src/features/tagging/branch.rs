//! Branch tagging
//!
//! Works on basic blocks of the normal-flow graph. A block is in a branch
//! when some dominating decision block it does not post-dominate has
//! another successor that does not merely lead back to it. Nested and
//! chained branches are handled by walking up through the enclosing
//! decision blocks. Every statement of a branch block is tagged.

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use super::tag_table::{Tag, TagTable};
use crate::features::cycle_analysis::NoExceptionGraph;
use crate::shared::models::{MethodId, PointId};
use crate::shared::ports::ProgramGraph;

/// Straight-line runs of a `NoExceptionGraph`, each keyed by its leader
struct BlockGraph {
    graph: DiGraphMap<PointId, ()>,
    members: FxHashMap<PointId, Vec<PointId>>,
    leader_of: FxHashMap<PointId, PointId>,
}

impl BlockGraph {
    fn build(points: &NoExceptionGraph) -> Self {
        let head = points.head();
        // a point starts a block unless it is the only successor of its
        // only predecessor
        let is_leader = |n: PointId| {
            if Some(n) == head {
                return true;
            }
            let mut preds = points.preds(n);
            match (preds.next(), preds.next()) {
                (Some(p), None) => points.succs(p).count() != 1,
                _ => true,
            }
        };

        let mut graph = DiGraphMap::new();
        let mut members = FxHashMap::default();
        let mut leader_of = FxHashMap::default();
        for leader in points.nodes().filter(|&n| is_leader(n)) {
            graph.add_node(leader);
            let mut block = vec![leader];
            let mut cur = leader;
            loop {
                let mut succs = points.succs(cur);
                match (succs.next(), succs.next()) {
                    (Some(next), None) if !is_leader(next) => {
                        block.push(next);
                        cur = next;
                    }
                    _ => break,
                }
            }
            for &p in &block {
                leader_of.insert(p, leader);
            }
            members.insert(leader, block);
        }

        let leaders: Vec<PointId> = graph.nodes().collect();
        for leader in leaders {
            let Some(&last) = members.get(&leader).and_then(|b| b.last()) else {
                continue;
            };
            for s in points.succs(last) {
                if let Some(&target) = leader_of.get(&s) {
                    graph.add_edge(leader, target, ());
                }
            }
        }

        Self {
            graph,
            members,
            leader_of,
        }
    }

    fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    fn blocks(&self) -> impl Iterator<Item = PointId> + '_ {
        self.graph.nodes()
    }

    fn succs(&self, b: PointId) -> impl Iterator<Item = PointId> + '_ {
        self.graph.neighbors_directed(b, Direction::Outgoing)
    }

    fn preds(&self, b: PointId) -> impl Iterator<Item = PointId> + '_ {
        self.graph.neighbors_directed(b, Direction::Incoming)
    }

    fn members(&self, b: PointId) -> &[PointId] {
        self.members.get(&b).map(Vec::as_slice).unwrap_or(&[])
    }

    fn leader_of(&self, p: PointId) -> Option<PointId> {
        self.leader_of.get(&p).copied()
    }
}

struct BranchContext<'g> {
    blocks: &'g BlockGraph,
    /// block → blocks it strictly dominates
    dominated: FxHashMap<PointId, FxHashSet<PointId>>,
    /// block → blocks it strictly post-dominates
    post_dominated: FxHashMap<PointId, FxHashSet<PointId>>,
}

impl BranchContext<'_> {
    fn dominates(&self, a: PointId, b: PointId) -> bool {
        self.dominated.get(&a).is_some_and(|s| s.contains(&b))
    }

    fn post_dominates(&self, a: PointId, b: PointId) -> bool {
        self.post_dominated.get(&a).is_some_and(|s| s.contains(&b))
    }

    fn count(map: &FxHashMap<PointId, FxHashSet<PointId>>, n: PointId) -> usize {
        map.get(&n).map_or(0, |s| s.len())
    }

    fn is_branch_block(&self, n: PointId) -> bool {
        let size = self.blocks.block_count();
        if Self::count(&self.dominated, n) + Self::count(&self.post_dominated, n) + 1 >= size {
            return false;
        }
        let n_succs: Vec<PointId> = self.blocks.succs(n).collect();
        let mut branch = self.lowest_branch(n);
        while let Some(b) = branch {
            let found = self.blocks.succs(b).any(|other| {
                other != n && !self.dominates(other, n) && !n_succs.contains(&other)
            });
            if found {
                return true;
            }
            branch = self.lowest_branch(b);
        }
        false
    }

    /// Nearest predecessor (BFS) that dominates `n` and is not
    /// post-dominated by it
    fn lowest_branch(&self, n: PointId) -> Option<PointId> {
        let mut queue: VecDeque<PointId> = self.blocks.preds(n).collect();
        let mut visited = FxHashSet::default();
        while let Some(node) = queue.pop_front() {
            if node == n || !visited.insert(node) {
                continue;
            }
            if self.dominates(node, n) && !self.post_dominates(n, node) {
                return Some(node);
            }
            queue.extend(self.blocks.preds(node));
        }
        None
    }
}

/// Strict (post-)dominance between blocks, lifted from the point-level
/// trees: block `a` dominates block `b` iff some point of `a` dominates the
/// leader of `b`.
fn lift(
    blocks: &BlockGraph,
    dominators_of: impl Fn(PointId) -> Vec<PointId>,
) -> FxHashMap<PointId, FxHashSet<PointId>> {
    let mut lifted: FxHashMap<PointId, FxHashSet<PointId>> = FxHashMap::default();
    for n in blocks.blocks() {
        for d in dominators_of(n).into_iter().filter_map(|d| blocks.leader_of(d)) {
            if d != n {
                lifted.entry(d).or_default().insert(n);
            }
        }
    }
    lifted
}

/// Statements of `method` inside a branch block, in graph order
pub fn find_branch_points(program: &dyn ProgramGraph, method: MethodId) -> Vec<PointId> {
    let graph = NoExceptionGraph::build(program, method);
    let (Some(dom), Some(pdom)) = (graph.dominators(), graph.post_dominators()) else {
        return Vec::new();
    };

    let blocks = BlockGraph::build(&graph);
    let ctx = BranchContext {
        blocks: &blocks,
        dominated: lift(&blocks, |n| dom.dominators_of(n)),
        post_dominated: lift(&blocks, |n| pdom.dominators_of(n)),
    };
    let in_branch: FxHashSet<PointId> = blocks
        .blocks()
        .filter(|&b| ctx.is_branch_block(b))
        .flat_map(|b| blocks.members(b).iter().copied())
        .collect();
    graph.nodes().filter(|p| in_branch.contains(p)).collect()
}

pub fn tag_branches(program: &dyn ProgramGraph, method: MethodId, tags: &mut TagTable) {
    for p in find_branch_points(program, method) {
        tags.tag_point(p, Tag::Branch);
    }
}
