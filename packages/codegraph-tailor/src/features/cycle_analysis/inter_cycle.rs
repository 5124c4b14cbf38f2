//! Interprocedural cycles (recursion)
//!
//! The call graph is rebuilt from the entry method over the current ICFG
//! view. While it still has a true component, the first component method
//! reached by DFS has its in-component call edges blocked.

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use crate::shared::models::{MethodId, PointId};

/// Call-graph queries the recursion finder needs
pub trait CallGraphSource {
    fn entry_method(&self) -> MethodId;

    fn method_of(&self, p: PointId) -> MethodId;

    /// Call statements inside `m`
    fn calls_from_within(&self, m: MethodId) -> Vec<PointId>;

    fn callees_of_call_at(&self, p: PointId) -> Vec<MethodId>;

    fn callers_of(&self, m: MethodId) -> Vec<PointId>;
}

/// Blocked call edges: call site → callees no longer entered from it
pub type BlockedCalls = FxHashMap<PointId, FxHashSet<MethodId>>;

/// Method-level call graph reachable from the entry method
pub fn build_call_graph(
    source: &dyn CallGraphSource,
    blocked: &BlockedCalls,
) -> DiGraphMap<MethodId, ()> {
    let entry = source.entry_method();
    let mut graph = DiGraphMap::new();
    graph.add_node(entry);
    let mut queue = VecDeque::from([entry]);
    while let Some(m) = queue.pop_front() {
        for call in source.calls_from_within(m) {
            for callee in source.callees_of_call_at(call) {
                if blocked.get(&call).is_some_and(|b| b.contains(&callee)) {
                    continue;
                }
                if !graph.contains_node(callee) {
                    graph.add_node(callee);
                    queue.push_back(callee);
                }
                graph.add_edge(m, callee, ());
            }
        }
    }
    graph
}

/// SCCs with more than one member, or a single self-calling member
pub fn true_components(graph: &DiGraphMap<MethodId, ()>) -> Vec<Vec<MethodId>> {
    tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .collect()
}

/// Compute the call edges to block until the call graph is acyclic.
pub fn find_recursion_blocks(source: &dyn CallGraphSource) -> BlockedCalls {
    let entry = source.entry_method();
    let mut blocked = BlockedCalls::default();
    let mut rounds = 0usize;

    loop {
        let graph = build_call_graph(source, &blocked);
        let components = true_components(&graph);
        if components.is_empty() {
            break;
        }
        rounds += 1;

        let component_of: FxHashMap<MethodId, usize> = components
            .iter()
            .enumerate()
            .flat_map(|(i, scc)| scc.iter().map(move |&m| (m, i)))
            .collect();

        let mut dfs = Dfs::new(&graph, entry);
        let mut added = 0usize;
        while let Some(m) = dfs.next(&graph) {
            let Some(&ci) = component_of.get(&m) else {
                continue;
            };
            let component = &components[ci];
            for call in source.callers_of(m) {
                let caller = source.method_of(call);
                if !component.contains(&caller) {
                    continue;
                }
                let already = blocked.get(&call).is_some_and(|b| b.contains(&m));
                if !already && source.callees_of_call_at(call).contains(&m) {
                    tracing::debug!(call = %call, callee = %m, "blocking recursive call edge");
                    blocked.entry(call).or_default().insert(m);
                    added += 1;
                }
            }
            break;
        }

        if added == 0 {
            tracing::warn!(
                components = components.len(),
                "recursive components left that cannot be cut"
            );
            break;
        }
    }

    tracing::info!(
        rounds,
        blocked_edges = blocked.values().map(|s| s.len()).sum::<usize>(),
        "interprocedural cycles blocked"
    );
    blocked
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Adjacency-list call graph: method i has one call site per callee,
    /// call site id = 100 * caller + index.
    struct ToyCalls {
        calls: Vec<Vec<u32>>,
    }

    impl CallGraphSource for ToyCalls {
        fn entry_method(&self) -> MethodId {
            MethodId(0)
        }

        fn method_of(&self, p: PointId) -> MethodId {
            MethodId(p.0 / 100)
        }

        fn calls_from_within(&self, m: MethodId) -> Vec<PointId> {
            (0..self.calls[m.index()].len() as u32)
                .map(|i| PointId(m.0 * 100 + i))
                .collect()
        }

        fn callees_of_call_at(&self, p: PointId) -> Vec<MethodId> {
            let m = (p.0 / 100) as usize;
            let i = (p.0 % 100) as usize;
            vec![MethodId(self.calls[m][i])]
        }

        fn callers_of(&self, m: MethodId) -> Vec<PointId> {
            let mut out = Vec::new();
            for (caller, callees) in self.calls.iter().enumerate() {
                for (i, &c) in callees.iter().enumerate() {
                    if c == m.0 {
                        out.push(PointId(caller as u32 * 100 + i as u32));
                    }
                }
            }
            out
        }
    }

    #[test]
    fn test_mutual_recursion_is_cut_once() {
        // 0 → 1 → 2 → 1
        let toy = ToyCalls {
            calls: vec![vec![1], vec![2], vec![1]],
        };
        let graph = build_call_graph(&toy, &BlockedCalls::default());
        assert_eq!(true_components(&graph).len(), 1);

        let blocked = find_recursion_blocks(&toy);
        assert_eq!(blocked.len(), 1);
        assert!(blocked[&PointId(200)].contains(&MethodId(1)));
        assert!(true_components(&build_call_graph(&toy, &blocked)).is_empty());
    }

    #[test]
    fn test_self_recursion() {
        // 0 → 1 → 1
        let toy = ToyCalls {
            calls: vec![vec![1], vec![1]],
        };
        let blocked = find_recursion_blocks(&toy);
        assert!(blocked[&PointId(100)].contains(&MethodId(1)));
    }

    #[test]
    fn test_acyclic_graph_blocks_nothing() {
        let toy = ToyCalls {
            calls: vec![vec![1, 2], vec![2], vec![]],
        };
        assert!(find_recursion_blocks(&toy).is_empty());
    }
}
