//! Cycle tagging over the forward ICFG
//!
//! InterCycle: methods of recursive components and everything they reach.
//! IntraCycle: loop statements, and every method reachable from a call
//! inside a loop.

use petgraph::graphmap::DiGraphMap;

use super::tag_table::{Tag, TagTable};
use crate::features::cycle_analysis::{build_call_graph, find_method_loops, true_components, BlockedCalls};
use crate::features::icfg::BlockedIcfg;
use crate::shared::models::{MethodId, PointId};

pub fn tag_cycles(icfg: &BlockedIcfg<'_>, tags: &mut TagTable) {
    let call_graph = build_call_graph(icfg, &BlockedCalls::default());

    for component in true_components(&call_graph) {
        for m in component {
            tag_reachable_methods(m, &call_graph, Tag::InterCycle, tags);
        }
    }

    for m in icfg.methods_with_bodies() {
        let mut loop_nodes: Vec<PointId> = find_method_loops(icfg.program(), m)
            .loop_nodes()
            .into_iter()
            .collect();
        loop_nodes.sort();
        for u in loop_nodes {
            if tags.tag_point(u, Tag::IntraCycle) && icfg.is_call_stmt(u) {
                for callee in icfg.callees_of_call_at(u) {
                    tag_reachable_methods(callee, &call_graph, Tag::IntraCycle, tags);
                }
            }
        }
    }
}

fn tag_reachable_methods(
    start: MethodId,
    call_graph: &DiGraphMap<MethodId, ()>,
    tag: Tag,
    tags: &mut TagTable,
) {
    let mut stack = vec![start];
    while let Some(m) = stack.pop() {
        if tags.tag_method(m, tag) {
            stack.extend(call_graph.neighbors(m));
        }
    }
}
