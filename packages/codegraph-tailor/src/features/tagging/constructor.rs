//! Constructor-call tagging: links every `x = new C` to the `x.<init>(..)`
//! call that initializes it.

use rustc_hash::FxHashSet;

use super::tag_table::TagTable;
use crate::shared::models::{MethodId, PointId, PointKind};
use crate::shared::ports::ProgramGraph;

/// First instance call on `local` to a constructor, searching forward
/// (DFS over normal edges) from the allocation.
pub fn find_constructor_call(program: &dyn ProgramGraph, alloc: PointId, local: &str) -> Option<PointId> {
    let mut stack = vec![alloc];
    let mut visited = FxHashSet::default();
    while let Some(p) = stack.pop() {
        if !visited.insert(p) {
            continue;
        }
        if let Some(site) = program.point(p).kind.call_site() {
            let on_local = site.invoke.is_instance() && site.receiver.as_deref() == Some(local);
            if on_local && program.method(site.target).is_constructor() {
                return Some(p);
            }
        }
        for &s in program.normal_succs_of(p) {
            if !visited.contains(&s) {
                stack.push(s);
            }
        }
    }
    None
}

/// Allocation → constructor call pairs of one method
pub fn find_constructor_calls(program: &dyn ProgramGraph, method: MethodId) -> Vec<(PointId, Option<PointId>)> {
    program
        .method(method)
        .body
        .iter()
        .filter_map(|&p| match &program.point(p).kind {
            PointKind::New { local, .. } => Some((p, find_constructor_call(program, p, local))),
            _ => None,
        })
        .collect()
}

pub fn tag_constructor_calls(program: &dyn ProgramGraph, method: MethodId, tags: &mut TagTable) {
    for (alloc, call) in find_constructor_calls(program, method) {
        if call.is_none() {
            tracing::debug!(alloc = %alloc, "allocation without constructor call");
        }
        tags.set_constructor_call(alloc, call);
    }
}
