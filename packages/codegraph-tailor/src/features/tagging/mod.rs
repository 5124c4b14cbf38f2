//! Tagging
//!
//! Structural facts consumed by extension discovery and the tailoring
//! passes, kept in a `TagTable` side-table. Taggers are plain functions.

mod branch;
mod constructor;
mod cycle;
mod tag_table;

pub use branch::{find_branch_points, tag_branches};
pub use constructor::{find_constructor_call, find_constructor_calls, tag_constructor_calls};
pub use cycle::tag_cycles;
pub use tag_table::{Tag, TagSet, TagTable};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::shared::models::{MethodId, PointId};
use crate::shared::ports::ProgramGraph;

type MethodTags = (Vec<PointId>, Vec<(PointId, Option<PointId>)>);

/// Branch and constructor-call tags for every method with a body.
///
/// Methods are analysed in parallel; results are merged into `tags` by the
/// calling thread.
pub fn tag_methods(program: &dyn ProgramGraph, tags: &mut TagTable) {
    let methods: Vec<MethodId> = program
        .methods()
        .iter()
        .filter(|m| m.has_body())
        .map(|m| m.id)
        .collect();

    let analyse = |&m: &MethodId| -> MethodTags {
        (
            find_branch_points(program, m),
            find_constructor_calls(program, m),
        )
    };
    #[cfg(feature = "parallel")]
    let results: Vec<MethodTags> = methods.par_iter().map(analyse).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<MethodTags> = methods.iter().map(analyse).collect();

    for (branches, ctors) in results {
        for p in branches {
            tags.tag_point(p, Tag::Branch);
        }
        for (alloc, call) in ctors {
            tags.set_constructor_call(alloc, call);
        }
    }
}
