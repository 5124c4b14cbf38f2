//! Redirection plan applied by the blocked ICFG

use rustc_hash::{FxHashMap, FxHashSet};

use super::inter_cycle::{find_recursion_blocks, BlockedCalls, CallGraphSource};
use super::intra_cycle::IntraCycles;
use crate::shared::models::{MethodId, PointId};

/// Cycle-breaking plan.
///
/// - `intra`: back edge `(n, d)` → exits replacing `d` among `n`'s successors
/// - `inter`: call site → callees blocked from it
#[derive(Debug, Clone, Default)]
pub struct RedirectionPlan {
    pub intra: FxHashMap<(PointId, PointId), FxHashSet<PointId>>,
    pub inter: BlockedCalls,
}

impl RedirectionPlan {
    pub fn from_intra(cycles: &IntraCycles) -> Self {
        Self {
            intra: cycles
                .redirections()
                .map(|(edge, exits)| (*edge, exits.clone()))
                .collect(),
            inter: BlockedCalls::default(),
        }
    }

    /// Add recursion blocks computed over `source`, which should already
    /// apply the intra redirections.
    pub fn with_recursion_blocks(mut self, source: &dyn CallGraphSource) -> Self {
        self.inter = find_recursion_blocks(source);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.intra.is_empty() && self.inter.is_empty()
    }

    pub fn is_blocked_call(&self, call: PointId, callee: MethodId) -> bool {
        self.inter.get(&call).is_some_and(|c| c.contains(&callee))
    }
}
