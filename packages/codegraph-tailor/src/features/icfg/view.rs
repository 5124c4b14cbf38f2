//! Solver-facing views of a blocked ICFG
//!
//! One type serves both passes: `Forward` reads the blocked ICFG as is,
//! `Backward` swaps successors and predecessors, start and end points, and
//! the roles of call statements and return sites.

use rustc_hash::FxHashSet;

use super::blocked::BlockedIcfg;
use crate::features::ifds::InterproceduralCfg;
use crate::shared::models::{MethodId, PointId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Forward,
    Backward,
}

pub struct IcfgView<'i, 'a> {
    icfg: &'i BlockedIcfg<'a>,
    orientation: Orientation,
    /// Forward only: successors outside this set are pruned
    restrict: Option<&'i FxHashSet<PointId>>,
}

impl<'i, 'a> IcfgView<'i, 'a> {
    pub fn forward(icfg: &'i BlockedIcfg<'a>) -> Self {
        Self {
            icfg,
            orientation: Orientation::Forward,
            restrict: None,
        }
    }

    pub fn backward(icfg: &'i BlockedIcfg<'a>) -> Self {
        Self {
            icfg,
            orientation: Orientation::Backward,
            restrict: None,
        }
    }

    /// Forward view that only steps onto points of `reachable`
    pub fn forward_restricted(icfg: &'i BlockedIcfg<'a>, reachable: &'i FxHashSet<PointId>) -> Self {
        Self {
            icfg,
            orientation: Orientation::Forward,
            restrict: Some(reachable),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn icfg(&self) -> &'i BlockedIcfg<'a> {
        self.icfg
    }

    /// Start points of `m` in this orientation
    pub fn start_points(&self, m: MethodId) -> &'i [PointId] {
        match self.orientation {
            Orientation::Forward => self.icfg.start_points_of(m),
            Orientation::Backward => self.icfg.end_points_of(m),
        }
    }

    /// End points of `m` in this orientation
    pub fn end_points(&self, m: MethodId) -> &'i [PointId] {
        match self.orientation {
            Orientation::Forward => self.icfg.end_points_of(m),
            Orientation::Backward => self.icfg.start_points_of(m),
        }
    }

    fn forward_succs(&self, n: PointId) -> Vec<PointId> {
        let succs = self.icfg.succs_of(n);
        match self.restrict {
            Some(reachable) => succs.iter().copied().filter(|s| reachable.contains(s)).collect(),
            None => succs.to_vec(),
        }
    }
}

impl InterproceduralCfg for IcfgView<'_, '_> {
    fn method_of(&self, n: PointId) -> MethodId {
        self.icfg.method_of(n)
    }

    fn succs_of(&self, n: PointId) -> Vec<PointId> {
        match self.orientation {
            Orientation::Forward => self.forward_succs(n),
            Orientation::Backward => self.icfg.preds_of(n).to_vec(),
        }
    }

    fn callees_of_call_at(&self, n: PointId) -> Vec<MethodId> {
        match self.orientation {
            Orientation::Forward => self.icfg.callees_of_call_at(n),
            Orientation::Backward => {
                let mut callees = Vec::new();
                for &pred in self.icfg.preds_of(n) {
                    if self.icfg.is_call_stmt(pred) {
                        for m in self.icfg.callees_of_call_at(pred) {
                            if !callees.contains(&m) {
                                callees.push(m);
                            }
                        }
                    }
                }
                callees
            }
        }
    }

    fn callers_of(&self, m: MethodId) -> Vec<PointId> {
        match self.orientation {
            Orientation::Forward => self.icfg.callers_of(m),
            Orientation::Backward => {
                let mut callers = Vec::new();
                for call in self.icfg.callers_of(m) {
                    for &s in self.icfg.succs_of(call) {
                        if !callers.contains(&s) {
                            callers.push(s);
                        }
                    }
                }
                callers
            }
        }
    }

    fn start_points_of(&self, m: MethodId) -> Vec<PointId> {
        self.start_points(m).to_vec()
    }

    fn return_sites_of_call_at(&self, n: PointId) -> Vec<PointId> {
        match self.orientation {
            Orientation::Forward => self.forward_succs(n),
            Orientation::Backward => self.icfg.preds_of(n).to_vec(),
        }
    }

    fn is_call_stmt(&self, n: PointId) -> bool {
        match self.orientation {
            Orientation::Forward => self.icfg.is_call_stmt(n),
            Orientation::Backward => self.icfg.is_return_site(n),
        }
    }

    fn is_exit_stmt(&self, n: PointId) -> bool {
        match self.orientation {
            Orientation::Forward => self.icfg.is_exit_stmt(n),
            Orientation::Backward => self.icfg.is_start_point(n),
        }
    }
}
