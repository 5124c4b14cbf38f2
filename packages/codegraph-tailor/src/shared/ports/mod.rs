//! Ports (Interfaces) to the program under analysis
//!
//! The analysis never owns the program representation. It reads it through
//! two small traits:
//! - `ProgramGraph`: bodies, intraprocedural edges, the call graph
//! - `PointsToProvider`: allocation sites and class-hierarchy queries,
//!   consumed only by extension discovery
//!
//! Unknown ids are integration errors; implementations may panic on them.

use crate::shared::models::{
    AllocSite, AllocSiteId, Class, ClassId, Method, MethodId, Point, PointId,
};

/// Whole-program graph provider
pub trait ProgramGraph: Send + Sync {
    /// Program entry (`main`)
    fn entry_method(&self) -> MethodId;

    fn methods(&self) -> &[Method];

    fn classes(&self) -> &[Class];

    fn point(&self, p: PointId) -> &Point;

    /// All intraprocedural successors, exceptional edges included
    fn succs_of(&self, p: PointId) -> &[PointId];

    fn preds_of(&self, p: PointId) -> &[PointId];

    /// Successors over normal (non-exceptional) edges only
    fn normal_succs_of(&self, p: PointId) -> &[PointId];

    fn normal_preds_of(&self, p: PointId) -> &[PointId];

    /// Statements without predecessors (method entry and handler heads)
    fn start_points_of(&self, m: MethodId) -> &[PointId];

    /// Statements without successors
    fn end_points_of(&self, m: MethodId) -> &[PointId];

    /// Call-graph targets of a statement
    fn callees_of_call_at(&self, p: PointId) -> &[MethodId];

    /// Statements with a call-graph edge into `m`
    fn callers_of(&self, m: MethodId) -> &[PointId];

    fn methods_of_class(&self, c: ClassId) -> &[MethodId];

    fn class_by_name(&self, name: &str) -> Option<ClassId>;

    // ------------------------------------------------------------------
    // Provided
    // ------------------------------------------------------------------

    fn method(&self, m: MethodId) -> &Method {
        &self.methods()[m.index()]
    }

    fn class(&self, c: ClassId) -> &Class {
        &self.classes()[c.index()]
    }

    fn method_of(&self, p: PointId) -> MethodId {
        self.point(p).method
    }

    fn class_of_method(&self, m: MethodId) -> &Class {
        self.class(self.method(m).class)
    }

    /// Statement contains an invoke expression
    fn is_call_stmt(&self, p: PointId) -> bool {
        self.point(p).kind.is_call()
    }

    fn is_library_method(&self, m: MethodId) -> bool {
        self.class_of_method(m).is_library
    }

    /// First method of class `c` named `name`
    fn method_by_name(&self, c: ClassId, name: &str) -> Option<MethodId> {
        self.methods_of_class(c)
            .iter()
            .copied()
            .find(|&m| self.method(m).name == name)
    }
}

/// Alias / points-to provider
pub trait PointsToProvider: Send + Sync {
    /// Allocation sites that may reach `local` inside `method`
    fn reaching_alloc_sites(&self, method: MethodId, local: &str) -> &[AllocSiteId];

    fn alloc_site(&self, id: AllocSiteId) -> &AllocSite;

    /// `sub` equals `sup` or transitively extends it
    fn is_subclass_including(&self, sub: ClassId, sup: ClassId) -> bool;

    /// `class` (or a superclass) implements `iface` or a subinterface of it
    fn is_implementer(&self, class: ClassId, iface: ClassId) -> bool;

    /// Concrete implementation of `declared` selected for receivers of
    /// dynamic type `class`
    fn resolve_concrete_dispatch(&self, class: ClassId, declared: MethodId) -> Option<MethodId>;
}
