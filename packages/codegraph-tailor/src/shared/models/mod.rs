//! Shared models

mod builder;
mod ids;
mod program;

pub use builder::ProgramBuilder;
pub use ids::{AllocSiteId, ClassId, MethodId, PointId};
pub use program::{
    AllocSite, CallEdge, CallSite, Class, IntraEdge, InvokeKind, Method, Point, PointKind,
    PointsToEntry, Program, ProgramData, CONSTRUCTOR_NAME,
};
