//! IFDS (Interprocedural Finite Distributive Subset) analysis
//!
//! `framework` defines facts, flow functions, the problem and the ICFG
//! abstraction; `solver` implements the tabulation algorithm.

pub mod framework;
pub mod solver;

pub use framework::{
    fact_set, flow_fn, DataflowFact, FlowFunction, FnFlowFunction,
    IFDSProblem, IFDSStatistics, IdentityFlowFunction, InterproceduralCfg, KillFlowFunction,
    PathEdge,
};
pub use solver::{IFDSSolver, IFDSSolverResult};
