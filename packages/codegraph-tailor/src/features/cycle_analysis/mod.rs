//! Cycle Analysis
//!
//! Finds loops (per method, over the no-exception graph) and recursion
//! (over the call graph) and turns them into a `RedirectionPlan` that the
//! blocked ICFG applies when cycles are not retained.

pub mod inter_cycle;
pub mod intra_cycle;
pub mod no_exception_graph;
pub mod redirection;

pub use inter_cycle::{build_call_graph, find_recursion_blocks, true_components, BlockedCalls, CallGraphSource};
pub use intra_cycle::{find_method_loops, IntraCycles, MethodLoops};
pub use no_exception_graph::{DominatorTree, NoExceptionGraph};
pub use redirection::RedirectionPlan;
