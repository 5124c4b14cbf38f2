//! Feature modules
//!
//! Leaves first: `fact_model` and `ifds` have no analysis dependencies;
//! `tailoring` wires everything together per criterion group.

pub mod criteria;
pub mod cycle_analysis;
pub mod extension;
pub mod fact_model;
pub mod icfg;
pub mod ifds;
pub mod tagging;
pub mod tailoring;
