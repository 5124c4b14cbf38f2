//! Interprocedural CFG
//!
//! `BlockedIcfg` holds the criterion-aware, cycle-safe forward graph;
//! `IcfgView` exposes it to the IFDS solver in either orientation.

pub mod blocked;
pub mod view;

pub use blocked::BlockedIcfg;
pub use view::{IcfgView, Orientation};
