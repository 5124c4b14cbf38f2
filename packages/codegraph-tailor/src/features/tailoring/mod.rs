// Tailoring - Bottom-up / top-down IFDS over the blocked ICFG
//
// Hexagonal Architecture:
// - domain/         : TailorState lifecycle, TailoringResult
// - infrastructure/ : IFDS problems for both passes, result cache, projection
// - application/    : Orchestrator (one criterion group), Driver (whole run), reports

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{TailoringDriver, TailoringOrchestrator};
pub use domain::{TailorState, TailoringResult};
pub use infrastructure::{FactSetInterner, ResultCache};
