/*
 * Codegraph Tailor - Program Tailoring by Sequential Criteria
 *
 * Feature-First Architecture:
 * - shared/      : Program model (points, methods, classes) and ports
 * - features/    : Vertical slices (fact model → cycles → icfg → tagging
 *                  → extension → ifds → tailoring), plus criteria input
 * - config/      : TailorConfig (serde + YAML)
 *
 * Pipeline per criterion group (criteria sharing a tail):
 * 1. Derive criterion sets (api / head / tail / follow)
 * 2. Build the blocked ICFG (opaque criterion points, cycle redirection)
 * 3. Optional extension discovery (points-to driven)
 * 4. Bottom-up IFDS pass on the backward view
 * 5. Seed derivation and top-down IFDS pass on the forward view
 * 6. Projection: per-method tailored statements
 */

#![allow(clippy::too_many_arguments)] // Flow-function factories take full edge context
#![allow(clippy::type_complexity)] // Redirection tables are nested maps
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and ports
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

pub use config::TailorConfig;
pub use errors::{Result, TailorError};
pub use features::criteria::{CriteriaReader, SequenceCriterion};
pub use features::tailoring::{TailoringDriver, TailoringOrchestrator, TailoringResult};
pub use shared::models::{MethodId, PointId, Program, ProgramBuilder};
