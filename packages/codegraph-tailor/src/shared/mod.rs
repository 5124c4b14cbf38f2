//! Shared module - Program model and ports
//!
//! Everything the analysis features read about the program under analysis
//! goes through the `ports` traits; `models` ships the in-memory
//! implementation used by the CLI and the tests.

pub mod models;
pub mod ports;

pub use models::*;
pub use ports::{PointsToProvider, ProgramGraph};
