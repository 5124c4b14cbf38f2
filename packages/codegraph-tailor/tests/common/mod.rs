//! Common test utilities for codegraph-tailor
//!
//! Program fixtures built with `ProgramBuilder`, and assertions over
//! tailoring results.

#![allow(dead_code)]

mod assertions;
mod fixtures;

pub use assertions::*;
pub use fixtures::*;
