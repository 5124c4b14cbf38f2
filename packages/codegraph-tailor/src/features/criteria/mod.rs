//! Criteria input
//!
//! Parses sequential criteria (`caller/callee/line;...` per line) and
//! resolves every descriptor to a call point of the program.

mod descriptor;
mod error;
mod reader;
mod unit_finder;

pub use descriptor::{CallDescriptor, MethodRef};
pub use error::{CriteriaError, CriteriaResult};
pub use reader::{CriteriaReader, SequenceCriterion};
pub use unit_finder::UnitFinder;
