//! Fact Model
//!
//! `StatementSequence` is the dataflow fact of both tailoring passes: a
//! right-to-left partial match of a sequential criterion, newest matched
//! call site at the head. `CriterionSets` holds the sets derived from the
//! criteria of one group and the predicates the flow functions need.

mod criterion_sets;
mod statement_sequence;

pub use criterion_sets::{CriterionSets, ExtensionMap};
pub use statement_sequence::StatementSequence;
