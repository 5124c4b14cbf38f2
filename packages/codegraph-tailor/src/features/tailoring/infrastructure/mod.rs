//! Tailoring infrastructure: the two IFDS problems, the result cache and
//! the projection between them.

pub mod bottom_up;
pub mod projection;
pub mod result_cache;
pub mod top_down;

pub use bottom_up::{solve_bottom_up, BottomUpProblem};
pub use projection::{derive_seeds, project};
pub use result_cache::{FactSet, FactSetInterner, InternStats, ResultCache};
pub use top_down::{solve_top_down, TopDownProblem};
