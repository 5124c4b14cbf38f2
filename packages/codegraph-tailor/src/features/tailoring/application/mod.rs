//! Tailoring application layer: per-group orchestration, whole-run driver
//! and report output.

pub mod driver;
pub mod orchestrator;
pub mod report;

pub use driver::TailoringDriver;
pub use orchestrator::TailoringOrchestrator;
pub use report::{method_label, render_report, report_file_name, write_report};
