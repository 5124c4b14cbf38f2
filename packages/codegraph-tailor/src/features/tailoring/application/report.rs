//! Plain-text reports, one file per criterion group

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::super::domain::TailoringResult;
use crate::errors::Result;
use crate::shared::models::{MethodId, PointId};
use crate::shared::ports::ProgramGraph;

const SEPARATOR: &str = "==========================================================";

/// `<Class: name(sig)>`
pub fn method_label(program: &dyn ProgramGraph, m: MethodId) -> String {
    let method = program.method(m);
    format!(
        "<{}: {}{}>",
        program.class(method.class).name,
        method.name,
        method.signature
    )
}

/// `CallerClass.method;CalleeClass.method;line[-ext]-all-MainClass.output`
pub fn report_file_name(program: &dyn ProgramGraph, tail: PointId, extend: bool) -> String {
    let point = program.point(tail);
    let short = |m: MethodId| {
        let method = program.method(m);
        format!("{}.{}", program.class(method.class).short_name(), method.name)
    };
    let caller = short(point.method);
    let callee = point
        .kind
        .call_site()
        .map(|site| short(site.target))
        .unwrap_or_else(|| "unknown".to_string());
    let main_class = &program.class_of_method(program.entry_method()).name;
    format!(
        "{};{};{}{}-all-{}.output",
        caller,
        callee,
        point.line,
        if extend { "-ext" } else { "" },
        main_class
    )
}

/// Methods sorted by label, statements in body order
pub fn render_report(program: &dyn ProgramGraph, result: &TailoringResult) -> String {
    let mut methods: Vec<(String, &Vec<PointId>)> = result
        .methods
        .iter()
        .map(|(&m, points)| (method_label(program, m), points))
        .collect();
    methods.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::new();
    for (label, points) in methods {
        let _ = writeln!(out, "{}", SEPARATOR);
        let _ = writeln!(out, "Method: {}", label);
        let _ = writeln!(out, "Units in the tailored program:");
        for &p in points {
            let point = program.point(p);
            let _ = writeln!(out, "  {} {{line: {}}}", point.text, point.line);
        }
    }
    out
}

/// Write the report of `result` into `out_dir`, creating it if needed
pub fn write_report(
    program: &dyn ProgramGraph,
    result: &TailoringResult,
    out_dir: &Path,
    extend: bool,
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(report_file_name(program, result.tail, extend));
    tracing::info!(path = %path.display(), "dumping tailoring result");
    std::fs::write(&path, render_report(program, result))?;
    Ok(path)
}
