//! Locating call sites by descriptor

use super::descriptor::CallDescriptor;
use super::error::{CriteriaError, CriteriaResult};
use crate::shared::models::PointId;
use crate::shared::ports::ProgramGraph;

pub struct UnitFinder<'a> {
    program: &'a dyn ProgramGraph,
}

impl<'a> UnitFinder<'a> {
    pub fn new(program: &'a dyn ProgramGraph) -> Self {
        Self { program }
    }

    /// First call point in body order matching `desc`.
    ///
    /// Candidates are the concrete methods of the caller class with the
    /// given name; the callee is matched on the statically referenced
    /// method. An unknown caller class is an error, a missing call is not.
    pub fn find(&self, desc: &CallDescriptor, line_no: usize) -> CriteriaResult<Option<PointId>> {
        let class = self
            .program
            .class_by_name(&desc.caller.class)
            .ok_or_else(|| CriteriaError::UnknownClass {
                class: desc.caller.class.clone(),
                line: line_no,
            })?;

        for &m in self.program.methods_of_class(class) {
            let method = self.program.method(m);
            if method.name != desc.caller.name || method.is_abstract || !method.has_body() {
                continue;
            }
            for &p in &method.body {
                let point = self.program.point(p);
                if !desc.matches_line(point.line) {
                    continue;
                }
                let Some(site) = point.kind.call_site() else {
                    continue;
                };
                let callee = self.program.method(site.target);
                if callee.name == desc.callee.name
                    && self.program.class(callee.class).name == desc.callee.class
                {
                    return Ok(Some(p));
                }
            }
        }
        Ok(None)
    }
}
