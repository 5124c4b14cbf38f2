//! Criterion file reader
//!
//! One sequential criterion per line, descriptors separated by `;`:
//! ```text
//! app.Main.main/java.io.File.<init>/12;app.Main.main/java.io.File.delete/15
//! ```

use std::path::Path;

use super::descriptor::CallDescriptor;
use super::error::{CriteriaError, CriteriaResult};
use super::unit_finder::UnitFinder;
use crate::features::fact_model::StatementSequence;
use crate::shared::models::PointId;
use crate::shared::ports::ProgramGraph;

/// A criterion line resolved to program points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCriterion {
    /// 1-based line in the source
    pub line: usize,
    pub calls: Vec<CallDescriptor>,
    /// Matched call sites, in criterion order
    pub points: Vec<PointId>,
}

impl SequenceCriterion {
    pub fn sequence(&self) -> StatementSequence {
        StatementSequence::from_points(self.points.clone())
    }

    pub fn tail(&self) -> Option<PointId> {
        self.points.last().copied()
    }
}

pub struct CriteriaReader<'a> {
    finder: UnitFinder<'a>,
}

impl<'a> CriteriaReader<'a> {
    pub fn new(program: &'a dyn ProgramGraph) -> Self {
        Self {
            finder: UnitFinder::new(program),
        }
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> CriteriaResult<Vec<SequenceCriterion>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CriteriaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            tracing::warn!(path = %path.display(), "criteria file is empty");
        }
        self.read_str(&text)
    }

    /// Lines whose call sites cannot all be located are dropped with a
    /// warning; malformed descriptors and unknown classes are errors.
    pub fn read_str(&self, text: &str) -> CriteriaResult<Vec<SequenceCriterion>> {
        let mut criteria = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let calls: Vec<CallDescriptor> = raw
                .split(';')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(CallDescriptor::parse)
                .collect::<CriteriaResult<_>>()?;
            if calls.is_empty() {
                continue;
            }

            let mut points = Vec::with_capacity(calls.len());
            for desc in &calls {
                match self.finder.find(desc, line)? {
                    Some(p) => points.push(p),
                    None => {
                        tracing::warn!(line, call = %desc, "call site not found, criterion dropped");
                        break;
                    }
                }
            }
            if points.len() == calls.len() {
                criteria.push(SequenceCriterion { line, calls, points });
            }
        }
        tracing::info!(criteria = criteria.len(), "criteria read");
        Ok(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Program, ProgramBuilder};
    use pretty_assertions::assert_eq;

    fn program() -> (Program, Vec<PointId>) {
        let mut b = ProgramBuilder::new();
        let app = b.class("app.Main");
        let api = b.library_class("lib.Api");
        let main = b.static_method(app, "main");
        let open = b.static_method(api, "open");
        let close = b.static_method(api, "close");
        let c1 = b.static_call(main, 3, open);
        let c2 = b.static_call(main, 4, close);
        b.chain(&[c1, c2]);
        b.entry(main);
        (b.build().unwrap(), vec![c1, c2])
    }

    #[test]
    fn test_read_lines() {
        let (program, p) = program();
        let reader = CriteriaReader::new(&program);
        let text = "\napp.Main.main/lib.Api.open/3;;app.Main.main/<lib.Api: void close()>/4;\n\
                    app.Main.main/lib.Api.open/3;app.Main.main/lib.Api.close/99\n";
        let criteria = reader.read_str(text).unwrap();

        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].line, 2);
        assert_eq!(criteria[0].points, p);
        assert_eq!(criteria[0].tail(), Some(p[1]));
        assert_eq!(criteria[0].sequence().len(), 2);
    }

    #[test]
    fn test_unknown_class_is_fatal() {
        let (program, _) = program();
        let reader = CriteriaReader::new(&program);
        let err = reader.read_str("app.Missing.main/lib.Api.open/3").unwrap_err();
        assert!(matches!(err, CriteriaError::UnknownClass { line: 1, .. }));
    }

    #[test]
    fn test_missing_file() {
        let (program, _) = program();
        let reader = CriteriaReader::new(&program);
        let err = reader.read_file("/nonexistent/criteria.sc").unwrap_err();
        assert!(matches!(err, CriteriaError::Io { .. }));
    }
}
