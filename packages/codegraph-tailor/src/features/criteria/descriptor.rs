//! Call descriptors: `caller/callee/line`
//!
//! A method is written either as `pkg.Class.method` or in bytecode-signature
//! form `<pkg.Class: ret method(args)>`. The line may be empty, meaning any
//! line.

use std::fmt;

use super::error::{CriteriaError, CriteriaResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: String,
    pub name: String,
}

impl MethodRef {
    pub fn parse(s: &str) -> CriteriaResult<Self> {
        let s = s.trim();
        let (class, name) = if let Some(inner) = s.strip_prefix('<') {
            let inner = inner.strip_suffix('>').unwrap_or(inner);
            let (class, rest) = inner
                .split_once(':')
                .ok_or_else(|| CriteriaError::malformed(s, "missing ':' in signature"))?;
            // rest = " ret name(args)"
            let name = rest
                .split_whitespace()
                .nth(1)
                .and_then(|token| token.split('(').next())
                .ok_or_else(|| CriteriaError::malformed(s, "missing method name in signature"))?;
            (class.trim(), name)
        } else {
            s.rsplit_once('.')
                .ok_or_else(|| CriteriaError::malformed(s, "expected Class.method"))?
        };
        if class.is_empty() || name.is_empty() {
            return Err(CriteriaError::malformed(s, "empty class or method name"));
        }
        Ok(Self {
            class: class.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.name)
    }
}

/// One call site of a sequential criterion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallDescriptor {
    pub caller: MethodRef,
    pub callee: MethodRef,
    /// `None` matches any line
    pub line: Option<i32>,
}

impl CallDescriptor {
    pub fn parse(s: &str) -> CriteriaResult<Self> {
        let mut parts = s.split('/');
        let caller = parts
            .next()
            .ok_or_else(|| CriteriaError::malformed(s, "missing caller"))?;
        let callee = parts
            .next()
            .ok_or_else(|| CriteriaError::malformed(s, "missing callee"))?;
        let line = match parts.next().map(str::trim) {
            None | Some("") => None,
            Some(line) => Some(
                line.parse::<i32>()
                    .map_err(|_| CriteriaError::malformed(s, format!("invalid line '{}'", line)))?,
            ),
        };
        if parts.next().is_some() {
            return Err(CriteriaError::malformed(s, "too many '/' separated fields"));
        }
        Ok(Self {
            caller: MethodRef::parse(caller)?,
            callee: MethodRef::parse(callee)?,
            line,
        })
    }

    pub fn matches_line(&self, line: i32) -> bool {
        self.line.map_or(true, |l| l == line)
    }
}

impl fmt::Display for CallDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}/{}/{}", self.caller, self.callee, line),
            None => write!(f, "{}/{}/", self.caller, self.callee),
        }
    }
}
