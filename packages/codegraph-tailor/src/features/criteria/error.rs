//! Criterion input errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CriteriaError {
    /// Criterion file missing or unreadable
    #[error("Cannot read criteria from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Caller class of a descriptor is not part of the program
    #[error("Unknown class '{class}' in criteria line {line}")]
    UnknownClass { class: String, line: usize },

    /// Descriptor does not follow `caller/callee/line`
    #[error("Malformed call descriptor '{descriptor}': {reason}")]
    Malformed { descriptor: String, reason: String },
}

impl CriteriaError {
    pub fn malformed(descriptor: &str, reason: impl Into<String>) -> Self {
        CriteriaError::Malformed {
            descriptor: descriptor.to_string(),
            reason: reason.into(),
        }
    }
}

pub type CriteriaResult<T> = Result<T, CriteriaError>;
