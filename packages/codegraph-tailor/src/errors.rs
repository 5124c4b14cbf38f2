//! Error types for codegraph-tailor
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::criteria::CriteriaError;

/// Main error type for tailoring operations
#[derive(Debug, Error)]
pub enum TailorError {
    /// Criterion source could not be read or resolved
    #[error("Criteria error: {0}")]
    Criteria(#[from] CriteriaError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inconsistent analysis inputs found during extension discovery
    /// (e.g. an allocation site without a constructor call)
    #[error("Extension error: {0}")]
    Extension(String),

    /// Program model is malformed (dangling ids, missing entry method)
    #[error("Program error: {0}")]
    Program(String),

    /// Orchestrator queried or driven out of order
    #[error("Invalid tailoring state: expected {expected}, found {found}")]
    State {
        expected: &'static str,
        found: &'static str,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TailorError {
    /// Create an extension (inconsistent input) error
    pub fn extension(msg: impl Into<String>) -> Self {
        TailorError::Extension(msg.into())
    }

    /// Create a program model error
    pub fn program(msg: impl Into<String>) -> Self {
        TailorError::Program(msg.into())
    }
}

/// Result type alias for tailoring operations
pub type Result<T> = std::result::Result<T, TailorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TailorError::extension("no constructor call for new A");
        assert_eq!(
            err.to_string(),
            "Extension error: no constructor call for new A"
        );

        let err = TailorError::State {
            expected: "Done",
            found: "BottomUpDone",
        };
        assert!(err.to_string().contains("expected Done"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "sc.txt");
        let err: TailorError = io.into();
        assert!(matches!(err, TailorError::Io(_)));
    }
}
