//! Errors raised while loading or checking a `TailorConfig`

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config files must start with `version: 1`
    #[error("tailor config has no 'version' key (expected 'version: 1')")]
    MissingVersion,

    #[error(
        "tailor config version {found} is not supported (known: {})",
        join_versions(supported)
    )]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Reflection patterns are written `fully.qualified.Class.method`
    #[error("'{0}' is not a qualified method name (Class.method)")]
    MethodPattern(String),

    #[error("cannot read tailor config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed tailor config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{config}: {message}")]
    Validation {
        config: &'static str,
        message: String,
    },
}

fn join_versions(versions: &[u32]) -> String {
    versions
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConfigError {
    pub fn validation(config: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            config,
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ConfigError::UnsupportedVersion {
            found: 3,
            supported: vec![1, 2],
        };
        assert_eq!(
            err.to_string(),
            "tailor config version 3 is not supported (known: 1, 2)"
        );
        assert_eq!(
            ConfigError::validation("TailorConfig", "out_dir must not be empty").to_string(),
            "TailorConfig: out_dir must not be empty"
        );
    }
}
