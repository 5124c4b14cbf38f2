//! Tailoring configuration
//!
//! Defaults mirror the usual command line setup: cycles retained,
//! criterion extension enabled, library code analysed. Every field can be
//! overridden from a versioned YAML file or programmatically.
//!
//! ```rust,ignore
//! use codegraph_tailor::config::TailorConfig;
//!
//! let config = TailorConfig::from_yaml_file("tailor.yaml")?
//!     .retain_cycle(false);
//! ```

pub mod error;
pub mod tailor_config;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use tailor_config::{MethodPattern, ReflectionConfig, TailorConfig};
pub use validation::Validatable;
