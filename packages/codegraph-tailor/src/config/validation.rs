//! Validation hook shared by config types
//!
//! Loaders call `validate()` before a config reaches the analysis, so flow
//! functions and the ICFG builder can trust names and prefixes.

use super::error::ConfigResult;

/// ```rust,ignore
/// use codegraph_tailor::config::{TailorConfig, Validatable};
///
/// TailorConfig::default().block_package_prefix("sun.").validate()?;
/// ```
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;

    /// Prefix of validation messages
    fn config_name(&self) -> &'static str;
}
