//! Tailoring configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, ConfigResult};
use super::validation::Validatable;

const SUPPORTED_VERSIONS: &[u32] = &[1];

/// Qualified method name, written `fully.qualified.Class.method`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodPattern {
    pub class: String,
    pub name: String,
}

impl MethodPattern {
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }

    pub fn parse(s: &str) -> ConfigResult<Self> {
        match s.trim().rsplit_once('.') {
            Some((class, name)) if !class.is_empty() && !name.is_empty() => {
                Ok(Self::new(class, name))
            }
            _ => Err(ConfigError::MethodPattern(s.to_string())),
        }
    }

    /// Matches every overload of `class.name`.
    pub fn matches(&self, class: &str, name: &str) -> bool {
        self.class == class && self.name == name
    }
}

impl TryFrom<String> for MethodPattern {
    type Error = ConfigError;

    fn try_from(value: String) -> ConfigResult<Self> {
        MethodPattern::parse(&value)
    }
}

impl From<MethodPattern> for String {
    fn from(value: MethodPattern) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MethodPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.name)
    }
}

/// Reflection idioms recognised by the blocked ICFG and the extension finder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Class lookups; a criterion point calling one of these makes the
    /// reflective invocation methods opaque.
    pub class_lookup: Vec<MethodPattern>,

    /// `Class.newInstance`
    pub class_new_instance: MethodPattern,

    /// `Constructor.newInstance`
    pub constructor_new_instance: MethodPattern,

    /// `Method.invoke`; its receiver object is the first argument
    pub method_invoke: MethodPattern,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            class_lookup: vec![
                MethodPattern::new("java.lang.Class", "forName"),
                MethodPattern::new("java.lang.Object", "getClass"),
            ],
            class_new_instance: MethodPattern::new("java.lang.Class", "newInstance"),
            constructor_new_instance: MethodPattern::new(
                "java.lang.reflect.Constructor",
                "newInstance",
            ),
            method_invoke: MethodPattern::new("java.lang.reflect.Method", "invoke"),
        }
    }
}

impl ReflectionConfig {
    /// Methods made opaque once a reflective lookup is a criterion point.
    pub fn reflective_methods(&self) -> [&MethodPattern; 3] {
        [
            &self.class_new_instance,
            &self.constructor_new_instance,
            &self.method_invoke,
        ]
    }

    pub fn is_new_instance(&self, class: &str, name: &str) -> bool {
        self.class_new_instance.matches(class, name)
            || self.constructor_new_instance.matches(class, name)
    }
}

impl Validatable for ReflectionConfig {
    fn validate(&self) -> ConfigResult<()> {
        let all = self
            .class_lookup
            .iter()
            .chain(self.reflective_methods().into_iter());
        for pattern in all {
            if pattern.class.trim().is_empty() || pattern.name.trim().is_empty() {
                return Err(ConfigError::validation(
                    self.config_name(),
                    format!("blank method pattern '{}'", pattern),
                ));
            }
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "ReflectionConfig"
    }
}

/// Tailoring analysis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailorConfig {
    /// Keep loops and recursion; when false, back edges are redirected
    /// to loop exits and recursive call edges are blocked.
    pub retain_cycle: bool,

    /// Discover extension points through points-to information
    pub extend_sc: bool,

    /// Treat library methods as leaves
    pub exclude_library: bool,

    /// Discard extension candidates located in library methods
    pub exclude_library_extension: bool,

    /// Methods of classes under these package prefixes are never entered
    pub block_package_prefixes: Vec<String>,

    /// Report output directory
    pub out_dir: PathBuf,

    pub reflection: ReflectionConfig,

    /// Name of static initializer methods
    pub static_initializer_name: String,

    /// Name of the synthetic class-literal helper
    pub class_literal_method: String,
}

impl Default for TailorConfig {
    fn default() -> Self {
        Self {
            retain_cycle: true,
            extend_sc: true,
            exclude_library: false,
            exclude_library_extension: false,
            block_package_prefixes: Vec::new(),
            out_dir: PathBuf::from("output"),
            reflection: ReflectionConfig::default(),
            static_initializer_name: "<clinit>".to_string(),
            class_literal_method: "class$".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ConfigFileV1 {
    version: u32,
    #[serde(flatten)]
    config: TailorConfig,
}

#[derive(Serialize)]
struct ConfigFileV1Ref<'a> {
    version: u32,
    #[serde(flatten)]
    config: &'a TailorConfig,
}

impl TailorConfig {
    pub fn retain_cycle(mut self, value: bool) -> Self {
        self.retain_cycle = value;
        self
    }

    pub fn extend_sc(mut self, value: bool) -> Self {
        self.extend_sc = value;
        self
    }

    pub fn exclude_library(mut self, value: bool) -> Self {
        self.exclude_library = value;
        self
    }

    pub fn exclude_library_extension(mut self, value: bool) -> Self {
        self.exclude_library_extension = value;
        self
    }

    pub fn block_package_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.block_package_prefixes.push(prefix.into());
        self
    }

    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn is_static_initializer(&self, method_name: &str) -> bool {
        method_name == self.static_initializer_name
    }

    /// Parse a versioned YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let version = value
            .get("version")
            .ok_or(ConfigError::MissingVersion)?
            .as_u64()
            .ok_or(ConfigError::MissingVersion)? as u32;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let file: ConfigFileV1 = serde_yaml::from_value(value)?;
        debug_assert_eq!(file.version, version);
        file.config.validate()?;
        Ok(file.config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(&ConfigFileV1Ref {
            version: 1,
            config: self,
        })?)
    }
}

impl Validatable for TailorConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::validation(
                self.config_name(),
                "out_dir must not be empty",
            ));
        }
        if self.static_initializer_name.trim().is_empty() {
            return Err(ConfigError::validation(
                self.config_name(),
                "static_initializer_name must not be empty",
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for prefix in &self.block_package_prefixes {
            if prefix.trim().is_empty() {
                return Err(ConfigError::validation(
                    self.config_name(),
                    "blank package prefix in block_package_prefixes",
                ));
            }
            if !seen.insert(prefix.as_str()) {
                return Err(ConfigError::validation(
                    self.config_name(),
                    format!("duplicate package prefix '{}'", prefix),
                ));
            }
        }

        self.reflection.validate()
    }

    fn config_name(&self) -> &'static str {
        "TailorConfig"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = TailorConfig::default();
        assert!(config.retain_cycle);
        assert!(config.extend_sc);
        assert!(!config.exclude_library);
        assert_eq!(config.out_dir, PathBuf::from("output"));
        assert!(config.is_static_initializer("<clinit>"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = TailorConfig::default()
            .retain_cycle(false)
            .block_package_prefix("sun.");

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("retain_cycle: false"));
        assert!(yaml.contains("java.lang.Class.forName"));

        let parsed = TailorConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_yaml_loading_partial() {
        let yaml_content = r#"
version: 1
extend_sc: false
block_package_prefixes: ["jdk.internal", "sun."]
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = TailorConfig::from_yaml_file(temp_file.path()).unwrap();
        assert!(!config.extend_sc);
        assert!(config.retain_cycle);
        assert_eq!(config.block_package_prefixes.len(), 2);
    }

    #[test]
    fn test_yaml_missing_version() {
        let result = TailorConfig::from_yaml_str("extend_sc: false\n");
        assert!(matches!(result, Err(ConfigError::MissingVersion)));
    }

    #[test]
    fn test_yaml_unsupported_version() {
        let result = TailorConfig::from_yaml_str("version: 7\n");
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedVersion { found: 7, .. })
        ));
    }

    #[test]
    fn test_duplicate_prefix_rejected() {
        let config = TailorConfig::default()
            .block_package_prefix("sun.")
            .block_package_prefix("sun.");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_method_pattern_parse() {
        let p = MethodPattern::parse("java.lang.reflect.Method.invoke").unwrap();
        assert_eq!(p.class, "java.lang.reflect.Method");
        assert_eq!(p.name, "invoke");
        assert!(MethodPattern::parse("invoke").is_err());
        assert!(MethodPattern::parse("java.lang.Class.").is_err());
    }
}
