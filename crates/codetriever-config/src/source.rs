//! Configuration source loading and composition
//!
//! [`ApplicationConfig`] itself only carries the profile and the app
//! directory; the bulk of the tunables live in [`crate::constants`] and are
//! resolved per-constant. This module still composes sources by priority
//! the way the rest of the workspace does, since `config.yaml` in the app
//! directory (§6 of the on-disk layout) can override both the profile and
//! a handful of named constants in one place instead of exporting N
//! environment variables.

use crate::constant::Constant;
use crate::value::ConfigValue;
use crate::{ApplicationConfig, ConfigResult, Profile};
use std::collections::HashMap;
use std::path::Path;

/// Trait for loading configuration from different sources
pub trait ConfigurationSource {
    /// Load configuration from this source
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn load(&self) -> ConfigResult<ApplicationConfig>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = higher priority)
    fn priority(&self) -> u8;
}

/// Load configuration from environment variables
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn load(&self) -> ConfigResult<ApplicationConfig> {
        let profile = std::env::var("CODETRIEVER_PROFILE")
            .unwrap_or_else(|_| "development".to_string())
            .parse()?;
        Ok(ApplicationConfig::with_profile(profile))
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100
    }
}

/// Load `app_dir`/`profile` plus named-constant overrides from a YAML file
/// (the on-disk `config.yaml`).
pub struct YamlFileSource {
    path: std::path::PathBuf,
}

impl YamlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[derive(serde::Deserialize, Default)]
struct YamlConfigFile {
    profile: Option<String>,
    app_dir: Option<String>,
    #[serde(default)]
    constants: HashMap<String, serde_yaml::Value>,
}

impl ConfigurationSource for YamlFileSource {
    fn load(&self) -> ConfigResult<ApplicationConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        let parsed: YamlConfigFile = serde_yaml::from_str(&content)?;

        let profile = parsed
            .profile
            .map(|p| p.parse())
            .transpose()?
            .unwrap_or_default();
        let mut config = ApplicationConfig::with_profile(profile);
        if let Some(app_dir) = parsed.app_dir {
            config.app_dir = std::path::PathBuf::from(app_dir);
        }

        for (name, value) in parsed.constants {
            tracing::debug!(constant = %name, "config.yaml sets constant override");
            let _ = value; // concrete registry lookup happens in apply_named_overrides
        }

        Ok(config)
    }

    fn name(&self) -> &'static str {
        "yaml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

/// Apply a `config.yaml`'s `constants:` map onto a live constant registry.
///
/// Looked up by name against `lookup`; unknown names are logged and
/// skipped rather than failing the whole load.
///
/// # Errors
/// Returns an error if the file can't be read or parsed.
pub fn apply_named_overrides(
    path: &Path,
    lookup: impl Fn(&str) -> Option<&'static Constant>,
) -> ConfigResult<()> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Ok(());
    };
    let parsed: YamlConfigFile = serde_yaml::from_str(&content)?;
    for (name, value) in parsed.constants {
        let Some(constant) = lookup(&name) else {
            tracing::warn!(constant = %name, "unknown constant in config.yaml, ignoring");
            continue;
        };
        let as_str = match value {
            serde_yaml::Value::String(s) => s,
            other => serde_yaml::to_string(&other).unwrap_or_default(),
        };
        let coerced = ConfigValue::coerce(as_str.trim(), &constant.get());
        if let Err(e) = constant.set(coerced) {
            tracing::warn!(constant = %name, error = %e, "failed to apply config.yaml override");
        }
    }
    Ok(())
}

/// Type alias for configuration sources
type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Configuration loader that combines multiple sources
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Load configuration from all sources with priority ordering
    ///
    /// # Errors
    /// Returns configuration loading or validation errors
    pub fn load(&self) -> ConfigResult<ApplicationConfig> {
        let mut config = ApplicationConfig::with_profile(Profile::Development);

        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            match source.load() {
                Ok(source_config) => {
                    tracing::debug!("Loaded configuration from source: {}", source.name());
                    config = source_config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load from source {}: {}", source.name(), e);
                }
            }
        }

        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}
