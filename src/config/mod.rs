//! Configuration management for the module loader
//!
//! Handles configuration loading (TOML), environment overrides and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::module::traits::LoaderError;
use crate::utils::env::{env_bool, env_int, env_opt};

/// Resource locator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Base path that alias-prefixed tokens expand to
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Reserved prefix character marking an alias token
    #[serde(default = "default_alias_prefix")]
    pub alias_prefix: char,

    /// Request minified resource variants (`{min:<suffix>}` patterns)
    #[serde(default)]
    pub minified: bool,
}

fn default_base_path() -> String {
    "/static".to_string()
}

fn default_alias_prefix() -> char {
    '~'
}

fn default_manifests_dir() -> String {
    "modules".to_string()
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            alias_prefix: default_alias_prefix(),
            minified: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "module_loader=debug"); RUST_LOG takes precedence
    pub filter: Option<String>,

    /// Emit JSON log lines (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Loader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Resource locator settings
    #[serde(default)]
    pub locator: LocatorConfig,

    /// Directory scanned for `*.module.toml` manifests
    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: String,

    /// Upper bound for `Loader::wait_for` (no bound when unset)
    #[serde(default)]
    pub wait_timeout_secs: Option<u64>,

    /// Logging settings
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            locator: LocatorConfig::default(),
            manifests_dir: default_manifests_dir(),
            wait_timeout_secs: None,
            logging: None,
        }
    }
}

impl LoaderConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LoaderError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, LoaderError> {
        let config: LoaderConfig = toml::from_str(contents)
            .map_err(|e| LoaderError::Config(format!("Failed to parse config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LOADER_*` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(base_path) = env_opt("LOADER_BASE_PATH") {
            self.locator.base_path = base_path;
        }
        if env_opt("LOADER_MINIFIED").is_some() {
            self.locator.minified = env_bool("LOADER_MINIFIED");
        }
        if let Some(dir) = env_opt("LOADER_MANIFESTS_DIR") {
            self.manifests_dir = dir;
        }
        if let Some(secs) = env_int::<u64>("LOADER_WAIT_TIMEOUT_SECS") {
            self.wait_timeout_secs = Some(secs);
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.locator.base_path.trim().is_empty() {
            return Err(LoaderError::Config(
                "locator.base_path cannot be empty".to_string(),
            ));
        }
        let prefix = self.locator.alias_prefix;
        if prefix.is_alphanumeric() || prefix.is_whitespace() || prefix == '/' {
            return Err(LoaderError::Config(format!(
                "locator.alias_prefix '{}' must be a reserved symbol",
                prefix
            )));
        }
        Ok(())
    }

    /// Wait timeout as a `Duration`
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.locator.base_path, "/static");
        assert_eq!(config.locator.alias_prefix, '~');
        assert!(!config.locator.minified);
        assert_eq!(config.manifests_dir, "modules");
        assert!(config.wait_timeout().is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = LoaderConfig::from_toml_str(
            r#"
            wait_timeout_secs = 5

            [locator]
            base_path = "https://cdn.example.com/assets"
            minified = true

            [logging]
            filter = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.locator.base_path, "https://cdn.example.com/assets");
        assert!(config.locator.minified);
        assert_eq!(config.locator.alias_prefix, '~');
        assert_eq!(config.wait_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(
            config.logging.and_then(|l| l.filter),
            Some("debug".to_string())
        );
    }

    #[test]
    fn test_rejects_alphanumeric_prefix() {
        let result = LoaderConfig::from_toml_str(
            r#"
            [locator]
            alias_prefix = "a"
            "#,
        );
        assert!(matches!(result, Err(LoaderError::Config(_))));
    }

    #[test]
    fn test_rejects_empty_base_path() {
        let mut config = LoaderConfig::default();
        config.locator.base_path = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
