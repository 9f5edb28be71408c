//! Configuration management for the CLI
//!
//! A configuration file holds the served catalog at its top level, plus
//! optional `output` and `logging` sections. It is looked up in order:
//! - `--config` / `VERSA_CONFIG`
//! - `.versa.yaml`, `.versa.json`, `versa.toml` in the working directory
//! - `config.yaml` in the user config directory (e.g. `~/.config/versa/`)
//! - the built-in catalog

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use versa_core::{CatalogConfig, Registry};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Served versions, features and negotiation settings
    #[serde(flatten)]
    pub catalog: CatalogConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// File this configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Config {
    /// Load configuration from a file, picking the parser by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Self = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid TOML in {}: {}", path.display(), e)))?,
            _ => {
                return Err(Error::InvalidFormat {
                    path: path.to_path_buf(),
                    expected: "YAML, JSON or TOML".to_string(),
                })
            }
        };

        config.source = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        match Self::default_config_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::debug!("No configuration file found, using the built-in catalog");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Project-level files checked in the working directory
    pub fn project_config_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(".versa.yaml"),
            PathBuf::from(".versa.json"),
            PathBuf::from("versa.toml"),
        ]
    }

    /// Per-user configuration file
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("versa").join("config.yaml"))
    }

    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Self::project_config_paths();
        paths.extend(Self::user_config_path());
        paths
    }

    /// Validate by sealing the catalog
    pub fn validate(&self) -> Result<()> {
        self.catalog.validate()?;
        Ok(())
    }

    /// Seal the catalog into a shareable registry
    pub fn registry(&self) -> Result<Arc<Registry>> {
        Ok(Arc::new(self.catalog.clone().into_registry()?))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e)))?,
            _ => serde_yaml::to_string(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versa_core::ApiVersion;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.output.color);

        let registry = config.registry().unwrap();
        assert_eq!(registry.default_version(), ApiVersion::V2);
    }

    #[test]
    fn test_yaml_with_cli_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("versa.yaml");
        std::fs::write(
            &path,
            r#"
product: lexicon
include_version_headers: false
versions:
  - version: v2
features: {}
output:
  color: false
logging:
  level: debug
  format: json
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.catalog.product, "lexicon");
        assert!(!config.catalog.include_version_headers);
        assert!(!config.output.color);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.source.as_deref(), Some(path.as_path()));

        let registry = config.registry().unwrap();
        assert!(!registry.versions().is_registered(ApiVersion::V1));
    }

    #[test]
    fn test_save_and_reload_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::default();
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.catalog, config.catalog);
        assert_eq!(loaded.logging, config.logging);
    }

    #[test]
    fn test_missing_and_unknown_files() {
        let result = Config::from_file(Path::new("/nonexistent/versa.yaml"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("versa.ini");
        std::fs::write(&path, "product = versa").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(Error::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_invalid_catalog_fails_validation() {
        let mut config = Config::default();
        config.catalog.versions.clear();
        assert!(config.validate().is_err());
    }
}
