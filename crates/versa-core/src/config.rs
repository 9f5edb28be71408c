//! Catalog configuration
//!
//! A [`CatalogConfig`] describes which versions a deployment serves, their
//! deprecation windows and capability trees, and how requests are negotiated.
//! It is read from YAML or JSON and turned into a sealed [`Registry`].
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::catalog;
use crate::cursor::DEFAULT_PAGE_LIMIT;
use crate::error::{Error, Result};
use crate::features::FeatureTree;
use crate::negotiation::DEFAULT_PRODUCT;
use crate::registry::Registry;
use crate::router::RouterOptions;
use crate::versioning::{ApiVersion, VersionMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Everything needed to build a registry and a router
///
/// Keys a file leaves out take their built-in values, except
/// `default_version` and `features`, which start empty so a catalog that
/// serves a different set of versions still seals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Vendor segment of the `Accept` media type
    pub product: String,

    /// Version served when a request carries no signal; latest supported if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<ApiVersion>,

    /// Stamp version headers on routed responses
    pub include_version_headers: bool,

    /// Register the vocabulary transforms between v1 and v2
    pub builtin_migrations: bool,

    /// Pagination settings
    pub cursor: CursorConfig,

    /// Served versions in ascending rank
    pub versions: Vec<VersionEntry>,

    /// Capability tree per version
    #[serde(default)]
    pub features: BTreeMap<ApiVersion, FeatureTree>,
}

/// Pagination settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Page size a malformed cursor falls back to
    pub default_limit: u32,
}

/// One version as written in a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: ApiVersion,

    #[serde(default = "default_true")]
    pub supported: bool,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            product: DEFAULT_PRODUCT.to_string(),
            default_version: Some(ApiVersion::V2),
            include_version_headers: true,
            builtin_migrations: true,
            cursor: CursorConfig::default(),
            versions: catalog::builtin_versions()
                .iter()
                .map(VersionEntry::from)
                .collect(),
            features: catalog::builtin_features(),
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl From<&VersionMetadata> for VersionEntry {
    fn from(metadata: &VersionMetadata) -> Self {
        Self {
            version: metadata.version,
            supported: metadata.supported,
            deprecated: metadata.deprecated,
            deprecated_at: metadata.deprecated_at,
            sunset_at: metadata.sunset_at,
        }
    }
}

impl VersionEntry {
    pub fn to_metadata(&self) -> VersionMetadata {
        let mut metadata = VersionMetadata::new(self.version);
        if self.deprecated {
            metadata = metadata.deprecated(self.deprecated_at, self.sunset_at);
        } else {
            // Dates without the flag are kept so sealing reports them
            metadata.deprecated_at = self.deprecated_at;
            metadata.sunset_at = self.sunset_at;
        }
        if !self.supported {
            metadata = metadata.unsupported();
        }
        metadata
    }
}

impl CatalogConfig {
    /// Load a catalog from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            message: format!("Failed to read {}", path.display()),
            source: e,
        })?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(Error::configuration(format!(
                "Unsupported catalog format {:?} for {}; use .yaml, .yml or .json",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Router switches carried by this catalog
    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            include_version_headers: self.include_version_headers,
            product: self.product.clone(),
        }
    }

    /// Check the catalog by building a throwaway registry
    pub fn validate(&self) -> Result<()> {
        if self.product.trim().is_empty() {
            return Err(Error::configuration("product must not be empty"));
        }
        self.clone().into_registry().map(|_| ())
    }

    /// Seal the catalog into a registry
    pub fn into_registry(self) -> Result<Registry> {
        let mut builder = Registry::builder().default_page_limit(self.cursor.default_limit);

        for entry in &self.versions {
            builder = builder.version(entry.to_metadata());
        }
        for (version, tree) in self.features {
            builder = builder.features(version, tree);
        }
        if let Some(version) = self.default_version {
            builder = builder.default_version(version);
        }

        if self.builtin_migrations {
            let registered = |v: ApiVersion| self.versions.iter().any(|e| e.version == v);
            if registered(ApiVersion::V1) && registered(ApiVersion::V2) {
                builder = catalog::register_builtin_migrations(builder);
            } else {
                tracing::debug!("Skipping built-in migrations; v1 and v2 are not both registered");
            }
        }

        builder.build()
    }
}
