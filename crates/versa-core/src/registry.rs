//! Startup-time registration sealed into an immutable registry
//!
//! [`RegistryBuilder`] collects version metadata, migration transforms and
//! feature trees while the process initializes. [`RegistryBuilder::build`]
//! validates everything and returns a [`Registry`] that is only ever read
//! afterwards, typically shared behind an `Arc`.
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::cursor::{CursorCodec, DEFAULT_PAGE_LIMIT};
use crate::error::{Error, Result};
use crate::features::{FeatureMatrix, FeatureTree};
use crate::versioning::{
    ApiVersion, CompatibilityResolver, MigrationFn, MigrationKey, MigrationRegistry,
    TransformError, VersionMetadata, VersionRegistry,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Accumulates registrations before the registry is sealed
pub struct RegistryBuilder {
    versions: Vec<VersionMetadata>,
    migrations: Vec<(MigrationKey, Arc<MigrationFn>)>,
    features: BTreeMap<ApiVersion, FeatureTree>,
    default_version: Option<ApiVersion>,
    default_page_limit: u32,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            versions: Vec::new(),
            migrations: Vec::new(),
            features: BTreeMap::new(),
            default_version: None,
            default_page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Register a version; versions must be registered in ascending rank
    pub fn version(mut self, metadata: VersionMetadata) -> Self {
        self.versions.push(metadata);
        self
    }

    /// Register the transform for one ordered pair
    pub fn register_migration<F>(mut self, from: ApiVersion, to: ApiVersion, transform: F) -> Self
    where
        F: Fn(Value) -> std::result::Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.migrations
            .push((MigrationKey::new(from, to), Arc::new(transform)));
        self
    }

    /// Set the capability tree for a version, replacing any earlier one
    pub fn features(mut self, version: ApiVersion, tree: FeatureTree) -> Self {
        self.features.insert(version, tree);
        self
    }

    /// Version used when a request carries no version signal
    pub fn default_version(mut self, version: ApiVersion) -> Self {
        self.default_version = Some(version);
        self
    }

    /// Page size a malformed cursor decodes to
    pub fn default_page_limit(mut self, limit: u32) -> Self {
        self.default_page_limit = limit;
        self
    }

    /// Validate and seal the registrations
    pub fn build(self) -> Result<Registry> {
        let versions = VersionRegistry::from_entries(self.versions)?;
        if versions.is_empty() {
            return Err(Error::invalid_registry("no versions registered"));
        }

        for key in self.migrations.iter().map(|(key, _)| key) {
            for version in [key.from, key.to] {
                if !versions.is_registered(version) {
                    return Err(Error::invalid_registry(format!(
                        "migration {} references unregistered version {}",
                        key, version
                    )));
                }
            }
        }
        let migrations = MigrationRegistry::from_entries(self.migrations)?;

        if let Some(version) = self.features.keys().find(|v| !versions.is_registered(**v)) {
            return Err(Error::invalid_registry(format!(
                "feature tree given for unregistered version {}",
                version
            )));
        }

        let default_version = match self.default_version {
            Some(version) => version,
            None => versions
                .current()
                .ok_or_else(|| Error::invalid_registry("no supported version to default to"))?,
        };
        if !versions.is_supported(default_version) {
            return Err(Error::invalid_registry(format!(
                "default version {} is not a supported version",
                default_version
            )));
        }

        if self.default_page_limit == 0 {
            return Err(Error::invalid_registry("default page limit must be positive"));
        }

        tracing::debug!(
            versions = versions.len(),
            migrations = migrations.len(),
            default_version = %default_version,
            "Registry sealed"
        );

        Ok(Registry {
            versions,
            migrations,
            features: FeatureMatrix::from_trees(self.features),
            cursors: CursorCodec::new(self.default_page_limit),
            default_version,
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of every registration, safe to share across requests
#[derive(Debug, Clone)]
pub struct Registry {
    versions: VersionRegistry,
    migrations: MigrationRegistry,
    features: FeatureMatrix,
    cursors: CursorCodec,
    default_version: ApiVersion,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn versions(&self) -> &VersionRegistry {
        &self.versions
    }

    pub fn migrations(&self) -> &MigrationRegistry {
        &self.migrations
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn cursors(&self) -> &CursorCodec {
        &self.cursors
    }

    pub fn default_version(&self) -> ApiVersion {
        self.default_version
    }

    pub fn compatibility(&self) -> CompatibilityResolver<'_> {
        CompatibilityResolver::new(&self.versions, &self.migrations)
    }

    pub fn migrate_data(&self, data: Value, from: ApiVersion, to: ApiVersion) -> Result<Value> {
        self.migrations.migrate_data(data, from, to)
    }

    pub fn batch_migrate_data(
        &self,
        items: Vec<Value>,
        from: ApiVersion,
        to: ApiVersion,
    ) -> Result<Vec<Value>> {
        self.migrations.batch_migrate_data(items, from, to)
    }

    pub fn has_feature(&self, version: ApiVersion, path: &str) -> bool {
        self.features.has_feature(version, path)
    }

    pub fn is_version_deprecated(&self, version: ApiVersion) -> bool {
        self.versions.is_version_deprecated(version)
    }

    /// Error describing `requested` as unsupported, with the current lists
    pub fn unsupported(&self, requested: impl Into<String>) -> Error {
        Error::UnsupportedVersion {
            requested: requested.into(),
            supported: self.versions.supported_versions(),
            deprecated: self.versions.deprecated_versions(),
        }
    }
}
