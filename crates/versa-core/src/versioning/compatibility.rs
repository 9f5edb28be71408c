//! Directional compatibility between API versions
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::versioning::migration::MigrationRegistry;
use crate::versioning::version::{ApiVersion, VersionRegistry};
use serde::Serialize;

/// One adjacent hop of an upgrade path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationStep {
    pub from: ApiVersion,
    pub to: ApiVersion,
    /// Whether a transform is registered for exactly this hop
    pub has_transform: bool,
}

/// Answers compatibility questions from version ranks
///
/// Compatibility only ever runs forward. A reverse transform in the migration
/// registry does not make a downgrade compatible.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityResolver<'a> {
    versions: &'a VersionRegistry,
    migrations: &'a MigrationRegistry,
}

impl<'a> CompatibilityResolver<'a> {
    pub fn new(versions: &'a VersionRegistry, migrations: &'a MigrationRegistry) -> Self {
        Self {
            versions,
            migrations,
        }
    }

    /// True for the same version or a strictly higher-ranked target
    pub fn are_versions_compatible(&self, from: ApiVersion, to: ApiVersion) -> bool {
        let (Some(source), Some(target)) = (self.versions.get(from), self.versions.get(to)) else {
            return false;
        };

        from == to || target.rank > source.rank
    }

    /// Every registered version from `from` to `to` inclusive, by rank
    ///
    /// Empty when the pair is incompatible or when there is nothing to
    /// upgrade. The path is rank-based and does not depend on which adjacent
    /// transforms happen to be registered.
    pub fn get_upgrade_path(&self, from: ApiVersion, to: ApiVersion) -> Vec<ApiVersion> {
        if from == to || !self.are_versions_compatible(from, to) {
            return Vec::new();
        }

        let (low, high) = (from.rank(), to.rank());
        self.versions
            .iter()
            .filter(|entry| entry.rank >= low && entry.rank <= high)
            .map(|entry| entry.version)
            .collect()
    }

    /// Adjacent hops of the upgrade path annotated with transform availability
    pub fn migration_steps(&self, from: ApiVersion, to: ApiVersion) -> Vec<MigrationStep> {
        self.get_upgrade_path(from, to)
            .windows(2)
            .map(|hop| MigrationStep {
                from: hop[0],
                to: hop[1],
                has_transform: self.migrations.has_migration(hop[0], hop[1]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::migration::{MigrationFn, MigrationKey, TransformError};
    use crate::versioning::version::VersionMetadata;
    use serde_json::Value;
    use std::sync::Arc;

    fn versions() -> VersionRegistry {
        VersionRegistry::from_entries(vec![
            VersionMetadata::new(ApiVersion::V1),
            VersionMetadata::new(ApiVersion::V2),
        ])
        .unwrap()
    }

    fn both_directions() -> MigrationRegistry {
        let identity: Arc<MigrationFn> = Arc::new(|value: Value| Ok::<_, TransformError>(value));
        MigrationRegistry::from_entries(vec![
            (MigrationKey::new(ApiVersion::V1, ApiVersion::V2), identity.clone()),
            (MigrationKey::new(ApiVersion::V2, ApiVersion::V1), identity),
        ])
        .unwrap()
    }

    #[test]
    fn test_forward_only_compatibility() {
        let versions = versions();
        let migrations = both_directions();
        let resolver = CompatibilityResolver::new(&versions, &migrations);

        assert!(resolver.are_versions_compatible(ApiVersion::V1, ApiVersion::V2));
        assert!(resolver.are_versions_compatible(ApiVersion::V1, ApiVersion::V1));
        // a registered reverse transform does not make a downgrade compatible
        assert!(!resolver.are_versions_compatible(ApiVersion::V2, ApiVersion::V1));
    }

    #[test]
    fn test_upgrade_paths() {
        let versions = versions();
        let migrations = MigrationRegistry::default();
        let resolver = CompatibilityResolver::new(&versions, &migrations);

        assert_eq!(
            resolver.get_upgrade_path(ApiVersion::V1, ApiVersion::V2),
            vec![ApiVersion::V1, ApiVersion::V2]
        );
        assert!(resolver.get_upgrade_path(ApiVersion::V2, ApiVersion::V1).is_empty());
        assert!(resolver.get_upgrade_path(ApiVersion::V1, ApiVersion::V1).is_empty());
    }

    #[test]
    fn test_unregistered_version_is_incompatible() {
        let versions =
            VersionRegistry::from_entries(vec![VersionMetadata::new(ApiVersion::V1)]).unwrap();
        let migrations = MigrationRegistry::default();
        let resolver = CompatibilityResolver::new(&versions, &migrations);

        assert!(!resolver.are_versions_compatible(ApiVersion::V1, ApiVersion::V2));
        assert!(resolver.get_upgrade_path(ApiVersion::V1, ApiVersion::V2).is_empty());
    }

    #[test]
    fn test_migration_steps_report_transforms() {
        let versions = versions();
        let empty = MigrationRegistry::default();
        let steps = CompatibilityResolver::new(&versions, &empty)
            .migration_steps(ApiVersion::V1, ApiVersion::V2);
        assert_eq!(steps.len(), 1);
        assert!(!steps[0].has_transform);

        let migrations = both_directions();
        let steps = CompatibilityResolver::new(&versions, &migrations)
            .migration_steps(ApiVersion::V1, ApiVersion::V2);
        assert!(steps[0].has_transform);
    }
}
