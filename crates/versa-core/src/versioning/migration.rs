//! Directed record transforms between API versions
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::versioning::version::ApiVersion;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Failure reported by a transform that cannot reshape a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransformError(String);

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A pure record transform for one ordered version pair
pub type MigrationFn = dyn Fn(Value) -> std::result::Result<Value, TransformError> + Send + Sync;

/// Ordered `(from, to)` pair a transform is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MigrationKey {
    pub from: ApiVersion,
    pub to: ApiVersion,
}

impl MigrationKey {
    pub fn new(from: ApiVersion, to: ApiVersion) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Sealed table of transforms, at most one per ordered pair
#[derive(Clone, Default)]
pub struct MigrationRegistry {
    transforms: HashMap<MigrationKey, Arc<MigrationFn>>,
}

impl MigrationRegistry {
    /// Seal registrations made through the builder, rejecting duplicate pairs
    pub(crate) fn from_entries(
        entries: Vec<(MigrationKey, Arc<MigrationFn>)>,
    ) -> Result<Self> {
        let mut transforms = HashMap::with_capacity(entries.len());

        for (key, transform) in entries {
            if key.from == key.to {
                return Err(Error::invalid_registry(format!(
                    "migration {} maps a version onto itself",
                    key
                )));
            }
            if transforms.insert(key, transform).is_some() {
                return Err(Error::DuplicateMigration {
                    from: key.from,
                    to: key.to,
                });
            }
        }

        Ok(Self { transforms })
    }

    /// Whether a transform is registered for exactly this pair
    pub fn has_migration(&self, from: ApiVersion, to: ApiVersion) -> bool {
        self.transforms.contains_key(&MigrationKey::new(from, to))
    }

    /// Registered pairs, sorted
    pub fn registered_pairs(&self) -> Vec<MigrationKey> {
        let mut keys: Vec<_> = self.transforms.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Migrate one record
    ///
    /// Same-version requests return `data` untouched. Otherwise only the
    /// transform registered for the exact `(from, to)` pair is used; adjacent
    /// transforms are never chained.
    pub fn migrate_data(&self, data: Value, from: ApiVersion, to: ApiVersion) -> Result<Value> {
        if from == to {
            return Ok(data);
        }

        let key = MigrationKey::new(from, to);
        let transform = self.transforms.get(&key).ok_or_else(|| {
            tracing::warn!(migration = %key, "No migration registered");
            Error::MigrationNotFound { from, to }
        })?;

        transform(data).map_err(|e| {
            tracing::warn!(migration = %key, error = %e, "Migration transform rejected record");
            Error::Transform {
                from,
                to,
                message: e.to_string(),
            }
        })
    }

    /// Migrate every item in order; the first failure aborts the whole batch
    pub fn batch_migrate_data(
        &self,
        items: Vec<Value>,
        from: ApiVersion,
        to: ApiVersion,
    ) -> Result<Vec<Value>> {
        tracing::debug!(from = %from, to = %to, count = items.len(), "Migrating batch");

        items
            .into_iter()
            .map(|item| self.migrate_data(item, from, to))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .registered_pairs()
            .iter()
            .map(ToString::to_string)
            .collect();
        f.debug_struct("MigrationRegistry")
            .field("transforms", &pairs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tag(label: &'static str) -> Arc<MigrationFn> {
        Arc::new(move |mut value: Value| -> std::result::Result<Value, TransformError> {
            let object = value
                .as_object_mut()
                .ok_or_else(|| TransformError::new("expected an object"))?;
            object.insert("migrated_by".to_string(), json!(label));
            Ok(value)
        })
    }

    fn registry() -> MigrationRegistry {
        MigrationRegistry::from_entries(vec![
            (MigrationKey::new(ApiVersion::V1, ApiVersion::V2), tag("v1->v2")),
            (MigrationKey::new(ApiVersion::V2, ApiVersion::V1), tag("v2->v1")),
        ])
        .unwrap()
    }

    #[test]
    fn test_identity_for_same_version() {
        let registry = MigrationRegistry::default();
        let data = json!({"id": "1", "nested": {"a": [1, 2]}});

        for version in ApiVersion::ALL {
            let migrated = registry.migrate_data(data.clone(), version, version).unwrap();
            assert_eq!(migrated, data);
        }
    }

    #[test]
    fn test_uses_exact_pair() {
        let registry = registry();
        let up = registry
            .migrate_data(json!({"id": "1"}), ApiVersion::V1, ApiVersion::V2)
            .unwrap();
        let down = registry
            .migrate_data(json!({"id": "1"}), ApiVersion::V2, ApiVersion::V1)
            .unwrap();

        assert_eq!(up["migrated_by"], "v1->v2");
        assert_eq!(down["migrated_by"], "v2->v1");
    }

    #[test]
    fn test_missing_pair_is_an_error() {
        let registry = MigrationRegistry::default();
        let err = registry
            .migrate_data(json!({}), ApiVersion::V1, ApiVersion::V2)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MigrationNotFound {
                from: ApiVersion::V1,
                to: ApiVersion::V2
            }
        ));
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let result = MigrationRegistry::from_entries(vec![
            (MigrationKey::new(ApiVersion::V1, ApiVersion::V2), tag("first")),
            (MigrationKey::new(ApiVersion::V1, ApiVersion::V2), tag("second")),
        ]);
        assert!(matches!(result, Err(Error::DuplicateMigration { .. })));
    }

    #[test]
    fn test_batch_preserves_order_and_count() {
        let registry = registry();
        assert!(registry
            .batch_migrate_data(vec![], ApiVersion::V1, ApiVersion::V2)
            .unwrap()
            .is_empty());

        let items: Vec<Value> = (0..5).map(|i| json!({ "id": i })).collect();
        let migrated = registry
            .batch_migrate_data(items, ApiVersion::V1, ApiVersion::V2)
            .unwrap();

        assert_eq!(migrated.len(), 5);
        for (i, item) in migrated.iter().enumerate() {
            assert_eq!(item["id"], i);
        }
    }

    #[test]
    fn test_batch_fails_fast() {
        let registry = registry();
        let items = vec![json!({"id": 1}), json!("not an object"), json!({"id": 3})];

        let err = registry
            .batch_migrate_data(items, ApiVersion::V1, ApiVersion::V2)
            .unwrap_err();
        assert!(matches!(err, Error::Transform { .. }));
    }

    #[test]
    fn test_registered_pairs_display() {
        let pairs: Vec<String> = registry()
            .registered_pairs()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(pairs, vec!["v1->v2", "v2->v1"]);
    }
}
