//! Built-in version catalog
//!
//! The stock deployment serves two revisions of the vocabulary API: `v1`,
//! deprecated on 2024-06-01 and sunset on 2025-06-01, and `v2`, the current
//! default. This module carries their metadata, capability trees and the
//! vocabulary record transforms between them.
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use crate::features::{FeatureNode, FeatureTree};
use crate::registry::{Registry, RegistryBuilder};
use crate::versioning::{ApiVersion, TransformError, VersionMetadata};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

fn midnight_utc(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()
}

/// When `v1` was deprecated
pub fn v1_deprecated_at() -> Option<DateTime<Utc>> {
    midnight_utc(2024, 6, 1)
}

/// When `v1` stops being served
pub fn v1_sunset_at() -> Option<DateTime<Utc>> {
    midnight_utc(2025, 6, 1)
}

/// Metadata for every built-in version, in rank order
pub fn builtin_versions() -> Vec<VersionMetadata> {
    vec![
        VersionMetadata::new(ApiVersion::V1).deprecated(v1_deprecated_at(), v1_sunset_at()),
        VersionMetadata::new(ApiVersion::V2),
    ]
}

fn flag(enabled: bool) -> FeatureNode {
    FeatureNode::Flag(enabled)
}

fn tree<const N: usize>(entries: [(&str, FeatureNode); N]) -> FeatureTree {
    entries
        .into_iter()
        .map(|(name, node)| (name.to_string(), node))
        .collect()
}

fn group<const N: usize>(entries: [(&str, FeatureNode); N]) -> FeatureNode {
    FeatureNode::Group(tree(entries))
}

/// Capability trees for the built-in versions
pub fn builtin_features() -> BTreeMap<ApiVersion, FeatureTree> {
    let v1 = tree([
        ("pagination", group([("offset", flag(true)), ("cursor", flag(false))])),
        (
            "filtering",
            group([("basic", flag(true)), ("advanced", flag(false))]),
        ),
        (
            "sorting",
            group([("single_field", flag(true)), ("multi_field", flag(false))]),
        ),
        (
            "responses",
            group([("envelope", flag(false)), ("links", flag(false))]),
        ),
        (
            "descriptions",
            group([("plain_text", flag(true)), ("markdown", flag(false))]),
        ),
    ]);

    let v2 = tree([
        ("pagination", group([("offset", flag(true)), ("cursor", flag(true))])),
        (
            "filtering",
            group([("basic", flag(true)), ("advanced", flag(true))]),
        ),
        (
            "sorting",
            group([("single_field", flag(true)), ("multi_field", flag(true))]),
        ),
        (
            "responses",
            group([("envelope", flag(true)), ("links", flag(true))]),
        ),
        (
            "descriptions",
            group([("plain_text", flag(true)), ("markdown", flag(true))]),
        ),
    ]);

    BTreeMap::from([(ApiVersion::V1, v1), (ApiVersion::V2, v2)])
}

/// Human label for a numeric difficulty level
pub fn difficulty_label(level: &Value) -> Option<&'static str> {
    let label = match level.as_u64()? {
        1 => "beginner",
        2 => "elementary",
        3 => "intermediate",
        4 => "advanced",
        5 => "expert",
        _ => return None,
    };
    Some(label)
}

fn into_object(record: Value) -> std::result::Result<Map<String, Value>, TransformError> {
    match record {
        Value::Object(map) => Ok(map),
        other => Err(TransformError::new(format!(
            "expected a vocabulary object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reshape a flat `v1` vocabulary record into the nested `v2` layout
///
/// `language` becomes `{code}`, `difficulty_level` becomes `difficulty.level`
/// with a derived `label`, and both timestamps move under `timestamps`.
/// Fields the transform does not know about are carried over as they are.
pub fn vocabulary_v1_to_v2(record: Value) -> std::result::Result<Value, TransformError> {
    let mut fields = into_object(record)?;

    if let Some(code) = fields.remove("language") {
        let mut language = Map::new();
        language.insert("code".to_string(), code);
        fields.insert("language".to_string(), Value::Object(language));
    }

    if let Some(level) = fields.remove("difficulty_level") {
        let mut difficulty = Map::new();
        if let Some(label) = difficulty_label(&level) {
            difficulty.insert("label".to_string(), Value::from(label));
        }
        difficulty.insert("level".to_string(), level);
        fields.insert("difficulty".to_string(), Value::Object(difficulty));
    }

    let mut timestamps = Map::new();
    for key in ["created_at", "updated_at"] {
        if let Some(at) = fields.remove(key) {
            timestamps.insert(key.to_string(), at);
        }
    }
    if !timestamps.is_empty() {
        fields.insert("timestamps".to_string(), Value::Object(timestamps));
    }

    Ok(Value::Object(fields))
}

/// Flatten a `v2` vocabulary record back into the `v1` layout
pub fn vocabulary_v2_to_v1(record: Value) -> std::result::Result<Value, TransformError> {
    let mut fields = into_object(record)?;

    match fields.remove("language") {
        Some(Value::Object(mut language)) => {
            let code = language.remove("code").ok_or_else(|| {
                TransformError::new("language object has no code")
            })?;
            fields.insert("language".to_string(), code);
        }
        Some(code) => {
            fields.insert("language".to_string(), code);
        }
        None => {}
    }

    match fields.remove("difficulty") {
        Some(Value::Object(mut difficulty)) => {
            let level = difficulty.remove("level").ok_or_else(|| {
                TransformError::new("difficulty object has no level")
            })?;
            fields.insert("difficulty_level".to_string(), level);
        }
        Some(other) => {
            return Err(TransformError::new(format!(
                "difficulty must be an object, got {}",
                json_kind(&other)
            )));
        }
        None => {}
    }

    match fields.remove("timestamps") {
        Some(Value::Object(timestamps)) => {
            for (key, at) in timestamps {
                fields.insert(key, at);
            }
        }
        Some(other) => {
            return Err(TransformError::new(format!(
                "timestamps must be an object, got {}",
                json_kind(&other)
            )));
        }
        None => {}
    }

    Ok(Value::Object(fields))
}

/// Add the vocabulary transforms in both directions
pub fn register_builtin_migrations(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .register_migration(ApiVersion::V1, ApiVersion::V2, vocabulary_v1_to_v2)
        .register_migration(ApiVersion::V2, ApiVersion::V1, vocabulary_v2_to_v1)
}

/// Builder preloaded with the built-in versions, features and transforms
pub fn builtin_builder() -> RegistryBuilder {
    let mut builder = Registry::builder();
    for metadata in builtin_versions() {
        builder = builder.version(metadata);
    }
    for (version, tree) in builtin_features() {
        builder = builder.features(version, tree);
    }
    register_builtin_migrations(builder).default_version(ApiVersion::V2)
}

/// The sealed built-in registry
pub fn builtin_registry() -> Result<Registry> {
    builtin_builder().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn v1_record() -> Value {
        json!({
            "id": "w-42",
            "language": "es",
            "difficulty_level": 3,
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-02-01T08:30:00Z",
            "term": "biblioteca"
        })
    }

    #[test]
    fn test_builtin_registry_shape() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.default_version(), ApiVersion::V2);
        assert!(registry.is_version_deprecated(ApiVersion::V1));
        assert!(!registry.is_version_deprecated(ApiVersion::V2));

        let info = registry
            .versions()
            .get_deprecation_info(ApiVersion::V1)
            .unwrap();
        assert!(info.deprecated_at.unwrap() < info.sunset_at.unwrap());
        assert!(registry.versions().get_deprecation_info(ApiVersion::V2).is_none());
    }

    #[test]
    fn test_builtin_features() {
        let registry = builtin_registry().unwrap();
        assert!(!registry.has_feature(ApiVersion::V1, "pagination.cursor"));
        assert!(registry.has_feature(ApiVersion::V2, "pagination.cursor"));
        assert!(!registry.has_feature(ApiVersion::V2, "nonexistent.path"));
        assert!(registry.has_feature(ApiVersion::V2, "descriptions.markdown"));
    }

    #[test]
    fn test_v1_to_v2_reshapes_record() {
        let upgraded = vocabulary_v1_to_v2(v1_record()).unwrap();
        assert_eq!(
            upgraded,
            json!({
                "id": "w-42",
                "language": { "code": "es" },
                "difficulty": { "level": 3, "label": "intermediate" },
                "timestamps": {
                    "created_at": "2024-01-15T10:00:00Z",
                    "updated_at": "2024-02-01T08:30:00Z"
                },
                "term": "biblioteca"
            })
        );
    }

    #[test]
    fn test_round_trip_reproduces_v1_fields() {
        let registry = builtin_registry().unwrap();
        let upgraded = registry
            .migrate_data(v1_record(), ApiVersion::V1, ApiVersion::V2)
            .unwrap();
        let restored = registry
            .migrate_data(upgraded, ApiVersion::V2, ApiVersion::V1)
            .unwrap();
        assert_eq!(restored, v1_record());
    }

    #[test]
    fn test_unlabelled_difficulty_survives_round_trip() {
        let record = json!({ "id": 1, "difficulty_level": "custom" });
        let upgraded = vocabulary_v1_to_v2(record.clone()).unwrap();
        assert_eq!(upgraded["difficulty"], json!({ "level": "custom" }));
        assert_eq!(vocabulary_v2_to_v1(upgraded).unwrap(), record);
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = vocabulary_v1_to_v2(json!([1, 2, 3])).unwrap_err();
        assert!(err.to_string().contains("an array"));
        assert!(vocabulary_v2_to_v1(json!("text")).is_err());
    }

    #[test]
    fn test_malformed_v2_difficulty_is_rejected() {
        let registry = builtin_registry().unwrap();
        let result = registry.migrate_data(
            json!({ "id": 1, "difficulty": 4 }),
            ApiVersion::V2,
            ApiVersion::V1,
        );
        assert!(matches!(result, Err(crate::Error::Transform { .. })));
    }
}
