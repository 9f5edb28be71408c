//! Migration, compatibility and registry sealing across modules


use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_support::{builtin, v1_vocabulary};
use versa_core::{
    ApiVersion, Error, MigrationStep, Registry, TransformError, VersionMetadata,
};

#[test]
fn test_identity_migration() {
    let registry = builtin();
    let data = json!({ "anything": [1, 2, 3] });
    for version in ApiVersion::ALL {
        assert_eq!(
            registry.migrate_data(data.clone(), version, version).unwrap(),
            data
        );
    }
}

#[test]
fn test_vocabulary_round_trip() {
    let registry = builtin();
    let original = v1_vocabulary(7);

    let upgraded = registry
        .migrate_data(original.clone(), ApiVersion::V1, ApiVersion::V2)
        .unwrap();
    assert_eq!(upgraded["difficulty"]["label"], "elementary");
    assert_eq!(upgraded["language"], json!({ "code": "fr" }));

    let restored = registry
        .migrate_data(upgraded, ApiVersion::V2, ApiVersion::V1)
        .unwrap();
    for field in ["id", "language", "difficulty_level", "created_at", "updated_at"] {
        assert_eq!(restored[field], original[field], "{field}");
    }
}

#[test]
fn test_batch_preserves_count_and_order() {
    let registry = builtin();

    assert_eq!(
        registry
            .batch_migrate_data(Vec::new(), ApiVersion::V1, ApiVersion::V2)
            .unwrap(),
        Vec::<Value>::new()
    );

    let items: Vec<Value> = (0..5).map(v1_vocabulary).collect();
    let migrated = registry
        .batch_migrate_data(items, ApiVersion::V1, ApiVersion::V2)
        .unwrap();
    assert_eq!(migrated.len(), 5);
    let ids: Vec<_> = migrated.iter().map(|item| item["id"].clone()).collect();
    assert_eq!(ids, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
}

#[test]
fn test_batch_fails_fast() {
    let registry = builtin();
    let items = vec![v1_vocabulary(1), json!("not a record"), v1_vocabulary(3)];
    let result = registry.batch_migrate_data(items, ApiVersion::V1, ApiVersion::V2);
    assert!(matches!(result, Err(Error::Transform { .. })));
}

#[test]
fn test_missing_pair_is_reported() {
    let registry = Registry::builder()
        .version(VersionMetadata::new(ApiVersion::V1))
        .version(VersionMetadata::new(ApiVersion::V2))
        .register_migration(ApiVersion::V1, ApiVersion::V2, |value: Value| {
            Ok::<_, TransformError>(value)
        })
        .build()
        .unwrap();

    match registry.migrate_data(json!({}), ApiVersion::V2, ApiVersion::V1) {
        Err(Error::MigrationNotFound { from, to }) => {
            assert_eq!((from, to), (ApiVersion::V2, ApiVersion::V1));
        }
        other => panic!("expected MigrationNotFound, got {other:?}"),
    }
}

#[test]
fn test_compatibility_is_directional() {
    let registry = builtin();
    let resolver = registry.compatibility();

    assert!(resolver.are_versions_compatible(ApiVersion::V1, ApiVersion::V2));
    assert!(resolver.are_versions_compatible(ApiVersion::V1, ApiVersion::V1));
    // a v2->v1 transform exists but does not make the pair compatible
    assert!(!resolver.are_versions_compatible(ApiVersion::V2, ApiVersion::V1));

    assert_eq!(
        resolver.get_upgrade_path(ApiVersion::V1, ApiVersion::V2),
        vec![ApiVersion::V1, ApiVersion::V2]
    );
    assert!(resolver.get_upgrade_path(ApiVersion::V1, ApiVersion::V1).is_empty());
    assert!(resolver.get_upgrade_path(ApiVersion::V2, ApiVersion::V1).is_empty());

    assert_eq!(
        resolver.migration_steps(ApiVersion::V1, ApiVersion::V2),
        vec![MigrationStep {
            from: ApiVersion::V1,
            to: ApiVersion::V2,
            has_transform: true,
        }]
    );
}

#[test]
fn test_registered_pairs() {
    let pairs: Vec<String> = builtin()
        .migrations()
        .registered_pairs()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(pairs, vec!["v1->v2", "v2->v1"]);
}
