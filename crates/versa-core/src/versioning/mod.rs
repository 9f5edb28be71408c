//! API versions, their compatibility and the transforms between them
//!
//! This module provides:
//! - The closed [`ApiVersion`] set and its rank ordering
//! - The sealed version catalog with deprecation windows
//! - Directional compatibility and upgrade paths
//! - Record migration between ordered version pairs
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

pub mod compatibility;
pub mod migration;
pub mod version;

pub use compatibility::{CompatibilityResolver, MigrationStep};
pub use migration::{MigrationFn, MigrationKey, MigrationRegistry, TransformError};
pub use version::{ApiVersion, DeprecationInfo, VersionMetadata, VersionRegistry};
