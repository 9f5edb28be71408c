//! Versa Core - API version negotiation, schema migration and version routing
//!
//! This crate decides which revision of an API a request is speaking, reshapes
//! records between revisions and dispatches requests to per-version handlers.
//!
//! # Main Components
//!
//! - **Versioning**: the closed version set, deprecation windows, directional
//!   compatibility and record migration
//! - **Features**: per-version capability flags addressed by dotted paths
//! - **Cursors**: opaque pagination tokens that fail safe
//! - **Negotiation**: header, URL and `Accept` signals resolved to one version
//! - **Routing**: handler dispatch with version and deprecation headers
//!
//! Everything is registered once into a [`Registry`] and shared read-only.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use versa_core::{catalog, ApiVersion, VersionNegotiator};
//!
//! fn example() -> anyhow::Result<()> {
//!     let registry = Arc::new(catalog::builtin_registry()?);
//!     let negotiator = VersionNegotiator::new(Arc::clone(&registry), "versa")?;
//!
//!     let request = http::Request::get("/api/v1/words").body(())?;
//!     let result = negotiator.negotiate(&request)?;
//!     assert_eq!(result.version, ApiVersion::V1);
//!     assert!(result.is_deprecated);
//!     Ok(())
//! }
//! ```
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

pub mod catalog;
pub mod config;
pub mod cursor;
pub mod error;
pub mod features;
pub mod negotiation;
pub mod registry;
pub mod router;
pub mod versioning;

pub use config::{CatalogConfig, CursorConfig, VersionEntry};
pub use cursor::{Cursor, CursorCodec, DEFAULT_PAGE_LIMIT};
pub use error::{Error, Result};
pub use features::{FeatureMatrix, FeatureNode, FeatureTree};
pub use negotiation::{
    NegotiationResult, VersionNegotiator, VersionSource, API_VERSION_FALLBACK_HEADER,
    API_VERSION_HEADER, DEFAULT_PRODUCT,
};
pub use registry::{Registry, RegistryBuilder};
pub use router::{
    create_version_router, HandlerContext, HandlerResult, HandlersByVersion, RouterOptions,
    VersionHandler, VersionRouter, VersionRouterBuilder,
};
pub use versioning::{
    ApiVersion, CompatibilityResolver, DeprecationInfo, MigrationKey, MigrationRegistry,
    MigrationStep, TransformError, VersionMetadata, VersionRegistry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
