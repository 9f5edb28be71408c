//! Error types for the Versa core library
//!
//! Every failure the negotiation, migration and routing layers can surface is a
//! variant of [`Error`]. Variants that reach an HTTP boundary know their own
//! status code and response body.
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::versioning::ApiVersion;
use http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Main error type for Versa operations
#[derive(Error, Debug)]
pub enum Error {
    /// The client asked for a version this deployment does not serve
    #[error("Unsupported API version: {requested}")]
    UnsupportedVersion {
        requested: String,
        supported: Vec<ApiVersion>,
        deprecated: Vec<ApiVersion>,
    },

    /// No transform is registered for the exact ordered pair
    #[error("No migration registered from {from} to {to}")]
    MigrationNotFound { from: ApiVersion, to: ApiVersion },

    /// A registered transform rejected the record it was given
    #[error("Migration {from}->{to} failed: {message}")]
    Transform {
        from: ApiVersion,
        to: ApiVersion,
        message: String,
    },

    /// A second transform was registered for an ordered pair
    #[error("Duplicate migration registered for {from}->{to}")]
    DuplicateMigration { from: ApiVersion, to: ApiVersion },

    /// The version is served but no handler exists for it
    #[error("Version {version} is not implemented for this endpoint")]
    HandlerNotImplemented { version: ApiVersion },

    /// The registry builder was given inconsistent data
    #[error("Invalid registry: {message}")]
    InvalidRegistry { message: String },

    /// Text that is not a version identifier at all
    #[error("Unknown version identifier: '{input}'")]
    UnknownVersion { input: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing and serialization errors
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid registry error
    pub fn invalid_registry(message: impl Into<String>) -> Self {
        Self::InvalidRegistry {
            message: message.into(),
        }
    }

    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status this error maps to when it crosses the router boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedVersion { .. } | Self::UnknownVersion { .. } => StatusCode::BAD_REQUEST,
            Self::HandlerNotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body describing the error to a client
    pub fn to_response_body(&self) -> Value {
        match self {
            Self::UnsupportedVersion {
                supported,
                deprecated,
                ..
            } => json!({
                "error": self.to_string(),
                "supported": supported.iter().map(ApiVersion::as_str).collect::<Vec<_>>(),
                "deprecated": deprecated.iter().map(ApiVersion::as_str).collect::<Vec<_>>(),
            }),
            Self::HandlerNotImplemented { version } => json!({
                "error": self.to_string(),
                "version": version.as_str(),
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            message: source.to_string(),
            source,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            message: source.to_string(),
            source,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: source.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_version_body() {
        let err = Error::UnsupportedVersion {
            requested: "v3".to_string(),
            supported: vec![ApiVersion::V1, ApiVersion::V2],
            deprecated: vec![ApiVersion::V1],
        };

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = err.to_response_body();
        assert_eq!(body["supported"], json!(["v1", "v2"]));
        assert_eq!(body["deprecated"], json!(["v1"]));
        assert!(body["error"].as_str().unwrap().contains("v3"));
    }

    #[test]
    fn test_status_codes_are_distinct() {
        let not_implemented = Error::HandlerNotImplemented {
            version: ApiVersion::V2,
        };
        let missing = Error::MigrationNotFound {
            from: ApiVersion::V2,
            to: ApiVersion::V1,
        };

        assert_eq!(not_implemented.status_code(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(not_implemented.to_response_body()["version"], "v2");
    }
}
