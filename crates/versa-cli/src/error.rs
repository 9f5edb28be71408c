//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from versa-core library
    #[error("{0}")]
    Core(#[from] versa_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// The router answered with a non-success status
    #[error("Request rejected with status {status}")]
    Rejected { status: http::StatusCode },

    /// A route handler failed
    #[error("Handler failed: {0}")]
    Handler(#[source] anyhow::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(versa_core::Error::UnsupportedVersion { .. }) => 20,
            Self::Core(versa_core::Error::MigrationNotFound { .. }) => 21,
            Self::Core(versa_core::Error::Transform { .. }) => 22,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::Rejected { status } => match status.as_u16() {
                400 => 20,
                501 => 23,
                _ => 8,
            },
            Self::Handler(_) => 7,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut message = error.to_string();

    if let Error::Core(versa_core::Error::UnsupportedVersion {
        supported,
        deprecated,
        ..
    }) = error
    {
        let join = |versions: &[versa_core::ApiVersion]| {
            versions
                .iter()
                .map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        message.push_str(&format!("\n  supported: {}", join(supported)));
        if !deprecated.is_empty() {
            message.push_str(&format!("\n  deprecated: {}", join(deprecated)));
        }
    }

    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), message)
    } else {
        format!("Error: {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versa_core::ApiVersion;

    #[test]
    fn test_exit_codes_distinguish_core_failures() {
        let unsupported = Error::from(versa_core::Error::UnsupportedVersion {
            requested: "v9".to_string(),
            supported: vec![ApiVersion::V1, ApiVersion::V2],
            deprecated: vec![],
        });
        let missing = Error::from(versa_core::Error::MigrationNotFound {
            from: ApiVersion::V2,
            to: ApiVersion::V1,
        });

        assert_eq!(unsupported.exit_code(), 20);
        assert_eq!(missing.exit_code(), 21);
        assert_eq!(Error::invalid_args("x").exit_code(), 6);
        assert!(Error::invalid_args("x").should_show_help());
    }

    #[test]
    fn test_rejected_routes_map_to_distinct_codes() {
        let unsupported = Error::Rejected {
            status: http::StatusCode::BAD_REQUEST,
        };
        let not_implemented = Error::Rejected {
            status: http::StatusCode::NOT_IMPLEMENTED,
        };

        assert_eq!(unsupported.exit_code(), 20);
        assert_eq!(not_implemented.exit_code(), 23);
        assert_ne!(unsupported.exit_code(), not_implemented.exit_code());
        assert_eq!(
            Error::Rejected {
                status: http::StatusCode::INTERNAL_SERVER_ERROR
            }
            .exit_code(),
            8
        );
        assert_eq!(
            unsupported.to_string(),
            "Request rejected with status 400 Bad Request"
        );
    }

    #[test]
    fn test_format_unsupported_lists_versions() {
        let error = Error::from(versa_core::Error::UnsupportedVersion {
            requested: "v9".to_string(),
            supported: vec![ApiVersion::V1, ApiVersion::V2],
            deprecated: vec![ApiVersion::V1],
        });

        let formatted = format_error(&error, false);
        assert!(formatted.starts_with("Error: Unsupported API version: v9"));
        assert!(formatted.contains("supported: v1, v2"));
        assert!(formatted.contains("deprecated: v1"));
    }
}
