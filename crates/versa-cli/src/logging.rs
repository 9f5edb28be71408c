//! Logging utilities for the Versa CLI
//!
//! This module provides:
//! - Structured logging setup in compact, full or JSON form
//! - Session request IDs
//! - Redaction of sensitive request headers
//! - Performance timing spans

use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Global request ID for the current session
static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Colored console output
    pub console: bool,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
    /// Per-module level overrides, e.g. `versa_core: debug`
    pub module_filter: BTreeMap<String, String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact format for production
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            thread_ids: false,
            source_location: false,
            module_filter: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {}
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply RUST_LOG, VERSA_LOG_FORMAT and VERSA_LOG_CONSOLE
    pub fn merge_with_env(&mut self) {
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            self.level = rust_log;
        }

        if let Ok(format) = std::env::var("VERSA_LOG_FORMAT") {
            match parse_log_format(&format) {
                Some(format) => self.format = format,
                None => eprintln!("Ignoring invalid VERSA_LOG_FORMAT '{}'", format),
            }
        }

        if let Ok(console) = std::env::var("VERSA_LOG_CONSOLE") {
            self.console = console.eq_ignore_ascii_case("true") || console == "1";
        }
    }
}

fn parse_log_format(value: &str) -> Option<LogFormat> {
    match value.to_lowercase().as_str() {
        "compact" => Some(LogFormat::Compact),
        "full" => Some(LogFormat::Full),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

/// Initialize the global logging system
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = create_env_filter(&config)?;
    let ansi = config.console && std::io::stderr().is_terminal();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    // Each format yields a different subscriber type
    let installed = match config.format {
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish())
        }
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
        }
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let request_id = generate_request_id();
    REQUEST_ID.set(request_id.clone()).map_err(|_| {
        Error::other("Failed to set request ID - request tracking may not work correctly")
    })?;

    tracing::debug!(
        request_id = %request_id,
        config = ?config,
        "Logging system initialized"
    );

    Ok(())
}

/// Create environment filter based on configuration
fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.level, e)))?;

    for (module, level) in &config.module_filter {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| Error::config(format!("Invalid filter directive: {}", e)))?,
        );
    }

    Ok(filter)
}

/// Generate a unique request ID for this session
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Get the current request ID
pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(|s| s.as_str())
}

/// Create a span with request ID and timing
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        request_id = current_request_id().unwrap_or("unknown"),
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Sensitive data redaction utilities
pub mod redaction {
    use regex::Regex;
    use std::sync::OnceLock;

    static CREDENTIAL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

    fn credential_pattern() -> Option<&'static Regex> {
        CREDENTIAL_REGEX
            .get_or_init(|| {
                Regex::new(r#"(?i)\b(api[_-]?key|token|secret|password)([=:]\s*)['"]?[^\s'",;&]+['"]?"#)
                    .ok()
            })
            .as_ref()
    }

    /// Whether a header carries credentials and must never be logged as is
    pub fn is_sensitive_header(name: &str) -> bool {
        let name = name.to_lowercase();
        name == "authorization"
            || name == "proxy-authorization"
            || name == "cookie"
            || name == "set-cookie"
            || name.contains("token")
            || name.contains("secret")
            || name.contains("api-key")
            || name.contains("apikey")
    }

    /// Value safe to log for a header
    pub fn redact_header(name: &str, value: &str) -> String {
        if is_sensitive_header(name) {
            "***".to_string()
        } else {
            redact_sensitive(value)
        }
    }

    /// Redact `key=value` style credentials embedded in free text
    pub fn redact_sensitive(input: &str) -> String {
        match credential_pattern() {
            Some(regex) => regex.replace_all(input, "$1$2***").to_string(),
            None => input.to_string(),
        }
    }

    /// Redact sensitive fields from JSON values
    pub fn redact_json_value(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_header(key) || key.to_lowercase().contains("password") {
                        *val = serde_json::Value::String("***".to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    redact_json_value(item);
                }
            }
            serde_json::Value::String(s) => {
                *s = redact_sensitive(s);
            }
            _ => {}
        }
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// A timer that logs its duration when dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, None),
                operation: operation.to_string(),
            }
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, Some(details)),
                operation: operation.to_string(),
            }
        }

        /// Get elapsed time without finishing the timer
        pub fn elapsed(&self) -> std::time::Duration {
            self.start.elapsed()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);

            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_redaction() {
        assert_eq!(redaction::redact_header("Authorization", "Bearer abc123"), "***");
        assert_eq!(redaction::redact_header("Cookie", "session=1"), "***");
        assert_eq!(redaction::redact_header("X-Auth-Token", "abc"), "***");
        assert_eq!(redaction::redact_header("X-API-Version", "v2"), "v2");
        assert_eq!(
            redaction::redact_header("Accept", "application/vnd.versa.v1+json"),
            "application/vnd.versa.v1+json"
        );
    }

    #[test]
    fn test_free_text_redaction() {
        let redacted = redaction::redact_sensitive("api_key=sk-1234567890 token: abc.def password=hunter2");
        assert!(redacted.contains("api_key=***"));
        assert!(redacted.contains("token: ***"));
        assert!(redacted.contains("password=***"));
        assert!(!redacted.contains("sk-1234567890"));
        assert!(!redacted.contains("hunter2"));
    }

    #[test]
    fn test_json_redaction() {
        let mut value = serde_json::json!({
            "headers": { "authorization": "Bearer token123", "x-api-version": "v1" },
            "password": "secret",
            "path": "/api/v1/words"
        });

        redaction::redact_json_value(&mut value);

        assert_eq!(value["headers"]["authorization"], "***");
        assert_eq!(value["headers"]["x-api-version"], "v1");
        assert_eq!(value["password"], "***");
        assert_eq!(value["path"], "/api/v1/words");
    }

    #[test]
    fn test_logging_config_from_verbosity() {
        let config = LoggingConfig::from_verbosity(0);
        assert_eq!(config.level, "warn");
        assert!(!config.source_location);

        let config = LoggingConfig::from_verbosity(2);
        assert_eq!(config.level, "debug");
        assert!(config.source_location);

        let config = LoggingConfig::from_verbosity(3);
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.thread_ids);
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format("JSON"), Some(LogFormat::Json));
        assert_eq!(parse_log_format("full"), Some(LogFormat::Full));
        assert_eq!(parse_log_format("pretty"), None);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert!(a.starts_with("req_"));
        assert_ne!(a, b);
    }
}
