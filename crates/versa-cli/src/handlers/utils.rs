//! Shared utilities for command handlers

use crate::cli::RequestArgs;
use crate::error::{Error, Result};
use crate::logging::redaction;
use http::header::ACCEPT;
use http::{HeaderName, HeaderValue, Request, Uri};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Split a `Name: value` header argument
pub fn parse_header(line: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| Error::invalid_args(format!("header '{}' must look like 'Name: value'", line)))?;

    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| Error::invalid_args(format!("invalid header name '{}': {}", name.trim(), e)))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| Error::invalid_args(format!("invalid value for header '{}': {}", name, e)))?;

    Ok((name, value))
}

/// Build the request described on the command line
pub fn build_request(args: &RequestArgs, body: Value) -> Result<Request<Value>> {
    let mut request = Request::new(body);
    *request.uri_mut() = args
        .path
        .parse::<Uri>()
        .map_err(|e| Error::invalid_args(format!("invalid path '{}': {}", args.path, e)))?;

    for line in &args.headers {
        let (name, value) = parse_header(line)?;
        tracing::debug!(
            header = %name,
            value = %redaction::redact_header(name.as_str(), value.to_str().unwrap_or("<binary>")),
            "Request header"
        );
        request.headers_mut().append(name, value);
    }

    if let Some(accept) = &args.accept {
        let value = HeaderValue::from_str(accept)
            .map_err(|e| Error::invalid_args(format!("invalid Accept value '{}': {}", accept, e)))?;
        request.headers_mut().insert(ACCEPT, value);
    }

    Ok(request)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false)
}

/// Read a JSON or YAML records file
pub fn load_records(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        })
    } else {
        serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        })
    }
}

/// Write records as YAML or pretty JSON, by extension
pub fn write_records(path: &Path, records: &Value) -> Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(records)?
    } else {
        serde_json::to_string_pretty(records)?
    };
    fs::write(path, content)?;
    Ok(())
}
