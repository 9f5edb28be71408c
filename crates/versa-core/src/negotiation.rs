//! Per-request version negotiation
//!
//! Signals are consulted in a fixed order and the first one present decides:
//!
//! 1. `X-API-Version` header, then `Api-Version`
//! 2. a `/api/v{N}/...` path prefix
//! 3. an `Accept: application/vnd.<product>.v{N}+json` media type
//! 4. the registry's default version
//!
//! A present signal naming a version that is not served is reported as
//! unsupported rather than skipped, so a request never silently lands on a
//! different version's logic.
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::versioning::{ApiVersion, DeprecationInfo};
use chrono::Utc;
use http::header::ACCEPT;
use http::{HeaderMap, Request};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Primary custom version header
pub const API_VERSION_HEADER: &str = "x-api-version";
/// Fallback custom version header
pub const API_VERSION_FALLBACK_HEADER: &str = "api-version";
/// Vendor segment used in `Accept` media types unless configured otherwise
pub const DEFAULT_PRODUCT: &str = "versa";

static URL_VERSION: OnceLock<Regex> = OnceLock::new();

fn url_version_pattern() -> &'static Regex {
    URL_VERSION.get_or_init(|| Regex::new(r"^/api/v(\d+)(?:/|$)").expect("valid URL version pattern"))
}

/// Which signal decided the version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    Header,
    Url,
    Accept,
    Default,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSource::Header => write!(f, "header"),
            VersionSource::Url => write!(f, "url"),
            VersionSource::Accept => write!(f, "accept"),
            VersionSource::Default => write!(f, "default"),
        }
    }
}

/// Outcome of negotiating one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationResult {
    pub version: ApiVersion,
    pub source: VersionSource,
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_info: Option<DeprecationInfo>,
}

/// Resolves the effective version of incoming requests
#[derive(Debug, Clone)]
pub struct VersionNegotiator {
    registry: Arc<Registry>,
    accept_pattern: Regex,
}

impl VersionNegotiator {
    /// Negotiator recognising `application/vnd.<product>.v{N}+json`
    pub fn new(registry: Arc<Registry>, product: &str) -> Result<Self> {
        let pattern = format!(
            r"(?i)^application/vnd\.{}\.v(\d+)\+json$",
            regex::escape(product)
        );
        let accept_pattern = Regex::new(&pattern).map_err(|e| Error::Configuration {
            message: format!("invalid product name '{}' for Accept matching", product),
            source: Some(e.into()),
        })?;

        Ok(Self {
            registry,
            accept_pattern,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Resolve the version for a request
    pub fn negotiate<B>(&self, request: &Request<B>) -> Result<NegotiationResult> {
        self.negotiate_parts(request.uri().path(), request.headers())
    }

    /// Resolve the version from a path and header map
    pub fn negotiate_parts(&self, path: &str, headers: &HeaderMap) -> Result<NegotiationResult> {
        let claim = header_claim(headers)
            .map(|claim| (claim, VersionSource::Header))
            .or_else(|| url_claim(path).map(|claim| (claim, VersionSource::Url)))
            .or_else(|| {
                self.accept_claim(headers)
                    .map(|claim| (claim, VersionSource::Accept))
            });

        let (version, source) = match claim {
            Some((claim, source)) => (self.resolve_claim(&claim, source)?, source),
            None => (self.registry.default_version(), VersionSource::Default),
        };

        if !self.registry.versions().is_supported(version) {
            return Err(self.registry.unsupported(version.as_str()));
        }

        let deprecation_info = self.registry.versions().get_deprecation_info(version);
        if let Some(info) = &deprecation_info {
            let sunset = info.sunset_at.map(|at| at.to_rfc3339());
            if info.sunset_at.is_some_and(|at| Utc::now() >= at) {
                tracing::warn!(version = %version, sunset_at = ?sunset, "Serving version past its sunset date");
            } else {
                tracing::info!(version = %version, sunset_at = ?sunset, "Deprecated version requested");
            }
        }

        tracing::debug!(version = %version, source = %source, "Negotiated API version");

        Ok(NegotiationResult {
            version,
            source,
            is_deprecated: deprecation_info.is_some(),
            deprecation_info,
        })
    }

    /// Version named by `X-API-Version`/`Api-Version`, if served
    pub fn extract_version_from_custom_header(&self, headers: &HeaderMap) -> Option<ApiVersion> {
        header_claim(headers).and_then(|claim| self.served(&claim))
    }

    /// Version named by an `/api/v{N}/` path prefix, if served
    pub fn extract_version_from_url(&self, path: &str) -> Option<ApiVersion> {
        url_claim(path).and_then(|claim| self.served(&claim))
    }

    /// Version named by a vendor `Accept` media type, if served
    pub fn extract_version_from_accept_header(&self, headers: &HeaderMap) -> Option<ApiVersion> {
        self.accept_claim(headers)
            .and_then(|claim| self.served(&claim))
    }

    fn served(&self, claim: &str) -> Option<ApiVersion> {
        ApiVersion::parse(claim)
            .ok()
            .filter(|version| self.registry.versions().is_supported(*version))
    }

    fn resolve_claim(&self, claim: &str, source: VersionSource) -> Result<ApiVersion> {
        self.served(claim).ok_or_else(|| {
            tracing::debug!(claim = %claim, source = %source, "Requested version is not served");
            self.registry.unsupported(claim)
        })
    }

    fn accept_claim(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .filter_map(|media_range| media_range.split(';').next())
            .find_map(|media_type| {
                self.accept_pattern
                    .captures(media_type.trim())
                    .map(|caps| format!("v{}", &caps[1]))
            })
    }
}

fn header_claim(headers: &HeaderMap) -> Option<String> {
    [API_VERSION_HEADER, API_VERSION_FALLBACK_HEADER]
        .into_iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn url_claim(path: &str) -> Option<String> {
    url_version_pattern()
        .captures(path)
        .map(|caps| format!("v{}", &caps[1]))
}
