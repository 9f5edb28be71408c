//! Version-aware request dispatch
//!
//! A [`VersionRouter`] negotiates the version of each request, hands it to the
//! handler registered for that version and optionally stamps version headers
//! on the way out. Negotiation failures become `400` responses and versions
//! without a handler become `501` responses; errors raised by a handler are
//! returned to the caller untouched.
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::negotiation::{NegotiationResult, VersionNegotiator, API_VERSION_HEADER, DEFAULT_PRODUCT};
use crate::registry::Registry;
use crate::versioning::{ApiVersion, DeprecationInfo};
use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Request, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wall-clock time spent in the handler
pub const RESPONSE_TIME_HEADER: &str = "x-response-time";
/// RFC 9745 deprecation notice
pub const DEPRECATION_HEADER: &str = "deprecation";
/// RFC 8594 sunset notice
pub const SUNSET_HEADER: &str = "sunset";

/// What a handler hands back; its errors propagate out of [`VersionRouter::dispatch`]
pub type HandlerResult = anyhow::Result<Response<Value>>;

/// Handlers keyed by the version they implement
pub type HandlersByVersion = HashMap<ApiVersion, Arc<dyn VersionHandler>>;

/// Everything a handler gets for one request
#[derive(Debug)]
pub struct HandlerContext {
    pub negotiation: NegotiationResult,
    pub request: Request<Value>,
}

impl HandlerContext {
    pub fn version(&self) -> ApiVersion {
        self.negotiation.version
    }

    pub fn body(&self) -> &Value {
        self.request.body()
    }
}

/// Business logic for one API version
#[async_trait]
pub trait VersionHandler: Send + Sync {
    async fn handle(&self, context: HandlerContext) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> VersionHandler for F
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, context: HandlerContext) -> HandlerResult {
        (self)(context).await
    }
}

/// Router behaviour switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOptions {
    /// Stamp `X-API-Version` and `X-Response-Time` on handler responses
    pub include_version_headers: bool,
    /// Vendor segment of `application/vnd.<product>.v{N}+json`
    pub product: String,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            include_version_headers: false,
            product: DEFAULT_PRODUCT.to_string(),
        }
    }
}

/// Build a router from a handler map
pub fn create_version_router(
    registry: Arc<Registry>,
    handlers_by_version: HandlersByVersion,
    options: RouterOptions,
) -> Result<VersionRouter> {
    let mut builder = VersionRouter::builder(registry)
        .include_version_headers(options.include_version_headers)
        .product(options.product);
    builder.handlers = handlers_by_version;
    builder.build()
}

/// Builder for [`VersionRouter`]
pub struct VersionRouterBuilder {
    registry: Arc<Registry>,
    handlers: HandlersByVersion,
    options: RouterOptions,
}

impl VersionRouterBuilder {
    /// Register the handler for a version, replacing any earlier one
    pub fn handler<H>(mut self, version: ApiVersion, handler: H) -> Self
    where
        H: VersionHandler + 'static,
    {
        self.handlers.insert(version, Arc::new(handler));
        self
    }

    pub fn include_version_headers(mut self, enabled: bool) -> Self {
        self.options.include_version_headers = enabled;
        self
    }

    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.options.product = product.into();
        self
    }

    pub fn build(self) -> Result<VersionRouter> {
        let versions = self.registry.versions();

        let mut orphaned: Vec<ApiVersion> = self
            .handlers
            .keys()
            .copied()
            .filter(|version| !versions.is_registered(*version))
            .collect();
        orphaned.sort();
        if let Some(version) = orphaned.first() {
            return Err(Error::invalid_registry(format!(
                "handler registered for unregistered version {}",
                version
            )));
        }

        for version in versions.supported_versions() {
            if !self.handlers.contains_key(&version) {
                tracing::warn!(version = %version, "Supported version has no handler; requests will get 501");
            }
        }

        let negotiator = VersionNegotiator::new(Arc::clone(&self.registry), &self.options.product)?;

        Ok(VersionRouter {
            negotiator,
            handlers: self.handlers,
            options: self.options,
        })
    }
}

/// Dispatches requests to the handler of their negotiated version
#[derive(Clone)]
pub struct VersionRouter {
    negotiator: VersionNegotiator,
    handlers: HandlersByVersion,
    options: RouterOptions,
}

impl VersionRouter {
    pub fn builder(registry: Arc<Registry>) -> VersionRouterBuilder {
        VersionRouterBuilder {
            registry,
            handlers: HashMap::new(),
            options: RouterOptions::default(),
        }
    }

    pub fn negotiator(&self) -> &VersionNegotiator {
        &self.negotiator
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.negotiator.registry()
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Versions that have a handler, ascending
    pub fn implemented_versions(&self) -> Vec<ApiVersion> {
        let mut versions: Vec<_> = self.handlers.keys().copied().collect();
        versions.sort();
        versions
    }

    /// Negotiate, dispatch and decorate one request
    #[tracing::instrument(skip(self, request), fields(path = %request.uri().path()))]
    pub async fn dispatch(&self, request: Request<Value>) -> HandlerResult {
        let negotiation = match self.negotiator.negotiate(&request) {
            Ok(negotiation) => negotiation,
            Err(e @ Error::UnsupportedVersion { .. }) => {
                tracing::debug!(error = %e, "Rejecting request for unsupported version");
                return Ok(error_response(&e));
            }
            Err(e) => return Err(e.into()),
        };

        let version = negotiation.version;
        let Some(handler) = self.handlers.get(&version) else {
            let e = Error::HandlerNotImplemented { version };
            tracing::debug!(error = %e, "No handler for negotiated version");
            return Ok(error_response(&e));
        };

        let deprecation = negotiation.deprecation_info.clone();
        let started = Instant::now();
        let mut response = handler
            .handle(HandlerContext {
                negotiation,
                request,
            })
            .await?;
        let elapsed = started.elapsed();

        tracing::debug!(version = %version, elapsed_ms = elapsed.as_millis() as u64, "Handler completed");

        if self.options.include_version_headers {
            decorate(response.headers_mut(), version, elapsed, deprecation.as_ref());
        }

        Ok(response)
    }
}

impl std::fmt::Debug for VersionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionRouter")
            .field("implemented_versions", &self.implemented_versions())
            .field("options", &self.options)
            .finish()
    }
}

/// JSON response for an error that stops a request before its handler
pub fn error_response(error: &Error) -> Response<Value> {
    let mut response = Response::new(error.to_response_body());
    *response.status_mut() = error.status_code();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn decorate(
    headers: &mut HeaderMap,
    version: ApiVersion,
    elapsed: Duration,
    deprecation: Option<&DeprecationInfo>,
) {
    headers.insert(API_VERSION_HEADER, HeaderValue::from_static(version.as_str()));

    let millis = elapsed.as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("{:.3}ms", millis)) {
        headers.insert(RESPONSE_TIME_HEADER, value);
    }

    let Some(info) = deprecation else {
        return;
    };
    if let Some(at) = info.deprecated_at {
        if let Ok(value) = HeaderValue::from_str(&format!("@{}", at.timestamp())) {
            headers.insert(DEPRECATION_HEADER, value);
        }
    }
    if let Some(at) = info.sunset_at {
        let http_date = at.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        if let Ok(value) = HeaderValue::from_str(&http_date) {
            headers.insert(SUNSET_HEADER, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::VersionMetadata;
    use chrono::{TimeZone, Utc};
    use http::StatusCode;

    #[test]
    fn test_decorate_deprecated_version() {
        let info = DeprecationInfo {
            version: ApiVersion::V1,
            deprecated_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            sunset_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
        };
        let mut headers = HeaderMap::new();
        decorate(&mut headers, ApiVersion::V1, Duration::from_millis(12), Some(&info));

        assert_eq!(headers[API_VERSION_HEADER], "v1");
        assert_eq!(headers[RESPONSE_TIME_HEADER], "12.000ms");
        assert_eq!(headers[DEPRECATION_HEADER], "@1717200000");
        assert_eq!(headers[SUNSET_HEADER], "Sun, 01 Jun 2025 00:00:00 GMT");
    }

    #[test]
    fn test_decorate_current_version() {
        let mut headers = HeaderMap::new();
        decorate(&mut headers, ApiVersion::V2, Duration::ZERO, None);

        assert_eq!(headers[API_VERSION_HEADER], "v2");
        assert!(headers.contains_key(RESPONSE_TIME_HEADER));
        assert!(!headers.contains_key(DEPRECATION_HEADER));
        assert!(!headers.contains_key(SUNSET_HEADER));
    }

    #[test]
    fn test_error_response_shape() {
        let response = error_response(&Error::HandlerNotImplemented {
            version: ApiVersion::V2,
        });
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body()["version"], "v2");
    }

    #[test]
    fn test_rejects_handler_for_unregistered_version() {
        let registry = Arc::new(
            Registry::builder()
                .version(VersionMetadata::new(ApiVersion::V1))
                .build()
                .unwrap(),
        );

        let result = VersionRouter::builder(registry)
            .handler(ApiVersion::V2, |_ctx: HandlerContext| async {
                Ok::<_, anyhow::Error>(Response::new(Value::Null))
            })
            .build();
        assert!(matches!(result, Err(Error::InvalidRegistry { .. })));
    }
}
