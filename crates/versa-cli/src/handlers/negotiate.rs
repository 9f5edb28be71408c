//! Negotiate and route command handlers

use super::utils::build_request;
use crate::cli::{RequestArgs, RouteArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use http::Response;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use versa_core::{
    DeprecationInfo, HandlerContext, HandlerResult, VersionNegotiator, VersionRouter,
};

/// Handle the negotiate command
pub async fn handle_negotiate(
    args: RequestArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let registry = config.registry()?;
    let negotiator = VersionNegotiator::new(registry, &config.catalog.product)?;
    let request = build_request(&args, Value::Null)?;

    match negotiator.negotiate(&request) {
        Ok(result) => {
            output.negotiation(&result)?;
            if let Some(info) = &result.deprecation_info {
                output.warning(&deprecation_notice(info))?;
            }
            Ok(())
        }
        Err(e @ versa_core::Error::UnsupportedVersion { .. }) => {
            if !output.is_human() {
                output.data(&e.to_response_body())?;
            }
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle the route command
pub async fn handle_route(
    args: RouteArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let registry = config.registry()?;
    let implemented = if args.implemented.is_empty() {
        registry.versions().supported_versions()
    } else {
        args.implemented.clone()
    };

    let body = match &args.body {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| Error::invalid_args(format!("--body is not valid JSON: {}", e)))?,
        None => Value::Null,
    };

    let mut builder = VersionRouter::builder(registry)
        .product(config.catalog.product.clone())
        .include_version_headers(config.catalog.include_version_headers && !args.no_version_headers);
    for version in implemented {
        builder = builder.handler(version, echo_handler);
    }
    let router = builder.build()?;

    let request = build_request(&args.request, body)?;
    let timer = Timer::with_details("route", &args.request.path);
    let response = router.dispatch(request).await.map_err(Error::Handler)?;
    tracing::debug!(
        status = response.status().as_u16(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Request routed"
    );

    let routed = RoutedResponse::from(&response);
    if output.is_human() {
        output.section("Response")?;
        output.field("Status", &response.status().to_string())?;
        for (name, value) in &routed.headers {
            output.field(name, value)?;
        }
        output.section("Body")?;
        output.writeln(&serde_json::to_string_pretty(&routed.body)?)?;
    } else {
        output.data(&routed)?;
    }

    if response.status().is_success() {
        Ok(())
    } else {
        Err(Error::Rejected {
            status: response.status(),
        })
    }
}

/// Echoes what the router decided along with the request it was given
async fn echo_handler(context: HandlerContext) -> HandlerResult {
    let HandlerContext {
        negotiation,
        request,
    } = context;
    let (parts, body) = request.into_parts();

    Ok(Response::new(json!({
        "version": negotiation.version,
        "source": negotiation.source,
        "path": parts.uri.path(),
        "body": body,
    })))
}

fn deprecation_notice(info: &DeprecationInfo) -> String {
    match info.sunset_at {
        Some(at) => format!(
            "{} is deprecated and will be removed on {}",
            info.version,
            at.format("%Y-%m-%d")
        ),
        None => format!("{} is deprecated", info.version),
    }
}

/// Serializable view of a routed response
#[derive(Debug, Serialize)]
struct RoutedResponse {
    status: u16,
    headers: BTreeMap<String, String>,
    body: Value,
}

impl From<&Response<Value>> for RoutedResponse {
    fn from(response: &Response<Value>) -> Self {
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect();

        Self {
            status: response.status().as_u16(),
            headers,
            body: response.body().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;
    use versa_core::{catalog, ApiVersion, VersionSource};

    #[tokio::test]
    async fn test_echo_handler() {
        let negotiator = VersionNegotiator::new(
            std::sync::Arc::new(catalog::builtin_registry().unwrap()),
            "versa",
        )
        .unwrap();
        let request = Request::get("/api/v1/words")
            .body(json!({ "q": "hola" }))
            .unwrap();
        let negotiation = negotiator.negotiate(&request).unwrap();
        assert_eq!(negotiation.source, VersionSource::Url);

        let response = echo_handler(HandlerContext {
            negotiation,
            request,
        })
        .await
        .unwrap();
        assert_eq!(
            response.body(),
            &json!({ "version": "v1", "source": "url", "path": "/api/v1/words", "body": { "q": "hola" } })
        );
    }

    fn route_args(path: &str, implemented: Vec<ApiVersion>) -> RouteArgs {
        RouteArgs {
            request: RequestArgs {
                path: path.to_string(),
                headers: vec![],
                accept: None,
            },
            body: None,
            implemented,
            no_version_headers: false,
        }
    }

    #[tokio::test]
    async fn test_route_rejections_keep_their_status() {
        let config = Config::default();
        let mut output = OutputWriter::with_writer(
            crate::cli::OutputFormat::Json,
            false,
            true,
            Box::new(std::io::sink()),
        );

        let unsupported = handle_route(route_args("/api/v3/test", vec![]), &config, &mut output)
            .await
            .unwrap_err();
        assert!(matches!(unsupported, Error::Rejected { status } if status.as_u16() == 400));
        assert_eq!(unsupported.exit_code(), 20);

        let not_implemented = handle_route(
            route_args("/api/v1/test", vec![ApiVersion::V2]),
            &config,
            &mut output,
        )
        .await
        .unwrap_err();
        assert!(matches!(not_implemented, Error::Rejected { status } if status.as_u16() == 501));
        assert_eq!(not_implemented.exit_code(), 23);

        assert!(handle_route(route_args("/api/v2/test", vec![]), &config, &mut output)
            .await
            .is_ok());
    }

    #[test]
    fn test_routed_response_view() {
        let mut response = Response::new(json!({ "ok": true }));
        response
            .headers_mut()
            .insert("x-api-version", http::HeaderValue::from_static("v2"));

        let routed = RoutedResponse::from(&response);
        assert_eq!(routed.status, 200);
        assert_eq!(routed.headers["x-api-version"], "v2");
    }

    #[test]
    fn test_deprecation_notice() {
        let v1 = catalog::builtin_versions().remove(0);
        let notice = deprecation_notice(&v1.deprecation_info().unwrap());
        assert_eq!(notice, "v1 is deprecated and will be removed on 2025-06-01");

        let info = DeprecationInfo {
            version: ApiVersion::V1,
            deprecated_at: None,
            sunset_at: None,
        };
        assert_eq!(deprecation_notice(&info), "v1 is deprecated");
    }
}
