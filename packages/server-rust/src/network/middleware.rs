//! HTTP middleware stack applied to every route.
//!
//! Layers are listed outermost first: the first layer sees the request first
//! on the way in and the response last on the way out.

use std::iter;

use axum::http::header::{HeaderName, AUTHORIZATION};
use axum::http::{Method, StatusCode};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;

/// Wraps `router` in the transport-level middleware.
///
/// **Ordering (outermost to innermost):**
/// 1. `SetRequestId`: assigns a UUID v4 `X-Request-Id`
/// 2. `SetSensitiveRequestHeaders`: hides `Authorization` from trace output
/// 3. `Tracing`: one span per HTTP request
/// 4. `RequestBodyLimit`: 413 above `max_body_bytes`
/// 5. `CORS`: configured origins, GET and POST only
/// 6. `Timeout`: 408 once `request_timeout` elapses
/// 7. `PropagateRequestId`: copies `X-Request-Id` onto the response
///
/// `Cors` and `Timeout` need a `Default` response body, which the limit's
/// body wrapper is not, so the body limit stays outside both.
pub fn apply_http_layers<S>(router: Router<S>, config: &NetworkConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let x_request_id = HeaderName::from_static("x-request-id");

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(SetSensitiveRequestHeadersLayer::new(iter::once(AUTHORIZATION)))
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(build_cors_layer(&config.cors_origins))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.request_timeout,
            ))
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// A wildcard `"*"` allows any origin; otherwise unparseable origins are
/// skipped.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn build_cors_layer_wildcard() {
        let origins = vec!["*".to_string()];
        let _cors = build_cors_layer(&origins);
    }

    #[test]
    fn build_cors_layer_specific_origins() {
        let origins = vec![
            "http://localhost:3000".to_string(),
            "https://example.com".to_string(),
        ];
        let _cors = build_cors_layer(&origins);
    }

    #[tokio::test]
    async fn response_carries_request_id() {
        let router: Router = apply_http_layers(
            Router::new().route("/ping", get(|| async { "pong" })),
            &NetworkConfig::default(),
        );

        let response = router
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let config = NetworkConfig {
            max_body_bytes: 8,
            request_timeout: Duration::from_secs(5),
            ..NetworkConfig::default()
        };
        let router: Router = apply_http_layers(
            Router::new().route("/echo", post(|body: String| async move { body })),
            &config,
        );

        let response = router
            .oneshot(
                Request::post("/echo")
                    .header("content-length", "32")
                    .body(Body::from("x".repeat(32)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
