//! HTTP middleware

pub mod rate_limit;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use hydradoc_common::metrics::RequestMetrics;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tracing::Span;

/// Request count and latency per route template
pub async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let tracker = RequestMetrics::start(request.method().as_str(), &endpoint);

    let response = next.run(request).await;
    tracker.finish(response.status().as_u16());
    response
}

/// Requests still running after `timeout` are answered with 408
pub fn request_timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::new(timeout)
}

/// Root span of one HTTP request
pub fn request_span(service: &str, request: &Request) -> Span {
    tracing::info_span!(
        "http_request",
        service = %service,
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_gets_408() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(120)).await;
                    "done"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(request_timeout_layer(Duration::from_secs(1)));

        let response = app.clone().oneshot(get_request("/slow")).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let response = app.oneshot(get_request("/fast")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_request_span_carries_service_name() {
        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = request_span("hydradoc-test", &get_request("/v1/query"));
            assert!(span.field("service").is_some());
            assert!(span.field("method").is_some());
            assert_eq!(span.metadata().map(|m| m.name()), Some("http_request"));
        });
    }
}
