//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy, health and fallback handlers
//! - Reject unsupported verbs (405), oversized bodies (413) and dot segments (400)
//! - Wire up middleware (request ID, tracing)
//! - Build the upstream client, origin and retry policy from config
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response::error_response;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::proxy::{ForwardRequest, Orchestrator, RequestError};
use crate::resilience::RetryPolicy;
use crate::upstream::{HttpUpstream, OriginResolver, UpstreamClient};

/// Path under which inbound requests are forwarded upstream.
pub const PROXY_MOUNT: &str = "/api/proxy/";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub max_body_size: usize,
}

/// HTTP server for the finance proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    orchestrator: Arc<Orchestrator>,
}

impl HttpServer {
    /// Create a server that talks to the upstream over HTTP.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = HttpUpstream::new(&config.timeouts)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create a server around an arbitrary upstream client.
    pub fn with_client(config: ProxyConfig, client: Arc<dyn UpstreamClient>) -> Self {
        let origin = OriginResolver::new()
            .allow_loopback(config.upstream.allow_loopback)
            .resolve(&config.upstream.candidates());
        let policy = RetryPolicy::from_config(&config.retries);
        let orchestrator = Arc::new(Orchestrator::new(
            client,
            origin,
            config.upstream.path_prefix.clone(),
            policy,
        ));

        let state = AppState {
            orchestrator: orchestrator.clone(),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            orchestrator,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/api/proxy/{*path}", any(proxy_handler))
            .route("/health", get(health_handler))
            .fallback(not_found_handler)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for serving on a custom transport.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown_rx` fires.
    pub async fn run(self, listener: TcpListener, shutdown_rx: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.orchestrator.origin(),
            max_attempts = self.orchestrator.policy().max_attempts(),
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Buffers the inbound body, shapes the upstream request, and hands it to the orchestrator.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let (parts, body) = request.into_parts();
    let method_str = parts.method.to_string();
    let raw_path = parts.uri.path().strip_prefix(PROXY_MOUNT).unwrap_or_default();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected inbound body");
            metrics::record_request(&method_str, 413, "rejected", start_time);
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
    };

    let forward = match ForwardRequest::build(parts.method, raw_path, &parts.headers, body) {
        Ok(forward) => forward,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected inbound request");
            let (status, message) = match e {
                RequestError::UnsupportedMethod(_) => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
                RequestError::DotSegment(_) => (StatusCode::BAD_REQUEST, "Invalid path"),
            };
            metrics::record_request(&method_str, status.as_u16(), "rejected", start_time);
            return error_response(status, message);
        }
    };

    let span = tracing::info_span!(
        "proxy",
        request_id = %request_id,
        method = %forward.method(),
        path = %forward.path(),
    );
    let reply = state.orchestrator.forward(&forward).instrument(span).await;

    tracing::debug!(
        request_id = %request_id,
        status = reply.status.as_u16(),
        attempts = reply.attempts,
        terminal = reply.terminal.as_str(),
        "Proxy request finished"
    );
    metrics::record_request(&method_str, reply.status.as_u16(), reply.terminal.as_str(), start_time);

    reply.into_response()
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "upstream": state.orchestrator.origin().as_str(),
    }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::{header, HeaderValue, Method};
    use bytes::Bytes;
    use std::sync::Mutex;
    use tower::ServiceExt;

    use crate::upstream::{TransportError, UpstreamResponse, DEFAULT_ORIGIN};

    /// Echoes a fixed 200 and records the URL and request it saw.
    #[derive(Default)]
    struct RecordingUpstream {
        seen: Mutex<Vec<(String, ForwardRequest)>>,
    }

    #[async_trait]
    impl UpstreamClient for RecordingUpstream {
        async fn send(&self, request: &ForwardRequest, url: &str) -> Result<UpstreamResponse, TransportError> {
            self.seen.lock().unwrap().push((url.to_string(), request.clone()));
            let mut headers = axum::http::HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Ok(UpstreamResponse {
                status: StatusCode::OK,
                headers,
                body: Bytes::from_static(br#"{"ok":true}"#),
            })
        }
    }

    fn server(upstream: Arc<RecordingUpstream>) -> HttpServer {
        let mut config = ProxyConfig::default();
        config.upstream.backend_url = Some("https://finance.example.com/".into());
        config.security.max_body_size = 64;
        HttpServer::with_client(config, upstream)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_forwards_path_below_mount() {
        let upstream = Arc::new(RecordingUpstream::default());
        let app = server(upstream.clone()).router();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/proxy/expenses/42")
                    .header(header::AUTHORIZATION, "Bearer abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await, json!({"ok": true}));

        let seen = upstream.seen.lock().unwrap();
        assert_eq!(seen[0].0, "https://finance.example.com/api/expenses/42");
        assert_eq!(*seen[0].1.method(), Method::DELETE);
        assert_eq!(seen[0].1.headers()[header::AUTHORIZATION], "Bearer abc");
    }

    #[tokio::test]
    async fn test_rejects_unsupported_method() {
        let upstream = Arc::new(RecordingUpstream::default());
        let app = server(upstream.clone()).router();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::TRACE)
                    .uri("/api/proxy/expenses")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await, json!({"error": "Method not allowed"}));
        assert!(upstream.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_oversized_body() {
        let upstream = Arc::new(RecordingUpstream::default());
        let app = server(upstream.clone()).router();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/proxy/expenses")
                    .body(Body::from(vec![b'a'; 1024]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(upstream.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_dot_segments() {
        for uri in ["/api/proxy/../admin", "/api/proxy/%2e%2e/admin", "/api/proxy/expenses/%2E/1"] {
            let upstream = Arc::new(RecordingUpstream::default());
            let app = server(upstream.clone()).router();

            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body_json(response).await, json!({"error": "Invalid path"}));
            assert!(upstream.seen.lock().unwrap().is_empty(), "{uri} reached upstream");
        }
    }

    #[tokio::test]
    async fn test_health_reports_resolved_origin() {
        let mut config = ProxyConfig::default();
        config.upstream.backend_url = Some("http://localhost:4000".into());
        let app = HttpServer::with_client(config, Arc::new(RecordingUpstream::default())).router();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok", "upstream": DEFAULT_ORIGIN}));
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = server(Arc::new(RecordingUpstream::default())).router();

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "Not found"}));
    }
}
