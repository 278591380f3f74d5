//! Outbound request shaping.
//!
//! # Responsibilities
//! - Restrict forwarding to a fixed set of HTTP verbs
//! - Join path segments, dropping empty ones and rejecting `.` / `..`
//! - Forward `Authorization` verbatim, and nothing else from the inbound headers
//! - Attach a body (with `Content-Type`) only when the verb carries one and the body is non-empty

use axum::http::{header, HeaderMap, HeaderValue, Method};
use bytes::Bytes;
use thiserror::Error;

/// Verbs the proxy is willing to forward.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Verbs that never carry a request body upstream.
pub const NO_BODY_METHODS: [Method; 2] = [Method::GET, Method::HEAD];

/// Reasons an inbound request is refused before any upstream attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("method {0} is not supported by the proxy")]
    UnsupportedMethod(Method),

    #[error("path segment '{0}' is not allowed")]
    DotSegment(String),
}

/// One immutable request to be sent upstream, reused verbatim for every attempt.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl ForwardRequest {
    /// Build from the inbound method, the raw path below the proxy mount,
    /// the inbound headers, and the buffered inbound body.
    pub fn build(
        method: Method,
        raw_path: &str,
        inbound: &HeaderMap,
        body: Bytes,
    ) -> Result<Self, RequestError> {
        if !SUPPORTED_METHODS.contains(&method) {
            return Err(RequestError::UnsupportedMethod(method));
        }
        let path = join_segments(raw_path)?;

        let mut headers = HeaderMap::new();
        if let Some(auth) = inbound.get(header::AUTHORIZATION) {
            headers.insert(header::AUTHORIZATION, auth.clone());
        }

        let body = if carries_body(&method, &body) {
            let content_type = inbound
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("application/json"));
            headers.insert(header::CONTENT_TYPE, content_type);
            Some(body)
        } else {
            None
        };

        Ok(Self {
            method,
            path,
            headers,
            body,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Segments joined by `/`, without leading or trailing slash.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }
}

/// Join `/`-separated segments, dropping empty ones.
///
/// `.` and `..` (also percent-encoded as `%2e`) are refused: the upstream
/// URL parser would resolve them and escape the configured path prefix.
pub fn join_segments(raw: &str) -> Result<String, RequestError> {
    let mut segments = Vec::new();
    for segment in raw.split('/').filter(|segment| !segment.is_empty()) {
        if is_dot_segment(segment) {
            return Err(RequestError::DotSegment(segment.to_string()));
        }
        segments.push(segment);
    }
    Ok(segments.join("/"))
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn carries_body(method: &Method, body: &[u8]) -> bool {
    !NO_BODY_METHODS.contains(method) && !is_empty_body(body)
}

/// Whitespace, JSON `null` and `{}` count as no body.
fn is_empty_body(body: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(body) else {
        return false;
    };
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return true;
    }
    if trimmed.starts_with('{') {
        return matches!(
            serde_json::from_str::<serde_json::Value>(trimmed),
            Ok(serde_json::Value::Object(ref map)) if map.is_empty()
        );
    }
    false
}
