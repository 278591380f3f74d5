//! Response construction.
//!
//! # Responsibilities
//! - Turn a `ProxyReply` into an HTTP response
//! - Build the JSON `{ error }` bodies for requests the proxy itself rejects
//!
//! # Design Decisions
//! - Upstream bodies are passed through byte-for-byte with their own `Content-Type`
//! - Only `Content-Type` is copied from upstream; other upstream headers are dropped

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::proxy::ProxyReply;

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}

/// `{ "error": message }` with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
