//! Per-attempt results and terminal states.

use axum::http::{header, HeaderValue, StatusCode};
use bytes::Bytes;
use serde_json::{Map, Value};

use crate::upstream::{TransportError, UpstreamResponse};

/// Upstream body, interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// JSON if the bytes parse as JSON, raw (lossy UTF-8) text otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Payload::Json(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

/// An upstream response tied to the URL it came from.
#[derive(Debug, Clone)]
pub struct ForwardResult {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    /// Raw body exactly as received.
    pub body: Bytes,
    pub target: String,
}

impl ForwardResult {
    pub fn from_response(response: UpstreamResponse, target: &str) -> Self {
        Self {
            status: response.status,
            content_type: response.headers.get(header::CONTENT_TYPE).cloned(),
            body: response.body,
            target: target.to_string(),
        }
    }

    pub fn payload(&self) -> Payload {
        Payload::from_bytes(&self.body)
    }
}

/// Classification of a single attempt.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// Upstream answered with a status below 500.
    Success(ForwardResult),
    /// Upstream answered with a 5xx status.
    ServerError(ForwardResult),
    /// No response was received.
    TransportFailure(TransportError),
}

impl AttemptOutcome {
    pub fn classify(result: Result<UpstreamResponse, TransportError>, target: &str) -> Self {
        match result {
            Ok(response) if response.status.is_server_error() => {
                AttemptOutcome::ServerError(ForwardResult::from_response(response, target))
            }
            Ok(response) => AttemptOutcome::Success(ForwardResult::from_response(response, target)),
            Err(err) => AttemptOutcome::TransportFailure(err),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AttemptOutcome::Success(r) | AttemptOutcome::ServerError(r) => Some(r.status),
            AttemptOutcome::TransportFailure(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success(_) => "success",
            AttemptOutcome::ServerError(_) => "server_error",
            AttemptOutcome::TransportFailure(_) => "transport_failure",
        }
    }
}

/// How an inbound call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Succeeded,
    ExhaustedWithResponse,
    ExhaustedWithoutResponse,
}

impl Terminal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Terminal::Succeeded => "succeeded",
            Terminal::ExhaustedWithResponse => "exhausted_with_response",
            Terminal::ExhaustedWithoutResponse => "exhausted_without_response",
        }
    }
}
