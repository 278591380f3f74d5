//! Single-shot HTTP client for the backend.
//!
//! # Responsibilities
//! - Issue exactly one request per call, with a per-attempt timeout
//! - Return every HTTP status as a normal response
//! - Report connection, DNS and timeout failures as `TransportError`

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;

use crate::config::schema::TimeoutConfig;
use crate::proxy::request::ForwardRequest;

/// Message used when a transport failure carries no description at all.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Proxy request failed";

/// A complete upstream response, body buffered.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// No usable response was obtained from the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
    upstream_message: Option<String>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            upstream_message: None,
        }
    }

    /// Attach an error message supplied by the upstream itself.
    pub fn with_upstream_message(mut self, message: impl Into<String>) -> Self {
        self.upstream_message = Some(message.into());
        self
    }

    /// Best available description: upstream message, then our own, then a fixed fallback.
    pub fn failure_message(&self) -> &str {
        self.upstream_message
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| Some(self.message.as_str()).filter(|m| !m.is_empty()))
            .unwrap_or(FALLBACK_FAILURE_MESSAGE)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_message())
    }
}

impl StdError for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(error_chain(&err))
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Transport used by the orchestrator for each attempt.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Send `request` to `url` once.
    async fn send(&self, request: &ForwardRequest, url: &str) -> Result<UpstreamResponse, TransportError>;
}

/// `reqwest`-backed upstream client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn send(&self, request: &ForwardRequest, url: &str) -> Result<UpstreamResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method().clone(), url)
            .headers(request.headers().clone());

        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamResponse { status, headers, body })
    }
}
