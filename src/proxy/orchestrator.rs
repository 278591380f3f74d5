//! Retry-and-fallback forwarding.
//!
//! # State Machine (per inbound call)
//! ```text
//! Attempting(1) ──status < 500──────────────▶ Succeeded
//!      │
//!      └─5xx / transport failure─▶ sleep(backoff(n)) ─▶ Attempting(n+1)
//!                                   ...
//! Attempting(max) ─5xx──────────────────────▶ ExhaustedWithResponse    (status + body with `target`)
//! Attempting(max) ─transport failure────────▶ ExhaustedWithoutResponse (502 { error, target })
//! ```
//!
//! # Design Decisions
//! - The same `ForwardRequest` is sent on every attempt
//! - No state is shared between calls; attempt counters live on the stack
//! - Every terminal state maps to a concrete response; nothing is raised

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use bytes::Bytes;
use serde_json::Value;

use crate::observability::metrics;
use crate::proxy::normalize::{annotate_failure, transport_failure_body};
use crate::proxy::outcome::{AttemptOutcome, Terminal};
use crate::proxy::request::ForwardRequest;
use crate::resilience::RetryPolicy;
use crate::upstream::{ResolvedOrigin, UpstreamClient};

/// Final answer for the inbound caller.
#[derive(Debug, Clone)]
pub struct ProxyReply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
    pub target: String,
    pub attempts: u32,
    pub terminal: Terminal,
}

impl ProxyReply {
    fn json(status: StatusCode, body: Value, target: String, attempts: u32, terminal: Terminal) -> Self {
        Self {
            status,
            content_type: Some(HeaderValue::from_static("application/json")),
            body: Bytes::from(body.to_string()),
            target,
            attempts,
            terminal,
        }
    }

    fn finish(outcome: AttemptOutcome, target: String, attempts: u32, exhausted: bool) -> Self {
        match outcome {
            AttemptOutcome::Success(result) => Self {
                status: result.status,
                content_type: result.content_type,
                body: result.body,
                target,
                attempts,
                terminal: if exhausted {
                    Terminal::ExhaustedWithResponse
                } else {
                    Terminal::Succeeded
                },
            },
            AttemptOutcome::ServerError(result) => {
                let body = annotate_failure(result.status, &result.payload(), &target);
                Self::json(result.status, body, target, attempts, Terminal::ExhaustedWithResponse)
            }
            AttemptOutcome::TransportFailure(error) => {
                let body = transport_failure_body(&error, &target);
                Self::json(StatusCode::BAD_GATEWAY, body, target, attempts, Terminal::ExhaustedWithoutResponse)
            }
        }
    }
}

/// Forwards requests to one upstream origin under a retry policy.
pub struct Orchestrator {
    client: Arc<dyn UpstreamClient>,
    origin: ResolvedOrigin,
    path_prefix: String,
    policy: RetryPolicy,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        origin: ResolvedOrigin,
        path_prefix: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        let path_prefix = path_prefix.into();
        Self {
            client,
            origin,
            path_prefix: path_prefix.trim_end_matches('/').to_string(),
            policy,
        }
    }

    pub fn origin(&self) -> &ResolvedOrigin {
        &self.origin
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `<origin><prefix>/<path>`.
    pub fn target_url(&self, request: &ForwardRequest) -> String {
        format!("{}{}/{}", self.origin, self.path_prefix, request.path())
    }

    /// Forward `request`, retrying 5xx responses and transport failures.
    pub async fn forward(&self, request: &ForwardRequest) -> ProxyReply {
        let target = self.target_url(request);
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            let result = self.client.send(request, &target).await;
            let outcome = AttemptOutcome::classify(result, &target);
            metrics::record_attempt(outcome.label());

            if !self.policy.should_retry(&outcome) {
                tracing::debug!(
                    target_url = %target,
                    attempt,
                    status = ?outcome.status(),
                    "Upstream request completed"
                );
                return ProxyReply::finish(outcome, target, attempt, false);
            }

            if attempt >= max_attempts {
                match &outcome {
                    AttemptOutcome::TransportFailure(error) => tracing::error!(
                        target_url = %target,
                        attempts = attempt,
                        error = %error,
                        "Upstream unreachable, giving up"
                    ),
                    _ => tracing::warn!(
                        target_url = %target,
                        attempts = attempt,
                        status = ?outcome.status(),
                        "Upstream still failing, giving up"
                    ),
                }
                return ProxyReply::finish(outcome, target, attempt, true);
            }

            let delay = self.policy.delay(attempt);
            tracing::info!(
                target_url = %target,
                attempt,
                delay = ?delay,
                outcome = outcome.label(),
                status = ?outcome.status(),
                "Retrying upstream request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
