//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): inbound requests by method, status, terminal state
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency, retries included
//! - `proxy_upstream_attempts_total` (counter): upstream attempts by outcome
//!
//! Recording is a no-op until a recorder is installed with `init_metrics`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished inbound request.
pub fn record_request(method: &str, status: u16, terminal: &str, start: Instant) {
    ::metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "terminal" => terminal.to_string()
    )
    .increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record one upstream attempt.
pub fn record_attempt(outcome: &'static str) {
    ::metrics::counter!("proxy_upstream_attempts_total", "outcome" => outcome).increment(1);
}
