//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts >= 1, addresses parse)
//! - Decide whether an origin designates the local machine
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Loopback origins are not errors here; the origin resolver replaces them

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use url::{Host, Url};

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' is not an absolute http(s) URL")]
    InvalidUpstreamUrl { field: &'static str, value: String },

    #[error("upstream.path_prefix must be empty or start with '/', got '{0}'")]
    InvalidPathPrefix(String),

    #[error("retries.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroRequestTimeout,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let origins = [
        ("upstream.backend_url", config.upstream.backend_url.as_deref()),
        ("upstream.api_url", config.upstream.api_url.as_deref()),
    ];
    for (field, value) in origins {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        if !is_http_url(value) {
            errors.push(ValidationError::InvalidUpstreamUrl {
                field,
                value: value.to_string(),
            });
        }
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let prefix = &config.upstream.path_prefix;
    if !prefix.is_empty() && !prefix.starts_with('/') {
        errors.push(ValidationError::InvalidPathPrefix(prefix.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

/// Returns true if `origin` designates the local machine.
///
/// Matches `localhost` (and `*.localhost`), the 127.0.0.0/8 and `::1`
/// loopback ranges (including IPv4-mapped IPv6), and the unspecified
/// addresses `0.0.0.0` / `::`.
/// Values without a scheme (`localhost:4000`) are interpreted as `http://`.
pub fn is_loopback_origin(origin: &str) -> bool {
    let origin = origin.trim();
    let host = host_of(origin).or_else(|| host_of(&format!("http://{origin}")));

    match host {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => is_local_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_local_ip(IpAddr::V6(ip)),
        None => false,
    }
}

fn host_of(value: &str) -> Option<Host<String>> {
    Url::parse(value).ok()?.host().map(|h| h.to_owned())
}

fn is_local_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_local_ip(IpAddr::V4(v4)),
            None => v6.is_loopback() || v6.is_unspecified(),
        },
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_unspecified(),
    }
}
