//! Backend origin resolution.
//!
//! # Responsibilities
//! - Pick the first non-empty candidate origin in precedence order
//! - Normalize away a single trailing slash
//! - Substitute the built-in default for missing or loopback candidates
//!
//! # Design Decisions
//! - Resolution never fails; the default origin is always available
//! - Loopback detection is delegated to `config::is_loopback_origin`

use std::fmt;

use crate::config::is_loopback_origin;

/// Origin used when no usable candidate is configured.
pub const DEFAULT_ORIGIN: &str = "https://personal-finance-e23w.onrender.com";

/// Where a resolved origin came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginSource {
    /// Candidate at this index was used.
    Configured(usize),
    /// No candidate was set.
    Default,
    /// Candidate at this index designated loopback and was discarded.
    LoopbackRejected(usize),
}

/// A normalized backend base URL with no trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOrigin {
    url: String,
    source: OriginSource,
}

impl ResolvedOrigin {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> OriginSource {
        self.source
    }

    fn default_with(source: OriginSource) -> Self {
        Self {
            url: DEFAULT_ORIGIN.to_string(),
            source,
        }
    }
}

impl fmt::Display for ResolvedOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Chooses the backend origin from ordered candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginResolver {
    allow_loopback: bool,
}

impl OriginResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep loopback candidates instead of replacing them. Only meant for
    /// running proxy and backend on one machine.
    pub fn allow_loopback(mut self, allow: bool) -> Self {
        self.allow_loopback = allow;
        self
    }

    /// Resolve `candidates` (highest precedence first) to a base URL.
    pub fn resolve(&self, candidates: &[Option<&str>]) -> ResolvedOrigin {
        let chosen = candidates
            .iter()
            .enumerate()
            .find_map(|(index, candidate)| {
                candidate
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(|value| (index, value))
            });

        let Some((index, value)) = chosen else {
            tracing::debug!(origin = DEFAULT_ORIGIN, "No backend origin configured, using default");
            return ResolvedOrigin::default_with(OriginSource::Default);
        };

        let url = value.strip_suffix('/').unwrap_or(value);

        if !self.allow_loopback && is_loopback_origin(url) {
            tracing::warn!(
                configured = %url,
                fallback = DEFAULT_ORIGIN,
                "Configured backend origin is a loopback address, using default origin instead"
            );
            return ResolvedOrigin::default_with(OriginSource::LoopbackRejected(index));
        }

        ResolvedOrigin {
            url: url.to_string(),
            source: OriginSource::Configured(index),
        }
    }
}

/// Resolve with the loopback guard enabled.
pub fn resolve_origin(candidates: &[Option<&str>]) -> ResolvedOrigin {
    OriginResolver::new().resolve(candidates)
}
