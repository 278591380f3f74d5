//! Upstream (backend API) subsystem.
//!
//! # Data Flow
//! ```text
//! [upstream] backend_url / api_url
//!     → origin.rs (first non-empty candidate, loopback guard, default)
//!     → ResolvedOrigin (fixed for the process lifetime)
//!
//! ForwardRequest + target URL
//!     → client.rs (one HTTP exchange, per-attempt timeout)
//!     → UpstreamResponse | TransportError
//! ```

pub mod client;
pub mod origin;

pub use client::{HttpUpstream, TransportError, UpstreamClient, UpstreamResponse};
pub use origin::{resolve_origin, OriginResolver, OriginSource, ResolvedOrigin, DEFAULT_ORIGIN};
