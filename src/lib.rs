//! Finance API proxy library.
//!
//! Forwards `/api/proxy/*` requests to the personal-finance backend,
//! retrying server errors and transport failures with backoff.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
