//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http + proxy subsystems produce:
//!     → logging.rs (structured tracing events, request id in span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
