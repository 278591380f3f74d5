//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound (method, path segments, headers, body)
//!     → request.rs (ForwardRequest: verb and path checks, Authorization, body/Content-Type shaping)
//!     → orchestrator.rs (attempt loop against the upstream client)
//!         → outcome.rs (Success | ServerError | TransportFailure)
//!         → resilience::retries (retry? how long to wait?)
//!     → normalize.rs (failure bodies with `target`)
//!     → ProxyReply
//! ```

pub mod normalize;
pub mod orchestrator;
pub mod outcome;
pub mod request;

pub use orchestrator::{Orchestrator, ProxyReply};
pub use outcome::{AttemptOutcome, ForwardResult, Payload, Terminal};
pub use request::{ForwardRequest, RequestError};
