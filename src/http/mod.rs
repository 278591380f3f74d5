//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id + trace layers)
//!     → request.rs (x-request-id generation)
//!     → proxy::ForwardRequest / proxy::Orchestrator
//!     → response.rs (ProxyReply → HTTP response, JSON error bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer, PROXY_MOUNT};
