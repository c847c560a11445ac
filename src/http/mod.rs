//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, error mapping)
//!     → request.rs (request ID)
//!     → [proxy handler rewrites and signs]
//!     → forward.rs (single upstream round trip)
//!     → response.rs (status mapping, cache directive, hop-by-hop strip)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
