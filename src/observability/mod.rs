//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request path produces:
//!     → tracing events with request_id, method, status, elapsed_ms
//!     → spans per request from tower-http's TraceLayer
//!
//! Consumers:
//!     → logging.rs (stdout, pretty or JSON)
//! ```

pub mod logging;

pub use logging::init_logging;
