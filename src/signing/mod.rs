//! Outbound request authentication.
//!
//! # Data Flow
//! ```text
//! backend URL + method + host header
//!     → sigv4.rs (canonical request → string to sign → HMAC chain)
//!     → authorization, x-amz-date, x-amz-content-sha256 headers
//! ```

pub mod sigv4;

pub use sigv4::{Credentials, SigV4Signer};
