//! S3 signing proxy library.
//!
//! Accepts plain HTTP requests, maps them onto objects of a private S3
//! bucket, signs them with AWS Signature V4 and relays the bucket's answer.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod signing;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::ProxyHandler;
