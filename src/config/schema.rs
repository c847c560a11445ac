//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Inbound prefix stripped when `path_prefix` is not configured.
pub const DEFAULT_PATH_PREFIX: &str = "/s3";

/// Cache directive forced onto `200 OK` responses by default (one day).
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=86400";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Backend bucket, credentials and rewrite rules.
    pub s3: S3Config,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Backend bucket configuration.
///
/// Credentials, region and bucket stay optional here: a request served
/// without them fails with a handler-level error instead of preventing
/// startup.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct S3Config {
    /// Signing credential id (`AWS_ACCESS_KEY_ID`).
    pub access_key_id: Option<String>,

    /// Signing credential secret (`AWS_SECRET_ACCESS_KEY`).
    pub secret_access_key: Option<String>,

    /// Bucket region, used in the host and in the signing scope (`AWS_REGION`).
    pub region: Option<String>,

    /// Bucket name (`S3_BUCKET`).
    pub bucket: Option<String>,

    /// Base URL replacing `https://{bucket}.s3.{region}.amazonaws.com/`
    /// (`S3_ENDPOINT`). Useful for S3-compatible stores.
    pub endpoint: Option<String>,

    /// Inbound prefix stripped before forwarding (`PATH_PREFIX`).
    pub path_prefix: String,

    /// Backend prefix prepended after stripping (`S3_PATH_PREFIX`).
    pub s3_path_prefix: String,

    /// Query parameter names dropped before forwarding (`REMOVE_QUERY_PARAMS`).
    pub remove_query_params: Vec<String>,

    /// Directive forced onto `200 OK` responses (`CACHE_CONTROL`).
    pub cache_control: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            region: None,
            bucket: None,
            endpoint: None,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            s3_path_prefix: String::new(),
            remove_query_params: Vec::new(),
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
        }
    }
}

impl S3Config {
    /// Replace empty values with their defaults.
    ///
    /// Runs once at load time so the request path never branches on unset
    /// values.
    pub fn resolve_defaults(&mut self) {
        for value in [
            &mut self.access_key_id,
            &mut self.secret_access_key,
            &mut self.region,
            &mut self.bucket,
            &mut self.endpoint,
        ] {
            if value.as_deref().is_some_and(str::is_empty) {
                *value = None;
            }
        }
        if self.path_prefix.is_empty() {
            self.path_prefix = DEFAULT_PATH_PREFIX.to_string();
        }
        if self.cache_control.is_empty() {
            self.cache_control = DEFAULT_CACHE_CONTROL.to_string();
        }
    }
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("path_prefix", &self.path_prefix)
            .field("s3_path_prefix", &self.s3_path_prefix)
            .field("remove_query_params", &self.remove_query_params)
            .field("cache_control", &self.cache_control)
            .finish()
    }
}
