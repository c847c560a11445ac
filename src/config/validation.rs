//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the bind address parses
//! - Validate the endpoint override is an http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Missing S3 credentials are reported separately and do not fail startup;
//!   requests served without them fail individually

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{ProxyConfig, S3Config};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),
    #[error("invalid endpoint '{0}': expected an http or https URL")]
    Endpoint(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(endpoint) = &config.s3.endpoint {
        let valid = Url::parse(endpoint)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::Endpoint(endpoint.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Names of the required S3 settings that are not configured.
pub fn missing_s3_settings(s3: &S3Config) -> Vec<&'static str> {
    [
        ("AWS_ACCESS_KEY_ID", &s3.access_key_id),
        ("AWS_SECRET_ACCESS_KEY", &s3.secret_access_key),
        ("AWS_REGION", &s3.region),
        ("S3_BUCKET", &s3.bucket),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_none())
    .map(|(name, _)| name)
    .collect()
}
