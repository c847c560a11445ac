//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, overlay the process
/// environment, apply `overrides` (command-line flags), resolve defaults and
/// validate.
pub fn load_config<F>(path: Option<&Path>, overrides: F) -> Result<ProxyConfig, ConfigError>
where
    F: FnOnce(&mut ProxyConfig),
{
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => ProxyConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok());
    overrides(&mut config);
    config.s3.resolve_defaults();

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document into a configuration.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment-style settings onto `config`.
///
/// Empty values count as unset and leave the current value in place.
pub fn apply_env<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
    let s3 = &mut config.s3;

    if let Some(value) = get("AWS_ACCESS_KEY_ID") {
        s3.access_key_id = Some(value);
    }
    if let Some(value) = get("AWS_SECRET_ACCESS_KEY") {
        s3.secret_access_key = Some(value);
    }
    if let Some(value) = get("AWS_REGION") {
        s3.region = Some(value);
    }
    if let Some(value) = get("S3_BUCKET") {
        s3.bucket = Some(value);
    }
    if let Some(value) = get("S3_ENDPOINT") {
        s3.endpoint = Some(value);
    }
    if let Some(value) = get("PATH_PREFIX") {
        s3.path_prefix = value;
    }
    if let Some(value) = get("S3_PATH_PREFIX") {
        s3.s3_path_prefix = value;
    }
    if let Some(value) = get("REMOVE_QUERY_PARAMS") {
        s3.remove_query_params = split_param_list(&value);
    }
    if let Some(value) = get("CACHE_CONTROL") {
        s3.cache_control = value;
    }
    if let Some(value) = get("PROXY_BIND_ADDRESS") {
        config.listener.bind_address = value;
    }
}

/// Split a comma-separated list of query parameter names, trimming each one.
pub fn split_param_list(value: &str) -> Vec<String> {
    value.split(',').map(|name| name.trim().to_string()).collect()
}
