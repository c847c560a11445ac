//! Inbound path to backend object key.
//!
//! # Design Decisions
//! - The strip prefix is matched literally and only at the start of the path
//! - At most one `/` directly after the prefix is consumed with it
//! - The backend prefix is prepended verbatim; callers include their own `/`

use url::Url;

/// Strips the inbound prefix and prepends the backend prefix.
#[derive(Debug, Clone)]
pub struct PathRewriter {
    strip_prefix: String,
    add_prefix: String,
}

impl PathRewriter {
    pub fn new(strip_prefix: impl Into<String>, add_prefix: impl Into<String>) -> Self {
        Self {
            strip_prefix: strip_prefix.into(),
            add_prefix: add_prefix.into(),
        }
    }

    /// Rewrite an inbound path into a backend object key.
    pub fn rewrite(&self, path: &str) -> String {
        let rest = match path.strip_prefix(self.strip_prefix.as_str()) {
            Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
            None => path,
        };
        format!("{}{}", self.add_prefix, rest)
    }
}

/// Build the full backend URL for `key` under `base`.
///
/// `base` always ends with `/`, which absorbs one leading `/` of the key. An
/// empty key addresses the bucket root.
pub fn object_url(base: &Url, key: &str) -> Result<Url, url::ParseError> {
    let key = key.strip_prefix('/').unwrap_or(key);
    Url::parse(&format!("{}{}", base.as_str(), key))
}
