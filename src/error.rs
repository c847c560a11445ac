//! Request-path errors and their single mapping to an HTTP response.
//!
//! A backend that answers with a non-success status is not an error; the
//! response adjuster handles it on the normal path.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Everything that can abort the handling of one request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// A required setting is not configured.
    #[error("{0} is not configured")]
    MissingSetting(&'static str),

    /// Bucket, region or endpoint produced an unusable backend URL.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A computed header value contained bytes not allowed in HTTP headers.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),

    /// DNS, connect, TLS or read failure talking to the backend.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

impl ProxyError {
    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MissingSetting(_) | ProxyError::InvalidUrl(_) => "configuration",
            ProxyError::InvalidHeader(_) => "header",
            ProxyError::Transport(_) => "transport",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response =
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );
        response
    }
}
