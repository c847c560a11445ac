//! Response handling and transformation.
//!
//! # Responsibilities
//! - Replace unsuccessful backend responses with a plain-text summary
//! - Relay successful responses with their headers and streamed body
//! - Force the cache directive on `200 OK`
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped; the server re-frames the body
//! - Only exactly 200 gets the cache directive; 201/204/206 pass untouched

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use hyper::ext::ReasonPhrase;

/// Headers that describe one connection and are never relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Turn the backend response into the response sent to the caller.
pub fn adjust_response(mut response: Response<Body>, cache_control: &HeaderValue) -> Response<Body> {
    let status = response.status();

    if !status.is_success() {
        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned());
        return backend_error(status, reason.as_deref());
    }

    strip_hop_by_hop(response.headers_mut());
    if status == StatusCode::OK {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, cache_control.clone());
    }
    response
}

/// `S3 Error: {status} {reason}` with the backend's status code.
///
/// The bucket's own reason phrase wins; the canonical one fills in when the
/// bucket sent the standard phrase.
fn backend_error(status: StatusCode, reason: Option<&str>) -> Response<Body> {
    let reason = reason.or(status.canonical_reason()).unwrap_or_default();
    let body = format!("S3 Error: {} {}", status.as_u16(), reason);
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
