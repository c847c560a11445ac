//! The proxy handler: inbound request to signed bucket request and back.
//!
//! # Data Flow
//! ```text
//! inbound method + URI
//!     → rewrite.rs (strip PATH_PREFIX, prepend S3_PATH_PREFIX)
//!     → query.rs (copy query pairs minus REMOVE_QUERY_PARAMS)
//!     → signing (SigV4 headers, host = bucket endpoint)
//!     → http::forward (single round trip, streamed body)
//!     → http::response (status mapping, cache directive)
//! ```
//!
//! Every step returns `Result<_, ProxyError>`; the server maps errors to a
//! response in one place.

pub mod query;
pub mod rewrite;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Response, Uri};
use chrono::{DateTime, Utc};
use url::Url;

use crate::config::S3Config;
use crate::error::ProxyError;
use crate::http::forward::Forwarder;
use crate::http::response::adjust_response;
use crate::signing::sigv4::{authority, SigV4Signer};

pub use query::QueryFilter;
pub use rewrite::{object_url, PathRewriter};

/// A signed request ready to be sent to the bucket.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

/// Rewrites, signs and forwards requests for one bucket.
#[derive(Debug, Clone)]
pub struct ProxyHandler {
    config: S3Config,
    rewriter: PathRewriter,
    query_filter: QueryFilter,
    cache_control: HeaderValue,
    forwarder: Forwarder,
}

impl ProxyHandler {
    pub fn new(config: S3Config, forwarder: Forwarder) -> Result<Self, ProxyError> {
        let cache_control = HeaderValue::from_str(&config.cache_control)?;
        Ok(Self {
            rewriter: PathRewriter::new(config.path_prefix.clone(), config.s3_path_prefix.clone()),
            query_filter: QueryFilter::new(&config.remove_query_params),
            cache_control,
            forwarder,
            config,
        })
    }

    /// Handle one inbound request end to end.
    pub async fn handle(&self, method: &Method, uri: &Uri) -> Result<Response<Body>, ProxyError> {
        let outbound = self.build_outbound(method, uri, Utc::now())?;

        tracing::debug!(
            method = %outbound.method,
            url = %outbound.url,
            "Forwarding to bucket"
        );

        let response = self.forwarder.send(outbound).await?;
        Ok(adjust_response(response, &self.cache_control))
    }

    /// Build the signed outbound request for an inbound method and URI.
    pub fn build_outbound(
        &self,
        method: &Method,
        uri: &Uri,
        now: DateTime<Utc>,
    ) -> Result<OutboundRequest, ProxyError> {
        let signer = SigV4Signer::from_config(&self.config)?;
        let base = self.base_url()?;

        let key = self.rewriter.rewrite(uri.path());
        let mut url = object_url(&base, &key)?;
        self.query_filter.apply(uri.query(), &mut url);

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(&authority(&url))?);
        signer.sign(method, &url, &mut headers, now)?;

        Ok(OutboundRequest {
            method: method.clone(),
            url,
            headers,
        })
    }

    /// Endpoint every object key is joined onto; always ends with `/`.
    ///
    /// Defaults to the virtual-hosted-style bucket endpoint
    /// `https://{bucket}.s3.{region}.amazonaws.com/`.
    pub fn base_url(&self) -> Result<Url, ProxyError> {
        let mut url = match &self.config.endpoint {
            Some(endpoint) => Url::parse(endpoint)?,
            None => {
                let bucket = self
                    .config
                    .bucket
                    .as_deref()
                    .ok_or(ProxyError::MissingSetting("S3_BUCKET"))?;
                let region = self
                    .config
                    .region
                    .as_deref()
                    .ok_or(ProxyError::MissingSetting("AWS_REGION"))?;
                Url::parse(&format!("https://{}.s3.{}.amazonaws.com/", bucket, region))?
            }
        };

        url.set_query(None);
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use chrono::TimeZone;

    use crate::config::loader::split_param_list;
    use crate::signing::sigv4::{X_AMZ_CONTENT_SHA256, X_AMZ_DATE};

    fn config() -> S3Config {
        S3Config {
            access_key_id: Some("AKIDEXAMPLE".into()),
            secret_access_key: Some("secret".into()),
            region: Some("us-east-1".into()),
            bucket: Some("assets".into()),
            ..S3Config::default()
        }
    }

    fn handler(config: S3Config) -> ProxyHandler {
        ProxyHandler::new(config, Forwarder::new().unwrap()).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_rewrite_filter_and_sign() {
        let mut cfg = config();
        cfg.s3_path_prefix = "media/".into();
        cfg.remove_query_params = split_param_list("token");

        let outbound = handler(cfg)
            .build_outbound(&Method::GET, &uri("/s3/images/cat.png?token=abc&w=100"), now())
            .unwrap();

        assert_eq!(
            outbound.url.as_str(),
            "https://assets.s3.us-east-1.amazonaws.com/media/images/cat.png?w=100"
        );
        assert_eq!(
            outbound.headers[header::HOST],
            "assets.s3.us-east-1.amazonaws.com"
        );
        assert_eq!(outbound.headers[&X_AMZ_DATE], "20240301T123000Z");
        assert!(outbound.headers.contains_key(&X_AMZ_CONTENT_SHA256));
        let auth = outbound.headers[AUTHORIZATION].to_str().unwrap();
        assert!(auth.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240301/us-east-1/s3/aws4_request"
        ));
    }

    #[test]
    fn test_unmatched_prefix_keeps_path() {
        let outbound = handler(config())
            .build_outbound(&Method::GET, &uri("/other/file.txt"), now())
            .unwrap();
        assert_eq!(outbound.url.path(), "/other/file.txt");
    }

    #[test]
    fn test_prefix_only_addresses_bucket_root() {
        let outbound = handler(config())
            .build_outbound(&Method::GET, &uri("/s3"), now())
            .unwrap();
        assert_eq!(
            outbound.url.as_str(),
            "https://assets.s3.us-east-1.amazonaws.com/"
        );
    }

    #[test]
    fn test_method_is_preserved() {
        let outbound = handler(config())
            .build_outbound(&Method::HEAD, &uri("/s3/a"), now())
            .unwrap();
        assert_eq!(outbound.method, Method::HEAD);
    }

    #[test]
    fn test_same_input_same_outbound() {
        let handler = handler(config());
        let request = uri("/s3/a/b?x=1&x=2&y=3");
        let first = handler.build_outbound(&Method::GET, &request, now()).unwrap();
        let second = handler.build_outbound(&Method::GET, &request, now()).unwrap();
        assert_eq!(first.url, second.url);
        assert_eq!(first.headers, second.headers);
    }

    #[test]
    fn test_missing_settings_are_errors() {
        let mut cfg = config();
        cfg.access_key_id = None;
        let err = handler(cfg)
            .build_outbound(&Method::GET, &uri("/s3/a"), now())
            .unwrap_err();
        assert_eq!(err.to_string(), "AWS_ACCESS_KEY_ID is not configured");

        let mut cfg = config();
        cfg.bucket = None;
        let err = handler(cfg)
            .build_outbound(&Method::GET, &uri("/s3/a"), now())
            .unwrap_err();
        assert!(matches!(err, ProxyError::MissingSetting("S3_BUCKET")));
    }

    #[test]
    fn test_malformed_bucket_is_a_url_error() {
        let mut cfg = config();
        cfg.bucket = Some("bad bucket/name".into());
        let err = handler(cfg).base_url().unwrap_err();
        assert!(matches!(err, ProxyError::InvalidUrl(_)));
    }

    #[test]
    fn test_endpoint_override() {
        let mut cfg = config();
        cfg.endpoint = Some("http://127.0.0.1:9000/assets?x=1".into());
        let handler = handler(cfg);
        assert_eq!(handler.base_url().unwrap().as_str(), "http://127.0.0.1:9000/assets/");

        let outbound = handler
            .build_outbound(&Method::GET, &uri("/s3/k.txt"), now())
            .unwrap();
        assert_eq!(outbound.url.as_str(), "http://127.0.0.1:9000/assets/k.txt");
        assert_eq!(outbound.headers[header::HOST], "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_cache_directive_is_rejected() {
        let mut cfg = config();
        cfg.cache_control = "bad\nvalue".into();
        let err = ProxyHandler::new(cfg, Forwarder::new().unwrap()).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidHeader(_)));
    }
}
