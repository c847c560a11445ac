//! AWS Signature V4 request signing.
//!
//! Signs outbound S3 requests with the header-based scheme.
//! Reference: https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html

use std::collections::BTreeMap;

use axum::http::header::{AUTHORIZATION, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{
    percent_decode_str, percent_encode, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC,
};
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::S3Config;
use crate::error::ProxyError;

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name in the credential scope.
pub const SERVICE: &str = "s3";

/// SHA-256 of the empty payload. Forwarded requests never carry a body.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

pub const X_AMZ_DATE: HeaderName = HeaderName::from_static("x-amz-date");
pub const X_AMZ_CONTENT_SHA256: HeaderName = HeaderName::from_static("x-amz-content-sha256");

/// RFC 3986 unreserved characters stay literal; everything else is encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Access key pair used to sign requests.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// Signs requests for one region with one credential pair.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
}

impl SigV4Signer {
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
        }
    }

    /// Build a signer from the bucket configuration.
    ///
    /// Fails when the credential pair or the region is missing so that no
    /// request is ever forwarded unsigned.
    pub fn from_config(config: &S3Config) -> Result<Self, ProxyError> {
        let access_key_id = config
            .access_key_id
            .clone()
            .ok_or(ProxyError::MissingSetting("AWS_ACCESS_KEY_ID"))?;
        let secret_access_key = config
            .secret_access_key
            .clone()
            .ok_or(ProxyError::MissingSetting("AWS_SECRET_ACCESS_KEY"))?;
        let region = config
            .region
            .clone()
            .ok_or(ProxyError::MissingSetting("AWS_REGION"))?;

        Ok(Self::new(
            Credentials {
                access_key_id,
                secret_access_key,
            },
            region,
        ))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sign a bodiless request in place.
    ///
    /// Adds `host` when absent, sets `x-amz-date` and `x-amz-content-sha256`,
    /// then signs every header present and sets `authorization`.
    pub fn sign(
        &self,
        method: &Method,
        url: &Url,
        headers: &mut HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<(), ProxyError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        headers.remove(AUTHORIZATION);
        if !headers.contains_key(HOST) {
            headers.insert(HOST, HeaderValue::from_str(&authority(url))?);
        }
        headers.insert(X_AMZ_DATE, HeaderValue::from_str(&amz_date)?);
        headers.insert(
            X_AMZ_CONTENT_SHA256,
            HeaderValue::from_static(EMPTY_PAYLOAD_SHA256),
        );

        let (canonical_request, signed_headers) =
            canonical_request(method, url, headers, EMPTY_PAYLOAD_SHA256);

        let credential_scope = format!(
            "{}/{}/{}/aws4_request",
            date_stamp, self.region, SERVICE
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(
            &self.credentials.secret_access_key,
            &date_stamp,
            &self.region,
            SERVICE,
        );
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        tracing::trace!(
            canonical_request = %canonical_request,
            string_to_sign = %string_to_sign,
            "Computed SigV4 signature"
        );

        let mut authorization = HeaderValue::from_str(&format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.credentials.access_key_id,
            credential_scope,
            signed_headers,
            signature
        ))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        Ok(())
    }
}

/// `host[:port]` of a URL, as sent in the `host` header.
pub fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Build the canonical request and the signed-headers list.
///
/// The timestamp only enters through the `x-amz-date` header, so two calls
/// with equal inputs yield equal output.
pub fn canonical_request(
    method: &Method,
    url: &Url,
    headers: &HeaderMap,
    payload_hash: &str,
) -> (String, String) {
    let mut canonical_headers: BTreeMap<&str, String> = BTreeMap::new();
    for name in headers.keys() {
        let value = headers
            .get_all(name)
            .iter()
            .map(|v| {
                String::from_utf8_lossy(v.as_bytes())
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(",");
        canonical_headers.insert(name.as_str(), value);
    }

    let signed_headers = canonical_headers
        .keys()
        .copied()
        .collect::<Vec<_>>()
        .join(";");
    let header_block: String = canonical_headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();

    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.as_str(),
        canonical_uri(url),
        canonical_query_string(url),
        header_block,
        signed_headers,
        payload_hash
    );

    (canonical, signed_headers)
}

/// Path with every segment decoded once and re-encoded (S3 single encoding).
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| {
            let raw: Vec<u8> = percent_decode_str(segment).collect();
            percent_encode(&raw, URI_ENCODE_SET).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Query pairs encoded with the URI set and sorted by name, then value.
fn canonical_query_string(url: &Url) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                utf8_percent_encode(&k, URI_ENCODE_SET).to_string(),
                utf8_percent_encode(&v, URI_ENCODE_SET).to_string(),
            )
        })
        .collect();
    params.sort();

    params
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_secret = format!("AWS4{}", secret_key);
    let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
