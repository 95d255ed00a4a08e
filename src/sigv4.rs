//! AWS Signature Version 4 request signing.
//!
//! Only what a JSON-over-POST API needs is covered: header-based
//! authorization with an optional session token. Presigned URLs, chunked
//! payloads and the S3 path rules are not.

use chrono::{DateTime, Utc};
use reqwest::Method;
use ring::hmac;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::errors::{Error, Result};

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const DATE_HEADER: &str = "x-amz-date";
pub const SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";

const HOST_HEADER: &str = "host";
const SCOPE_TERMINATOR: &str = "aws4_request";
const DATE_FORMAT: &str = "%Y%m%d";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Temporary access key pair issued to the instance role.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// An empty session token is treated as absent.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.filter(|token| !token.is_empty()),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    fn validate(&self) -> Result<()> {
        if self.access_key_id.trim().is_empty() {
            return Err(Error::Signing("access key id must not be empty".into()));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(Error::Signing("secret access key must not be empty".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// An outbound request before signing. Header names are stored lower-cased.
#[derive(Debug, Clone)]
pub struct SignableRequest {
    method: Method,
    url: Url,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl SignableRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// A request carrying `host`, `x-amz-date`, the optional security token and
/// the `authorization` header. Built fresh for every call.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: Method,
    url: Url,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl SignedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Signs requests for one service in one region.
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl Signer {
    pub fn new(
        credentials: Credentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    pub fn sign(&self, request: SignableRequest) -> Result<SignedRequest> {
        self.sign_at(request, Utc::now())
    }

    /// Sign as of `time`. Deterministic for a given request and instant.
    pub fn sign_at(
        &self,
        mut request: SignableRequest,
        time: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        self.credentials.validate()?;
        if self.region.is_empty() || self.service.is_empty() {
            return Err(Error::Signing(
                "region and service must not be empty".into(),
            ));
        }

        let timestamp = time.format(TIMESTAMP_FORMAT).to_string();
        let date = time.format(DATE_FORMAT).to_string();

        request.headers.remove(AUTHORIZATION_HEADER);
        request
            .headers
            .insert(HOST_HEADER.into(), host_header(&request.url)?);
        request
            .headers
            .insert(DATE_HEADER.into(), timestamp.clone());
        if let Some(token) = self.credentials.session_token() {
            request
                .headers
                .insert(SECURITY_TOKEN_HEADER.into(), token.to_string());
        }

        let signed_headers = request
            .headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";");
        let canonical = canonical_request(&request, &signed_headers);
        let scope = format!(
            "{date}/{region}/{service}/{SCOPE_TERMINATOR}",
            region = self.region,
            service = self.service
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{timestamp}\n{scope}\n{}",
            hex_sha256(canonical.as_bytes())
        );
        let key = signing_key(
            &self.credentials.secret_access_key,
            &date,
            &self.region,
            &self.service,
        );
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

        request.headers.insert(
            AUTHORIZATION_HEADER.into(),
            format!(
                "{ALGORITHM} Credential={access_key}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
                access_key = self.credentials.access_key_id
            ),
        );

        Ok(SignedRequest {
            method: request.method,
            url: request.url,
            headers: request.headers,
            body: request.body,
        })
    }
}

fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::Signing(format!("request url {url} has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn canonical_request(request: &SignableRequest, signed_headers: &str) -> String {
    let headers: String = request
        .headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", normalize_header_value(value)))
        .collect();
    format!(
        "{method}\n{uri}\n{query}\n{headers}\n{signed_headers}\n{payload}",
        method = request.method.as_str(),
        uri = canonical_uri(&request.url),
        query = canonical_query(&request.url),
        payload = hex_sha256(&request.body)
    )
}

// Url keeps the path percent-encoded once; non-S3 services expect each
// segment encoded a second time.
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return "/".into();
    }
    let segments: Vec<String> = path.split('/').map(uri_encode).collect();
    segments.join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| (uri_encode(&key), uri_encode(&value)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn uri_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&key, data).as_ref().to_vec()
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
