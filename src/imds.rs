//! Plain-HTTP access to the instance metadata service.
//!
//! The two read operations differ only in how the body is decoded:
//! [`MetadataClient::fetch_json`] parses it into a caller-chosen type and
//! [`MetadataClient::fetch_text`] hands it back verbatim.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{Error, Result};
use crate::http::Http;

/// Link-local address of the EC2 instance metadata service.
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://169.254.169.254";

#[derive(Clone, Debug)]
pub struct MetadataClient {
    http: Http,
    base_url: String,
}

impl MetadataClient {
    /// Create a client rooted at `base_url`; request paths are appended to it.
    pub fn new(http: Http, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch `path` and decode the body as JSON.
    pub fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.fetch(path)?;
        serde_json::from_slice(&body).map_err(|err| Error::decode("metadata document", err))
    }

    /// Fetch `path` and return the body untouched; callers trim if they need to.
    pub fn fetch_text(&self, path: &str) -> Result<String> {
        let body = self.fetch(path)?;
        String::from_utf8(body).map_err(|err| Error::decode("metadata text", err))
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url(path);
        debug!(%url, "fetching instance metadata");

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|err| Error::unavailable(&url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::unavailable(&url, format!("status {status}")));
        }

        response
            .bytes()
            .map_err(|err| Error::unavailable(&url, err))
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}
