//! Store client for the DynamoDB JSON protocol, limited to one filtered scan.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::errors::{Error, Result};
use crate::http::Http;
use crate::region::Region;
use crate::sigv4::{Credentials, SignableRequest, SignedRequest, Signer};

pub const SERVICE_NAME: &str = "dynamodb";
pub const SCAN_TARGET: &str = "DynamoDB_20120810.Scan";
pub const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";
pub const TARGET_HEADER: &str = "x-amz-target";

const EQUALS: &str = "EQ";
const ERROR_BODY_PREVIEW: usize = 256;

/// One `Name`/`Value` row of the config table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub name: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Source of config entries for an application.
pub trait ConfigStore {
    /// Entries whose `App` attribute equals `app`, in store order.
    fn query(&self, app: &str) -> Result<Vec<ConfigEntry>>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ScanRequest<'a> {
    table_name: &'a str,
    consistent_read: bool,
    scan_filter: ScanFilter<'a>,
}

/// Equality predicate over the `App` attribute, in the legacy `ScanFilter` shape.
#[derive(Debug, Serialize)]
struct ScanFilter<'a> {
    #[serde(rename = "App")]
    app: Condition<'a>,
}

impl<'a> ScanFilter<'a> {
    fn app_equals(app: &'a str) -> Self {
        Self {
            app: Condition {
                attribute_value_list: vec![StringValue { s: app }],
                comparison_operator: EQUALS,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Condition<'a> {
    attribute_value_list: Vec<StringValue<'a>>,
    comparison_operator: &'static str,
}

#[derive(Debug, Serialize)]
struct StringValue<'a> {
    #[serde(rename = "S")]
    s: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScanResponse {
    count: usize,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Item {
    name: StringAttribute,
    value: StringAttribute,
}

#[derive(Debug, Deserialize)]
struct StringAttribute {
    #[serde(rename = "S")]
    s: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Signed-request client for one table.
#[derive(Debug, Clone)]
pub struct DynamoClient {
    http: Http,
    signer: Signer,
    endpoint: Url,
    table: String,
}

impl DynamoClient {
    pub fn new(
        http: Http,
        signer: Signer,
        endpoint: &str,
        table: impl Into<String>,
    ) -> Result<Self> {
        let table = table.into();
        let endpoint = Url::parse(endpoint)
            .map_err(|err| Error::query(&table, format!("invalid endpoint {endpoint}: {err}")))?;
        Ok(Self {
            http,
            signer,
            endpoint,
            table,
        })
    }

    /// Client for the regional endpoint, or `endpoint` when one is given.
    pub fn for_region(
        http: Http,
        credentials: Credentials,
        region: &Region,
        endpoint: Option<&str>,
        table: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint
            .map(str::to_string)
            .unwrap_or_else(|| region.dynamodb_endpoint());
        let signer = Signer::new(credentials, region.as_str(), SERVICE_NAME);
        Self::new(http, signer, &endpoint, table)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn scan_body(&self, app: &str) -> Result<Vec<u8>> {
        let request = ScanRequest {
            table_name: &self.table,
            consistent_read: true,
            scan_filter: ScanFilter::app_equals(app),
        };
        serde_json::to_vec(&request).map_err(|err| Error::query(&self.table, err))
    }

    fn signed_scan(&self, app: &str) -> Result<SignedRequest> {
        let request = SignableRequest::new(Method::POST, self.endpoint.clone())
            .header("content-type", JSON_CONTENT_TYPE)
            .header(TARGET_HEADER, SCAN_TARGET)
            .body(self.scan_body(app)?);
        self.signer.sign(request)
    }
}

impl ConfigStore for DynamoClient {
    fn query(&self, app: &str) -> Result<Vec<ConfigEntry>> {
        let signed = self.signed_scan(app)?;
        let headers = header_map(&signed)?;
        let url = signed.url().to_string();
        debug!(table = %self.table, %url, app, "scanning config table");

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .body(signed.into_body())
            .send()
            .map_err(|err| Error::query(&self.table, err))?;
        let status = response.status();
        let body = response
            .bytes()
            .map_err(|err| Error::query(&self.table, err))?;

        decode_scan(&self.table, status, &body)
    }
}

fn header_map(request: &SignedRequest) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in request.headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| Error::Signing(format!("invalid header name {name}: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| Error::Signing(format!("invalid value for {name}: {err}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn decode_scan(table: &str, status: StatusCode, body: &[u8]) -> Result<Vec<ConfigEntry>> {
    if !status.is_success() {
        let reason = describe_failure(status, body);
        warn!(table, %reason, "scan rejected by store");
        return Err(Error::query(table, reason));
    }

    let response: ScanResponse = serde_json::from_slice(body)
        .map_err(|err| Error::query(table, format!("malformed scan response: {err}")))?;
    if response.count != response.items.len() {
        return Err(Error::query(
            table,
            format!(
                "response count {} does not match {} returned items",
                response.count,
                response.items.len()
            ),
        ));
    }

    Ok(response
        .items
        .into_iter()
        .map(|item| ConfigEntry {
            name: item.name.s,
            value: item.value.s,
        })
        .collect())
}

fn describe_failure(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            kind: Some(kind),
            message,
        }) => {
            let kind = kind.rsplit('#').next().unwrap_or(&kind);
            match message {
                Some(message) => format!("status {status}: {kind}: {message}"),
                None => format!("status {status}: {kind}"),
            }
        }
        _ => {
            let text = String::from_utf8_lossy(body);
            let preview: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
            format!("status {status}: {preview}")
        }
    }
}
