#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const ROLE: &str = "adf-config";
pub const CREDENTIALS_JSON: &str = r#"{
  "Code": "Success",
  "LastUpdated": "2026-10-17T08:00:00Z",
  "Type": "AWS-HMAC",
  "AccessKeyId": "AKIAEXAMPLE",
  "SecretAccessKey": "secret",
  "Token": "tok",
  "Expiration": "2026-10-17T14:00:00Z"
}"#;
pub const TWO_ITEMS: &str = r#"{"Count":2,"Items":[{"Name":{"S":"host"},"Value":{"S":"a.example.com"}},{"Name":{"S":"port"},"Value":{"S":"8080"}}]}"#;
pub const NO_ITEMS: &str = r#"{"Count":0,"Items":[]}"#;

#[derive(Clone, Debug)]
pub struct CapturedScan {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl CapturedScan {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("scan body is json")
    }
}

/// Canned metadata-service and store responses.
#[derive(Clone, Debug)]
pub struct MockAws {
    credentials: String,
    zone: String,
    scan_status: StatusCode,
    scan_body: String,
}

impl Default for MockAws {
    fn default() -> Self {
        Self {
            credentials: CREDENTIALS_JSON.to_string(),
            zone: "us-west-2c".to_string(),
            scan_status: StatusCode::OK,
            scan_body: TWO_ITEMS.to_string(),
        }
    }
}

impl MockAws {
    pub fn credentials(mut self, body: &str) -> Self {
        self.credentials = body.to_string();
        self
    }

    pub fn zone(mut self, zone: &str) -> Self {
        self.zone = zone.to_string();
        self
    }

    pub fn scan_response(mut self, status: StatusCode, body: &str) -> Self {
        self.scan_status = status;
        self.scan_body = body.to_string();
        self
    }

    /// Serve on an ephemeral port from a background thread with its own runtime.
    pub fn spawn(self) -> MockServer {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind mock listener");
        listener
            .set_nonblocking(true)
            .expect("non-blocking mock listener");
        let addr = listener.local_addr().expect("mock listener address");

        let state = Arc::new(MockState {
            canned: self,
            scans: Mutex::new(Vec::new()),
        });
        let router = Router::new()
            .route(
                &format!("/latest/meta-data/iam/security-credentials/{ROLE}"),
                get(credentials),
            )
            .route("/latest/meta-data/placement/availability-zone", get(zone))
            .route("/", post(scan))
            .with_state(state.clone());

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("tokio mock listener");
                axum::serve(listener, router).await.expect("mock server");
            });
        });

        MockServer { addr, state }
    }
}

struct MockState {
    canned: MockAws,
    scans: Mutex<Vec<CapturedScan>>,
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn store_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn scans(&self) -> Vec<CapturedScan> {
        self.state.scans.lock().expect("scan log").clone()
    }
}

async fn credentials(State(state): State<Arc<MockState>>) -> String {
    state.canned.credentials.clone()
}

async fn zone(State(state): State<Arc<MockState>>) -> String {
    state.canned.zone.clone()
}

async fn scan(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    state.scans.lock().expect("scan log").push(CapturedScan {
        headers,
        body: body.to_vec(),
    });
    (
        state.canned.scan_status,
        [(header::CONTENT_TYPE, "application/x-amz-json-1.0")],
        state.canned.scan_body.clone(),
    )
}
