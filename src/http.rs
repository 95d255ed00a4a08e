use reqwest::{header::HeaderMap, Client, Method, Response, StatusCode};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{self, Handle, Runtime, RuntimeFlavor};

use crate::errors::{Error, Result};

/// Builder for [`Http`] clients.
#[derive(Clone, Debug, Default)]
pub struct HttpBuilder {
    timeout: Option<Duration>,
}

impl HttpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-request timeout. Left unset, requests wait as long as the transport does.
    pub fn timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout = duration;
        self
    }

    pub fn build(self) -> Result<Http> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .user_agent(concat!("adf-config/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Http::from_builder(builder)
    }
}

/// Blocking facade over the async reqwest client.
///
/// Each instance owns a current-thread runtime that drives one request at a
/// time. Callers already inside a tokio runtime are supported: a multi-thread
/// worker blocks in place, a current-thread runtime hands the wait to a scoped
/// thread.
#[derive(Clone, Debug)]
pub struct Http {
    client: Client,
    runtime: Arc<Driver>,
}

impl Http {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        Self::builder().timeout(timeout).build()
    }

    pub fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| Error::Client(format!("runtime: {err}")))?;
        let client = builder
            .build()
            .map_err(|err| Error::Client(err.to_string()))?;
        Ok(Self {
            client,
            runtime: Arc::new(Driver(Some(runtime))),
        })
    }

    pub fn builder() -> HttpBuilder {
        HttpBuilder::new()
    }

    pub fn request(&self, method: Method, url: impl AsRef<str>) -> HttpRequest {
        HttpRequest {
            builder: self.client.request(method, url.as_ref()),
            runtime: Arc::clone(&self.runtime),
        }
    }

    pub fn get(&self, url: impl AsRef<str>) -> HttpRequest {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: impl AsRef<str>) -> HttpRequest {
        self.request(Method::POST, url)
    }
}

pub struct HttpRequest {
    builder: reqwest::RequestBuilder,
    runtime: Arc<Driver>,
}

impl HttpRequest {
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.builder = self.builder.headers(headers);
        self
    }

    pub fn body(mut self, value: impl Into<reqwest::Body>) -> Self {
        self.builder = self.builder.body(value);
        self
    }

    pub fn send(self) -> reqwest::Result<HttpResponse> {
        let inner = self.runtime.block_on(self.builder.send())?;
        Ok(HttpResponse {
            inner,
            runtime: self.runtime,
        })
    }
}

pub struct HttpResponse {
    inner: Response,
    runtime: Arc<Driver>,
}

impl HttpResponse {
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Read the whole body. The connection is released once this returns.
    pub fn bytes(self) -> reqwest::Result<Vec<u8>> {
        let body = self.runtime.block_on(self.inner.bytes())?;
        Ok(body.to_vec())
    }
}

/// Owned runtime that can be dropped from async code.
#[derive(Debug)]
struct Driver(Option<Runtime>);

impl Driver {
    fn block_on<F>(&self, fut: F) -> F::Output
    where
        F: Future + Send,
        F::Output: Send,
    {
        let runtime = self.0.as_ref().expect("runtime present until drop");
        match Handle::try_current() {
            Err(_) => runtime.block_on(fut),
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| runtime.block_on(fut))
            }
            Ok(_) => std::thread::scope(|scope| {
                scope
                    .spawn(|| runtime.block_on(fut))
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            }),
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}
