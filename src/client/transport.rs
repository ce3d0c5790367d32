//! Transport layer for ADK client communication.
//!
//! Provides the [`Transport`] trait for abstracting over how requests reach
//! the backend, and [`HttpTransport`], the `reqwest` implementation.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{AdkError, AdkResult};

use super::error_body;

/// A stream of raw body chunks, yielded as they arrive.
///
/// Dropping the stream releases the underlying connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = AdkResult<Bytes>> + Send>>;

/// HTTP method of a unary request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Transport abstraction for the ADK API server.
///
/// `operation` is a short human name (`"list apps"`, `"create session"`) used
/// to label the [`AdkError::Backend`] returned for non-2xx responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a unary request relative to the base URL.
    ///
    /// A successful body is returned parsed as JSON; a non-JSON body is
    /// returned as a JSON string and an empty body as `null`.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        operation: &str,
    ) -> AdkResult<Value>;

    /// POST `body` and return the response body as a chunk stream.
    async fn stream(&self, path: &str, body: &Value, operation: &str) -> AdkResult<ByteStream>;
}

/// `reqwest`-backed [`Transport`].
///
/// # Example
///
/// ```no_run
/// use adk_client::client::HttpTransport;
/// use adk_client::config::ClientConfig;
///
/// let transport = HttpTransport::new(ClientConfig::new("http://localhost:8002")).unwrap();
/// assert_eq!(transport.base_url(), "http://localhost:8002");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdkError::Config`] if a configured header is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> AdkResult<Self> {
        let mut default_headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| AdkError::Config(format!("invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AdkError::Config(format!("invalid value for header '{key}': {e}")))?;
            default_headers.insert(name, value);
        }

        // Per-read timeout only; it resets on every chunk so long streams survive.
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| AdkError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a transport with an existing `reqwest::Client`.
    ///
    /// Configured headers are not applied; set them on the client instead.
    pub fn with_client(config: ClientConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        operation: &str,
    ) -> AdkResult<Value> {
        let url = self.config.url(path);
        debug!(%method, %url, operation, "sending request");

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .header(ACCEPT, "application/json")
        .timeout(self.config.timeout);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_request_error(e, operation))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_body::from_response(response).await;
            debug!(status = status.as_u16(), operation, %message, "request failed");
            return Err(AdkError::backend(operation, status.as_u16(), message));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                AdkError::Timeout(format!("{operation}: reading response timed out: {e}"))
            } else {
                AdkError::Transport(format!("{operation}: failed to read response body: {e}"))
            }
        })?;

        Ok(parse_body(&bytes))
    }

    async fn stream(&self, path: &str, body: &Value, operation: &str) -> AdkResult<ByteStream> {
        let url = self.config.url(path);
        debug!(%url, operation, "opening stream");

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(body)
            .send()
            .await
            .map_err(|e| map_request_error(e, operation))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_body::from_response(response).await;
            return Err(AdkError::backend(operation, status.as_u16(), message));
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                if e.is_timeout() {
                    AdkError::Timeout(format!("SSE stream stalled: {e}"))
                } else {
                    AdkError::Transport(format!("error reading SSE stream: {e}"))
                }
            })
        });
        Ok(Box::pin(stream))
    }
}

fn map_request_error(e: reqwest::Error, operation: &str) -> AdkError {
    if e.is_timeout() {
        AdkError::Timeout(format!("{operation}: request timed out: {e}"))
    } else if e.is_connect() {
        AdkError::Transport(format!("{operation}: connection failed: {e}"))
    } else {
        AdkError::Transport(format!("{operation}: HTTP request failed: {e}"))
    }
}

/// Parse a success body: JSON if possible, otherwise the raw text.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
