//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use adk_client::client::{ByteStream, Method, Transport};
use adk_client::error::{AdkError, AdkResult};
use adk_client::retry::RetryPolicy;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

/// Route crate logs to the test harness. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Retry policy with delays short enough for tests.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

// ============================================================================
// Mock transport
// ============================================================================

/// One call seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// `None` for stream calls (always POST).
    pub method: Option<Method>,
    pub path: String,
    pub body: Option<Value>,
    pub operation: String,
}

type SendHandler = dyn Fn(&RecordedCall) -> AdkResult<Value> + Send + Sync;
type StreamHandler = dyn Fn(&RecordedCall) -> AdkResult<Vec<String>> + Send + Sync;

/// Records calls and answers them with configurable handlers.
pub struct MockTransport {
    calls: Mutex<Vec<RecordedCall>>,
    on_send: Box<SendHandler>,
    on_stream: Box<StreamHandler>,
}

impl MockTransport {
    /// Unary calls return `{}`; streaming fails.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            on_send: Box::new(|_| Ok(json!({}))),
            on_stream: Box::new(|_| {
                Err(AdkError::Transport(
                    "mock: streaming not configured".to_string(),
                ))
            }),
        }
    }

    pub fn on_send(
        mut self,
        handler: impl Fn(&RecordedCall) -> AdkResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.on_send = Box::new(handler);
        self
    }

    /// The handler returns the body as a list of chunks.
    pub fn on_stream(
        mut self,
        handler: impl Fn(&RecordedCall) -> AdkResult<Vec<String>> + Send + Sync + 'static,
    ) -> Self {
        self.on_stream = Box::new(handler);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: RecordedCall) -> RecordedCall {
        self.calls.lock().unwrap().push(call.clone());
        call
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        operation: &str,
    ) -> AdkResult<Value> {
        let call = self.record(RecordedCall {
            method: Some(method),
            path: path.to_string(),
            body: body.cloned(),
            operation: operation.to_string(),
        });
        (self.on_send)(&call)
    }

    async fn stream(&self, path: &str, body: &Value, operation: &str) -> AdkResult<ByteStream> {
        let call = self.record(RecordedCall {
            method: None,
            path: path.to_string(),
            body: Some(body.clone()),
            operation: operation.to_string(),
        });
        let chunks = (self.on_stream)(&call)?;
        Ok(byte_stream(chunks))
    }
}

/// Turn string chunks into a [`ByteStream`].
pub fn byte_stream(chunks: Vec<String>) -> ByteStream {
    Box::pin(futures::stream::iter(
        chunks
            .into_iter()
            .map(|c| Ok(Bytes::from(c)))
            .collect::<Vec<AdkResult<Bytes>>>(),
    ))
}

// ============================================================================
// SSE payload helpers
// ============================================================================

/// A `data: ` line for an event with the given text parts.
pub fn text_frame(id: &str, text: &str, partial: bool, turn_complete: bool) -> String {
    let event = json!({
        "id": id,
        "timestamp": 1712345678.25,
        "author": "dealer_agent",
        "content": {"role": "model", "parts": [{"text": text}]},
        "partial": partial,
        "turnComplete": turn_complete,
    });
    format!("data: {}\n\n", event)
}

/// A `data: ` line carrying a backend error.
pub fn error_frame(message: &str) -> String {
    format!("data: {}\n\n", json!({ "error": message }))
}

/// A unary `/run` event with the given parts.
pub fn run_event(id: &str, parts: Value) -> Value {
    json!({
        "id": id,
        "timestamp": 1712345678.5,
        "author": "dealer_agent",
        "invocationId": "inv-1",
        "content": {"role": "model", "parts": parts},
    })
}

// ============================================================================
// In-process HTTP backend
// ============================================================================

/// Serve `router` on a random local port. Returns the base URL and the server task.
pub async fn start_backend(router: axum::Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Brief wait for the server to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (base_url, handle)
}

/// Shared hit counter for handlers.
#[derive(Clone, Default)]
pub struct Hits(Arc<std::sync::atomic::AtomicUsize>);

impl Hits {
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
