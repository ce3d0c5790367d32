//! Server-Sent Events parsing for `/run_sse` responses.
//!
//! Three layers, usable separately:
//! - [`SseLineDecoder`] reassembles newline-terminated lines from arbitrarily
//!   split byte chunks
//! - [`parse_frame`] turns one line into a [`Frame`]
//! - [`EventStream`] drives both over a [`ByteStream`] and yields
//!   [`StreamEvent`]s on demand
//!
//! The stream is pull-based: nothing is read from the connection unless the
//! consumer polls, and the connection is released as soon as the stream ends,
//! hits `[DONE]` or an error frame, or the [`EventStream`] is dropped.
//!
//! Events are not de-duplicated here; see
//! [`TextAccumulator`](crate::utils::TextAccumulator).

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{FusedStream, Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AdkResult;
use crate::types::{string_or_empty, Event, Part, StreamEvent, StreamEventType};
use crate::utils::{first_function_call, first_function_response, has_text, stream_text};

use super::error_body::message_from_value;
use super::transport::ByteStream;

/// Prefix of an SSE data line.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that terminates the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Reassembles lines from a chunked byte stream.
///
/// Buffering is done on bytes, so a multi-byte UTF-8 character split across
/// two chunks is decoded correctly. A trailing `\r` is stripped from each line.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every line completed by it.
    ///
    /// Bytes after the last newline stay buffered for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let line = &self.buffer[start..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
        }
        self.buffer.drain(..start);

        lines
    }

    /// Bytes received after the last newline.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

/// One classified SSE line.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Not a `data: ` line (blank separator, comment, `event:`/`id:` field).
    Ignore,
    /// The `[DONE]` sentinel.
    Done,
    /// A `data: ` line whose payload is not JSON, or not shaped like an event.
    Malformed(String),
    /// A decoded, normalized event.
    Event(StreamEvent),
}

/// Classify a single line.
///
/// # Example
///
/// ```
/// use adk_client::client::{parse_frame, Frame};
/// use adk_client::types::StreamEventType;
///
/// assert_eq!(parse_frame("data: [DONE]"), Frame::Done);
/// assert_eq!(parse_frame(": keepalive"), Frame::Ignore);
///
/// match parse_frame(r#"data: {"id":"e1","content":{"parts":[{"text":"Hi"}]}}"#) {
///     Frame::Event(event) => {
///         assert_eq!(event.event_type, StreamEventType::Text);
///         assert_eq!(event.text.as_deref(), Some("Hi"));
///     }
///     other => panic!("unexpected frame: {other:?}"),
/// }
/// ```
pub fn parse_frame(line: &str) -> Frame {
    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignore;
    };

    if data.trim() == DONE_SENTINEL {
        return Frame::Done;
    }

    let payload: Value = match serde_json::from_str(data) {
        Ok(payload) => payload,
        Err(e) => return Frame::Malformed(format!("failed to parse SSE event data: {e}")),
    };

    // An error is reported whatever shape the rest of the envelope has.
    if let Some(error) = payload.get("error").filter(|v| !v.is_null()) {
        return Frame::Event(error_event(&payload, error));
    }

    match serde_json::from_value::<Event>(payload) {
        Ok(event) => Frame::Event(normalize_event(&event)),
        Err(e) => Frame::Malformed(format!("unexpected SSE event shape: {e}")),
    }
}

fn error_event(payload: &Value, error: &Value) -> StreamEvent {
    let flag = |key: &str| payload.get(key).and_then(Value::as_bool).unwrap_or(false);
    StreamEvent {
        id: payload.get("id").map(string_or_empty).unwrap_or_default(),
        timestamp: payload
            .get("timestamp")
            .and_then(Value::as_f64)
            .unwrap_or_default(),
        event_type: StreamEventType::Error,
        text: None,
        function_call: None,
        function_response: None,
        error: Some(error_message(error)),
        author: payload.get("author").and_then(Value::as_str).map(str::to_string),
        is_complete: !flag("partial") && flag("turnComplete"),
    }
}

fn error_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => message_from_value(other).unwrap_or_else(|| other.to_string()),
    }
}

/// Project a raw backend event onto a [`StreamEvent`].
///
/// Type priority: error, thought, function call, function response, text,
/// unknown. `is_complete` requires the event to be non-partial *and* to mark
/// the turn complete.
pub fn normalize_event(event: &Event) -> StreamEvent {
    let parts = event.parts();
    let text = stream_text(parts);

    let error = event
        .error
        .as_ref()
        .filter(|v| !v.is_null())
        .map(error_message);

    let event_type = if error.is_some() {
        StreamEventType::Error
    } else {
        classify(parts)
    };

    StreamEvent {
        id: event.id.clone(),
        timestamp: event.timestamp,
        event_type,
        text: (!text.is_empty()).then_some(text),
        function_call: first_function_call(parts).cloned(),
        function_response: first_function_response(parts).cloned(),
        error,
        author: event.author.clone(),
        is_complete: !event.partial.unwrap_or(false) && event.turn_complete.unwrap_or(false),
    }
}

fn classify(parts: &[Part]) -> StreamEventType {
    if parts.iter().any(Part::is_thought) {
        StreamEventType::Thought
    } else if first_function_call(parts).is_some() {
        StreamEventType::FunctionCall
    } else if first_function_response(parts).is_some() {
        StreamEventType::FunctionResponse
    } else if has_text(parts) {
        StreamEventType::Text
    } else {
        StreamEventType::Unknown
    }
}

/// A lazy, forward-only stream of [`StreamEvent`]s decoded from a byte stream.
///
/// Ends after `[DONE]`, after yielding an `error` event, after a transport
/// error (yielded once as `Err`), or when the body ends. Only
/// newline-terminated lines are processed; a dangling partial line at the end
/// of the body is discarded.
///
/// # Example
///
/// ```no_run
/// # async fn example(mut stream: adk_client::client::EventStream) {
/// while let Some(event) = stream.next().await {
///     match event {
///         Ok(event) if event.is_complete => break,
///         Ok(event) => println!("{}: {:?}", event.event_type, event.text),
///         Err(e) => eprintln!("stream error: {e}"),
///     }
/// }
/// # }
/// ```
pub struct EventStream {
    body: Option<ByteStream>,
    decoder: SseLineDecoder,
    lines: VecDeque<String>,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("open", &self.body.is_some())
            .field("queued_lines", &self.lines.len())
            .finish_non_exhaustive()
    }
}

impl EventStream {
    /// Wrap a raw body stream.
    pub fn new(body: ByteStream) -> Self {
        Self {
            body: Some(body),
            decoder: SseLineDecoder::new(),
            lines: VecDeque::new(),
        }
    }

    /// Get the next event, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<AdkResult<StreamEvent>> {
        StreamExt::next(self).await
    }

    /// Whether the underlying connection is still held.
    pub fn is_open(&self) -> bool {
        self.body.is_some()
    }

    fn close(&mut self) {
        if self.body.take().is_some() {
            debug!("SSE stream closed");
        }
        self.lines.clear();
    }
}

impl Stream for EventStream {
    type Item = AdkResult<StreamEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            while let Some(line) = this.lines.pop_front() {
                match parse_frame(&line) {
                    Frame::Ignore => {}
                    Frame::Done => {
                        debug!("received [DONE] sentinel");
                        this.close();
                        return Poll::Ready(None);
                    }
                    Frame::Malformed(reason) => {
                        warn!(%reason, %line, "skipping malformed SSE frame");
                    }
                    Frame::Event(event) => {
                        if event.event_type == StreamEventType::Error {
                            warn!(error = ?event.error, "backend reported an error, ending stream");
                            this.close();
                        }
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
            }

            let Some(body) = this.body.as_mut() else {
                return Poll::Ready(None);
            };

            match body.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => {
                    let lines = this.decoder.feed(&chunk);
                    this.lines.extend(lines);
                }
                Poll::Ready(Some(Err(e))) => {
                    this.close();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    if !this.decoder.pending().is_empty() {
                        debug!(
                            bytes = this.decoder.pending().len(),
                            "discarding unterminated trailing line"
                        );
                    }
                    this.close();
                }
            }
        }
    }
}

impl FusedStream for EventStream {
    fn is_terminated(&self) -> bool {
        self.body.is_none() && self.lines.is_empty()
    }
}
