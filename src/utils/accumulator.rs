//! Caller-side assembly of streamed text.
//!
//! [`EventStream`](crate::client::EventStream) yields every frame it decodes,
//! duplicates included. Consumers that want one growing message feed the
//! events through a [`TextAccumulator`].

use crate::types::{StreamEvent, StreamEventType};

/// Builds the assistant's reply from a sequence of [`StreamEvent`]s.
///
/// Rules:
/// - only `text` events with non-empty text are considered
/// - a text identical to the previous accepted one is skipped
/// - a complete event replaces the accumulated text, a partial one appends
///
/// # Example
///
/// ```
/// use adk_client::types::{StreamEvent, StreamEventType};
/// use adk_client::utils::TextAccumulator;
///
/// fn text_event(text: &str, is_complete: bool) -> StreamEvent {
///     StreamEvent {
///         id: String::new(),
///         timestamp: 0.0,
///         event_type: StreamEventType::Text,
///         text: Some(text.to_string()),
///         function_call: None,
///         function_response: None,
///         error: None,
///         author: None,
///         is_complete,
///     }
/// }
///
/// let mut acc = TextAccumulator::new();
/// acc.push(&text_event("Hel", false));
/// acc.push(&text_event("lo", false));
/// assert_eq!(acc.text(), "Hello");
/// acc.push(&text_event("Hello!", true));
/// assert_eq!(acc.text(), "Hello!");
/// assert!(acc.is_complete());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextAccumulator {
    text: String,
    last_seen: Option<String>,
    complete: bool,
}

impl TextAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. Returns `true` if the accumulated text changed.
    pub fn push(&mut self, event: &StreamEvent) -> bool {
        if event.is_complete {
            self.complete = true;
        }

        if event.event_type != StreamEventType::Text {
            return false;
        }
        let Some(text) = event.text.as_deref().filter(|t| !t.is_empty()) else {
            return false;
        };
        if self.last_seen.as_deref() == Some(text) {
            return false;
        }

        if event.is_complete {
            self.text = text.to_string();
        } else {
            self.text.push_str(text);
        }
        self.last_seen = Some(text.to_string());
        true
    }

    /// The text assembled so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether a complete event has been seen.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Consume the accumulator, returning the text.
    pub fn into_text(self) -> String {
        self.text
    }
}
