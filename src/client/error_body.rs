//! Human-readable messages from failed HTTP responses.
//!
//! Structured (JSON) bodies are probed for a message field in a fixed order;
//! anything else falls back to the raw body text, and an empty body falls
//! back to the status line. Extraction never fails.

use serde_json::Value;

/// Fields probed, in priority order, for an error message in a JSON body.
pub const MESSAGE_FIELDS: [&str; 3] = ["detail", "message", "error"];

/// Produce a readable message for a failed response.
///
/// - `content_type` is the raw `Content-Type` header value, if any.
/// - `status_text` is the reason phrase used in the last-resort fallback.
///
/// # Example
///
/// ```
/// use adk_client::client::extract_error_message;
///
/// let msg = extract_error_message(
///     404,
///     "Not Found",
///     Some("application/json"),
///     br#"{"detail": "Session not found"}"#,
/// );
/// assert_eq!(msg, "Session not found");
///
/// let msg = extract_error_message(502, "Bad Gateway", None, b"");
/// assert_eq!(msg, "HTTP 502: Bad Gateway");
/// ```
pub fn extract_error_message(
    status: u16,
    status_text: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> String {
    if content_type.is_some_and(is_json_content_type) {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => {
                if let Some(message) = message_from_value(&value) {
                    return message;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "error body is not valid JSON, using raw text");
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    format!("HTTP {status}: {status_text}")
}

/// Probe a JSON value for a message using [`MESSAGE_FIELDS`].
///
/// String values are returned as-is, nested objects are probed again (so
/// `{"error": {"message": "..."}}` yields the inner message), and other
/// values are rendered as compact JSON. Null and blank values are skipped.
pub fn message_from_value(value: &Value) -> Option<String> {
    MESSAGE_FIELDS
        .iter()
        .find_map(|field| value.get(field).and_then(render_field))
}

fn render_field(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => message_from_value(value).or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

/// Read a failed `reqwest` response and extract its message.
///
/// Body read failures are swallowed and treated as an empty body.
pub(crate) async fn from_response(response: reqwest::Response) -> String {
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await.unwrap_or_default();

    extract_error_message(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status"),
        content_type.as_deref(),
        &body,
    )
}
