//! ADK API server types.
//!
//! Wire format follows the ADK web server JSON (camelCase keys). Types that
//! the backend sends as flat objects with optional payload fields (notably
//! [`Part`]) are modelled as sum types with hand-written serde impls, so a
//! value can never carry two payloads at once.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// JSON object with string keys, used for session state and call arguments.
pub type JsonMap = Map<String, Value>;

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<JsonMap, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<JsonMap>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(string_or_empty(&Value::deserialize(deserializer)?))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_f64().unwrap_or_default())
}

/// A string value as-is, a number rendered as text, anything else `""`.
pub(crate) fn string_or_empty(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

// ============================================================================
// Content & Parts
// ============================================================================

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Call identifier, when the backend assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the function to call.
    pub name: String,
    /// Call arguments.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub args: JsonMap,
}

/// The result of a function call, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Identifier of the call this responds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the function that was called.
    pub name: String,
    /// Function result.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub response: JsonMap,
}

/// A single unit of content.
///
/// JSON wire format:
/// - Text: `{"text": "hello"}`
/// - Thought: `{"thought": true, "text": "reasoning..."}`
/// - Function call: `{"functionCall": {"name": "lookup", "args": {...}}}`
/// - Function response: `{"functionResponse": {"name": "lookup", "response": {...}}}`
///
/// A wire part flagged `"thought": true` is always a [`Part::Thought`], even
/// when it also carries text. Objects with none of the known payloads are
/// kept verbatim as [`Part::Other`].
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// Reasoning trace emitted by a thinking model.
    Thought {
        /// Reasoning text, if the backend included it.
        text: Option<String>,
    },
    /// A function call request.
    FunctionCall(FunctionCall),
    /// A function call result.
    FunctionResponse(FunctionResponse),
    /// A part kind this client does not interpret (inline data, code execution, ...).
    Other(JsonMap),
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Create a function call part.
    pub fn function_call(name: impl Into<String>, args: JsonMap) -> Self {
        Part::FunctionCall(FunctionCall {
            id: None,
            name: name.into(),
            args,
        })
    }

    /// Create a function response part.
    pub fn function_response(name: impl Into<String>, response: JsonMap) -> Self {
        Part::FunctionResponse(FunctionResponse {
            id: None,
            name: name.into(),
            response,
        })
    }

    /// Returns `true` for reasoning-trace parts.
    pub fn is_thought(&self) -> bool {
        matches!(self, Part::Thought { .. })
    }

    /// Returns the text of a non-thought text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }
}

impl Serialize for Part {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = JsonMap::new();
        match self {
            Part::Text { text } => {
                map.insert("text".into(), Value::String(text.clone()));
            }
            Part::Thought { text } => {
                map.insert("thought".into(), Value::Bool(true));
                if let Some(text) = text {
                    map.insert("text".into(), Value::String(text.clone()));
                }
            }
            Part::FunctionCall(call) => {
                let value = serde_json::to_value(call).map_err(serde::ser::Error::custom)?;
                map.insert("functionCall".into(), value);
            }
            Part::FunctionResponse(resp) => {
                let value = serde_json::to_value(resp).map_err(serde::ser::Error::custom)?;
                map.insert("functionResponse".into(), value);
            }
            Part::Other(other) => return other.serialize(serializer),
        }
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Part {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = JsonMap::deserialize(deserializer)?;

        let text = map.get("text").and_then(Value::as_str).map(str::to_string);

        if map.get("thought").and_then(Value::as_bool) == Some(true) {
            return Ok(Part::Thought { text });
        }

        if let Some(call) = map.remove("functionCall").filter(|v| !v.is_null()) {
            let call: FunctionCall =
                serde_json::from_value(call).map_err(serde::de::Error::custom)?;
            return Ok(Part::FunctionCall(call));
        }

        if let Some(resp) = map.remove("functionResponse").filter(|v| !v.is_null()) {
            let resp: FunctionResponse =
                serde_json::from_value(resp).map_err(serde::de::Error::custom)?;
            return Ok(Part::FunctionResponse(resp));
        }

        match text {
            Some(text) => Ok(Part::Text { text }),
            None => Ok(Part::Other(map)),
        }
    }
}

fn default_role() -> String {
    "user".to_string()
}

/// A single turn submitted to or received from the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Author role, `"user"` unless the backend says otherwise (e.g. `"model"`).
    #[serde(default = "default_role")]
    pub role: String,

    /// Ordered content parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Wrap plain text as a single user-role text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: default_role(),
            parts: vec![Part::text(text)],
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// A conversation context identified by the app/user/session triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session identifier. The backend may send it as `id`.
    #[serde(alias = "id")]
    pub session_id: String,

    /// Owning user.
    pub user_id: String,

    /// Owning application.
    pub app_name: String,

    /// Creation timestamp, as supplied by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Last update timestamp, as supplied by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Opaque session state.
    #[serde(default)]
    pub state: JsonMap,

    /// Any other fields the backend returned (events, lastUpdateTime, ...).
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Session {
    /// Build a session from a backend response, writing the identifiers the
    /// caller already knows over whatever the backend sent.
    ///
    /// A non-object body (e.g. `null`) is treated as `{}`.
    pub fn from_backend(
        body: Value,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Self, serde_json::Error> {
        let mut map = match body {
            Value::Object(map) => map,
            _ => JsonMap::new(),
        };

        map.remove("id");
        if map.get("state").is_some_and(Value::is_null) {
            map.remove("state");
        }
        map.insert("appName".into(), Value::String(app_name.to_string()));
        map.insert("userId".into(), Value::String(user_id.to_string()));
        map.insert("sessionId".into(), Value::String(session_id.to_string()));

        serde_json::from_value(Value::Object(map))
    }
}

// ============================================================================
// Run requests & events
// ============================================================================

/// Request body for `POST /run` and `POST /run_sse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunRequest {
    /// Target application.
    pub app_name: String,
    /// User the session belongs to.
    pub user_id: String,
    /// Session to run in.
    pub session_id: String,
    /// The user turn to submit.
    pub new_message: Content,
    /// Request token-level streaming (SSE endpoint only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    /// State changes to apply before running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_delta: Option<JsonMap>,
}

impl AgentRunRequest {
    /// Build a request carrying a single user text message.
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            new_message: Content::user_text(message),
            streaming: None,
            state_delta: None,
        }
    }
}

/// An event envelope returned by `/run`, and the payload of each `/run_sse` frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier. Numeric ids are kept as text; anything else is `""`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,

    /// Seconds since the epoch, as a float. `0.0` unless the backend sent a number.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub timestamp: f64,

    /// Content produced by this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    /// Agent (or `"user"`) that produced the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Invocation this event belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,

    /// Opaque side-effect actions (state delta, transfers, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,

    /// Opaque token usage metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<Value>,

    /// Set on in-progress streaming increments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,

    /// Set when the agent's turn is finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_complete: Option<bool>,

    /// Logical error reported by the backend inside a stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Event {
    /// Parts of this event's content, or an empty slice.
    pub fn parts(&self) -> &[Part] {
        self.content
            .as_ref()
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }
}

// ============================================================================
// Stream events
// ============================================================================

/// Classification of a streamed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    /// Plain assistant text.
    Text,
    /// Reasoning trace.
    Thought,
    /// The model requested a function call.
    FunctionCall,
    /// A function call result.
    FunctionResponse,
    /// The backend reported an error; the stream ends here.
    Error,
    /// Nothing recognisable in the frame.
    Unknown,
}

impl fmt::Display for StreamEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamEventType::Text => "text",
            StreamEventType::Thought => "thought",
            StreamEventType::FunctionCall => "function_call",
            StreamEventType::FunctionResponse => "function_response",
            StreamEventType::Error => "error",
            StreamEventType::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Normalized projection of one `/run_sse` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    /// Identifier of the underlying event.
    pub id: String,

    /// Timestamp of the underlying event.
    pub timestamp: f64,

    /// Classified frame type.
    #[serde(rename = "type")]
    pub event_type: StreamEventType,

    /// Concatenated non-thought text of the frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// First function call in the frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    /// First function response in the frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,

    /// Error message, for `error` frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Agent that produced the frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// `true` only for a non-partial frame that also marks the turn complete.
    pub is_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn thought_flag_wins_over_text() {
        let part: Part = serde_json::from_value(json!({"thought": true, "text": "hmm"})).unwrap();
        assert_eq!(
            part,
            Part::Thought {
                text: Some("hmm".to_string())
            }
        );
    }

    #[test]
    fn unknown_part_is_preserved() {
        let raw = json!({"inlineData": {"mimeType": "image/png", "data": "AAAA"}});
        let part: Part = serde_json::from_value(raw.clone()).unwrap();
        assert!(matches!(part, Part::Other(_)));
        assert_eq!(serde_json::to_value(&part).unwrap(), raw);
    }

    #[test]
    fn function_call_part_wire_format() {
        let part: Part = serde_json::from_value(json!({
            "functionCall": {"name": "find_car", "args": {"make": "Volvo"}}
        }))
        .unwrap();
        match &part {
            Part::FunctionCall(call) => {
                assert_eq!(call.name, "find_car");
                assert_eq!(call.args["make"], "Volvo");
            }
            other => panic!("expected function call, got {other:?}"),
        }
        let back = serde_json::to_value(&part).unwrap();
        assert_eq!(back["functionCall"]["name"], "find_car");
    }

    #[test]
    fn null_args_and_response_become_empty_maps() {
        let call: FunctionCall =
            serde_json::from_value(json!({"name": "f", "args": null})).unwrap();
        assert!(call.args.is_empty());

        let resp: FunctionResponse =
            serde_json::from_value(json!({"name": "f", "response": null})).unwrap();
        assert!(resp.response.is_empty());
    }

    #[test]
    fn event_envelope_tolerates_odd_id_and_timestamp() {
        let event: Event = serde_json::from_value(json!({
            "id": null,
            "timestamp": "2024-05-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(event.id, "");
        assert_eq!(event.timestamp, 0.0);

        let event: Event = serde_json::from_value(json!({"id": 42, "timestamp": 1.5})).unwrap();
        assert_eq!(event.id, "42");
        assert_eq!(event.timestamp, 1.5);
    }

    #[test]
    fn content_role_defaults_to_user() {
        let content: Content = serde_json::from_value(json!({"parts": [{"text": "hi"}]})).unwrap();
        assert_eq!(content.role, "user");
        assert_eq!(content.parts, vec![Part::text("hi")]);
    }

    #[test]
    fn session_from_empty_backend_body() {
        let session = Session::from_backend(json!({}), "dealer_agent", "u1", "s1").unwrap();
        assert_eq!(session.app_name, "dealer_agent");
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.session_id, "s1");
        assert!(session.state.is_empty());
    }

    #[test]
    fn session_known_ids_override_backend() {
        let body = json!({
            "id": "server-side",
            "appName": "other",
            "userId": "u1",
            "state": null,
            "lastUpdateTime": 1712345678.5
        });
        let session = Session::from_backend(body, "dealer_agent", "u1", "s1").unwrap();
        assert_eq!(session.session_id, "s1");
        assert_eq!(session.app_name, "dealer_agent");
        assert_eq!(session.extra["lastUpdateTime"], json!(1712345678.5));
    }

    #[test]
    fn run_request_skips_unset_fields() {
        let req = AgentRunRequest::new("app", "u", "s", "hello");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["newMessage"]["role"], "user");
        assert_eq!(value["newMessage"]["parts"][0]["text"], "hello");
        assert!(value.get("streaming").is_none());
        assert!(value.get("stateDelta").is_none());
    }

    #[test]
    fn stream_event_type_display_matches_serde() {
        for ty in [
            StreamEventType::Text,
            StreamEventType::Thought,
            StreamEventType::FunctionCall,
            StreamEventType::FunctionResponse,
            StreamEventType::Error,
            StreamEventType::Unknown,
        ] {
            assert_eq!(serde_json::to_value(ty).unwrap(), json!(ty.to_string()));
        }
    }
}
