//! High-level client for an ADK API server.
//!
//! Composes the transport, retry policy, session store and SSE parser into
//! the operations a chat front end needs.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{AdkError, AdkResult};
use crate::retry::RetryPolicy;
use crate::types::{AgentRunRequest, Content, Event, Part, Session, StreamEventType};
use crate::utils::{self, TextAccumulator};

use super::sessions::SessionStore;
use super::sse::EventStream;
use super::transport::{HttpTransport, Method, Transport};

/// Client for an ADK API server.
///
/// Unary operations are retried according to the configured
/// [`RetryPolicy`]; streaming is never retried.
///
/// # Example
///
/// ```no_run
/// use adk_client::client::AdkClient;
/// use adk_client::config::ClientConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AdkClient::new(ClientConfig::new("http://localhost:8002"))?;
///
/// let apps = client.list_apps().await?;
/// let session = client.create_session(&apps[0], None, None).await?;
///
/// let mut stream = client
///     .stream_run(&session.app_name, &session.user_id, &session.session_id, "Hi!")
///     .await?;
/// while let Some(event) = stream.next().await {
///     let event = event?;
///     if let Some(text) = &event.text {
///         print!("{text}");
///     }
///     if event.is_complete {
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AdkClient {
    transport: Arc<dyn Transport>,
    sessions: SessionStore,
    retry: RetryPolicy,
}

impl std::fmt::Debug for AdkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdkClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl AdkClient {
    /// Create a client using [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`AdkError::Config`] if the configuration is invalid.
    pub fn new(config: ClientConfig) -> AdkResult<Self> {
        let retry = config.retry;
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), retry))
    }

    /// Create a client configured from the environment
    /// (see [`ClientConfig::from_env`]).
    pub fn from_env() -> AdkResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Create a client with a custom transport.
    pub fn with_transport(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self {
            sessions: SessionStore::new(transport.clone(), retry),
            transport,
            retry,
        }
    }

    /// The session cache used by this client.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    // ──────────────────────────────────────────────────
    // Backend discovery
    // ──────────────────────────────────────────────────

    /// List the applications served by the backend (`GET /list-apps`).
    pub async fn list_apps(&self) -> AdkResult<Vec<String>> {
        let value = self
            .retry
            .run(|| self.transport.send(Method::Get, "/list-apps", None, "list apps"))
            .await?;
        decode(value, "app list")
    }

    /// `true` iff the backend lists at least one application.
    ///
    /// Never fails; any error counts as "not ready".
    pub async fn is_backend_ready(&self) -> bool {
        match self.list_apps().await {
            Ok(apps) => !apps.is_empty(),
            Err(e) => {
                debug!(error = %e, "backend not ready");
                false
            }
        }
    }

    // ──────────────────────────────────────────────────
    // Sessions
    // ──────────────────────────────────────────────────

    /// Create a session. See [`SessionStore::create`].
    pub async fn create_session(
        &self,
        app_name: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> AdkResult<Session> {
        self.sessions.create(app_name, user_id, session_id).await
    }

    /// Get a session, from cache when possible. See [`SessionStore::get`].
    pub async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> AdkResult<Session> {
        self.sessions.get(app_name, user_id, session_id).await
    }

    /// Check readiness, then create a session.
    ///
    /// Returns `Ok(None)` when the backend is not ready; session creation
    /// errors are returned as-is.
    pub async fn initialize(
        &self,
        app_name: &str,
        user_id: Option<&str>,
    ) -> AdkResult<Option<Session>> {
        if !self.is_backend_ready().await {
            return Ok(None);
        }
        self.create_session(app_name, user_id, None).await.map(Some)
    }

    // ──────────────────────────────────────────────────
    // Running the agent
    // ──────────────────────────────────────────────────

    /// Run the agent to completion (`POST /run`) and return all events.
    pub async fn run_agent(&self, request: &AgentRunRequest) -> AdkResult<Vec<Event>> {
        let body = serde_json::to_value(request)?;
        let value = self
            .retry
            .run(|| {
                self.transport
                    .send(Method::Post, "/run", Some(&body), "run agent")
            })
            .await?;
        decode(value, "run events")
    }

    /// Stream a reply to `message` (`POST /run_sse`).
    ///
    /// Failing to open the stream is returned immediately, without retry.
    pub async fn stream_run(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> AdkResult<EventStream> {
        let request = AgentRunRequest::new(app_name, user_id, session_id, message);
        self.stream_request(request).await
    }

    /// Stream a reply for an arbitrary request. `streaming` is forced on.
    pub async fn stream_request(&self, mut request: AgentRunRequest) -> AdkResult<EventStream> {
        request.streaming = Some(true);
        let body = serde_json::to_value(&request)?;
        let bytes = self
            .transport
            .stream("/run_sse", &body, "run agent streaming")
            .await?;
        Ok(EventStream::new(bytes))
    }

    /// Send `message` and return the assistant's final reply text.
    ///
    /// Streams first, assembling text with a [`TextAccumulator`] and stopping
    /// at the first complete event. If streaming fails for any reason (setup,
    /// transport, or an `error` event) the message is re-sent through
    /// [`run_agent`](Self::run_agent) and the reply is the
    /// [`extract_final_text`](Self::extract_final_text) of the last event.
    ///
    /// Returns an empty string if the agent produced no text.
    pub async fn send_message(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> AdkResult<String> {
        match self
            .stream_reply(app_name, user_id, session_id, message)
            .await
        {
            Ok(text) => Ok(text),
            Err(err) => {
                warn!(error = %err, "streaming failed, falling back to unary run");
                let request = AgentRunRequest::new(app_name, user_id, session_id, message);
                let events = self.run_agent(&request).await?;
                Ok(events
                    .last()
                    .map(|event| Self::extract_final_text(event.parts()))
                    .unwrap_or_default())
            }
        }
    }

    async fn stream_reply(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> AdkResult<String> {
        let mut stream = self
            .stream_run(app_name, user_id, session_id, message)
            .await?;
        let mut reply = TextAccumulator::new();

        while let Some(event) = stream.next().await {
            let event = event?;
            match event.event_type {
                StreamEventType::Error => {
                    return Err(AdkError::Agent(
                        event.error.unwrap_or_else(|| "unknown agent error".to_string()),
                    ));
                }
                StreamEventType::FunctionCall => {
                    debug!(call = ?event.function_call, "agent requested function call");
                }
                StreamEventType::FunctionResponse => {
                    debug!(response = ?event.function_response, "function call returned");
                }
                _ => {}
            }

            reply.push(&event);
            if event.is_complete {
                break;
            }
        }

        Ok(reply.into_text())
    }

    // ──────────────────────────────────────────────────
    // Content helpers
    // ──────────────────────────────────────────────────

    /// The text of the last non-thought text part, or `""`.
    ///
    /// Unlike the streaming text extraction, earlier text parts are dropped.
    pub fn extract_final_text(parts: &[Part]) -> String {
        utils::extract_final_text(parts)
    }

    /// Wrap plain text as a single user-role text part.
    pub fn build_content(text: &str) -> Content {
        utils::build_content(text)
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> AdkResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AdkError::InvalidJson(format!("failed to parse {what}: {e}")))
}
