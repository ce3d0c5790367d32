//! In-memory session cache with read-through fetch.
//!
//! Sessions are keyed by session id only. An entry, once cached, is served
//! without touching the network for the rest of the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AdkError, AdkResult};
use crate::retry::RetryPolicy;
use crate::types::{JsonMap, Session};

use super::transport::{Method, Transport};

/// Caches [`Session`]s and creates or fetches them through a [`Transport`].
///
/// Cloning is cheap and clones share the same cache.
#[derive(Clone)]
pub struct SessionStore {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an empty store.
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a session on the backend and cache it.
    ///
    /// A missing `user_id` becomes `u_<unix millis>`, a missing `session_id`
    /// a random UUID. The returned session always carries the app, user and
    /// session ids used for the request, whatever the backend echoed.
    pub async fn create(
        &self,
        app_name: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> AdkResult<Session> {
        self.create_with_state(app_name, user_id, session_id, None)
            .await
    }

    /// Like [`create`](Self::create), with an initial state map.
    pub async fn create_with_state(
        &self,
        app_name: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
        state: Option<JsonMap>,
    ) -> AdkResult<Session> {
        let user_id = user_id.map_or_else(generate_user_id, str::to_string);
        let session_id = session_id.map_or_else(generate_session_id, str::to_string);

        let path = session_path(app_name, &user_id, &session_id);
        let body = Value::Object(state.unwrap_or_default());

        let response = self
            .retry
            .run(|| {
                self.transport
                    .send(Method::Post, &path, Some(&body), "create session")
            })
            .await?;

        let session = Session::from_backend(response, app_name, &user_id, &session_id)
            .map_err(|e| decode_error("create session", e))?;
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), session.clone());

        debug!(app_name, user_id = %user_id, session_id = %session_id, "session created");
        Ok(session)
    }

    /// Return the cached session, or fetch, cache and return it.
    pub async fn get(&self, app_name: &str, user_id: &str, session_id: &str) -> AdkResult<Session> {
        if let Some(session) = self.cached(session_id).await {
            debug!(session_id, "session cache hit");
            return Ok(session);
        }

        let path = session_path(app_name, user_id, session_id);
        let response = self
            .retry
            .run(|| self.transport.send(Method::Get, &path, None, "get session"))
            .await?;

        let session = Session::from_backend(response, app_name, user_id, session_id)
            .map_err(|e| decode_error("get session", e))?;
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), session.clone());

        debug!(app_name, user_id, session_id, "session fetched");
        Ok(session)
    }

    /// The cached session with this id, if any. Never touches the network.
    pub async fn cached(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Number of cached sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// `/apps/{app}/users/{user}/sessions/{session}` with encoded segments.
pub(crate) fn session_path(app_name: &str, user_id: &str, session_id: &str) -> String {
    format!(
        "/apps/{}/users/{}/sessions/{}",
        urlencoding::encode(app_name),
        urlencoding::encode(user_id),
        urlencoding::encode(session_id)
    )
}

fn decode_error(operation: &str, err: serde_json::Error) -> AdkError {
    AdkError::InvalidJson(format!("Failed to {operation}: unexpected session body: {err}"))
}

fn generate_user_id() -> String {
    format!("u_{}", chrono::Utc::now().timestamp_millis())
}

fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
