//! Error types for the ADK client.
//!
//! Every failure path of the client ends in one of these variants, each
//! carrying a human-readable message:
//! - network-level failures ([`AdkError::Transport`], [`AdkError::Timeout`])
//! - non-2xx responses from the backend ([`AdkError::Backend`])
//! - bodies that do not decode to the expected shape ([`AdkError::InvalidJson`])
//! - logical errors reported inside an SSE stream ([`AdkError::Agent`])

/// Unified error type for all client operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdkError {
    /// Transport-level error (connection refused, DNS, body read failure, etc.).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request or stream timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The backend answered with a non-2xx status.
    ///
    /// `message` is the text produced by
    /// [`extract_error_message`](crate::client::extract_error_message).
    #[error("Failed to {operation}: {message}")]
    Backend {
        /// Short name of the failed operation, e.g. `"create session"`.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Human-readable message extracted from the response.
        message: String,
    },

    /// A success body could not be decoded into the expected type.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The agent reported an error inside an otherwise successful stream.
    #[error("Agent error: {0}")]
    Agent(String),

    /// Invalid client configuration (base URL, headers).
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience result type for client operations.
pub type AdkResult<T> = Result<T, AdkError>;

impl AdkError {
    /// Create a [`AdkError::Backend`] for the given operation.
    pub fn backend(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code if this error came from a backend response.
    pub fn status(&self) -> Option<u16> {
        match self {
            AdkError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for errors raised before any response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, AdkError::Transport(_) | AdkError::Timeout(_))
    }
}

impl From<serde_json::Error> for AdkError {
    fn from(err: serde_json::Error) -> Self {
        AdkError::InvalidJson(err.to_string())
    }
}
