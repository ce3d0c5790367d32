//! # adk-client: async Rust client for ADK API servers
//!
//! Talks to an Agent Development Kit (ADK) API server over HTTP, in both
//! one-shot (`/run`) and streaming (`/run_sse`, Server-Sent Events) modes.
//!
//! This crate provides:
//! - **Session management** with an in-memory, read-through cache ([`client::SessionStore`])
//! - **Retry with exponential backoff** for unary calls ([`retry::RetryPolicy`])
//! - **An SSE parser** that turns a chunked byte stream into typed
//!   [`types::StreamEvent`]s ([`client::EventStream`])
//! - **A facade** tying it together ([`client::AdkClient`])
//!
//! ## Feature flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `client` | yes     | reqwest transport, session store, SSE stream and `AdkClient` |
//!
//! ## Quick Start
//!
//! ```no_run
//! use adk_client::client::AdkClient;
//! use adk_client::types::StreamEventType;
//! use adk_client::utils::TextAccumulator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AdkClient::from_env()?;
//!
//!     if !client.is_backend_ready().await {
//!         eprintln!("backend is not ready");
//!         return Ok(());
//!     }
//!
//!     let session = client.create_session("dealer_agent", None, None).await?;
//!     let mut stream = client
//!         .stream_run("dealer_agent", &session.user_id, &session.session_id, "Any SUVs?")
//!         .await?;
//!
//!     let mut reply = TextAccumulator::new();
//!     while let Some(event) = stream.next().await {
//!         let event = event?;
//!         if event.event_type == StreamEventType::Error {
//!             eprintln!("agent error: {:?}", event.error);
//!             break;
//!         }
//!         reply.push(&event);
//!         if event.is_complete {
//!             break;
//!         }
//!     }
//!     println!("{}", reply.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Endpoints
//!
//! - `GET /list-apps`
//! - `POST /apps/{app}/users/{user}/sessions/{session}`
//! - `GET /apps/{app}/users/{user}/sessions/{session}`
//! - `POST /run`
//! - `POST /run_sse`

pub mod builders;
pub mod config;
pub mod error;
pub mod retry;
pub mod types;
pub mod utils;

#[cfg(feature = "client")]
pub mod client;

/// Prelude module that re-exports commonly used types.
///
/// ```
/// use adk_client::prelude::*;
///
/// let content = Content::user_text("hello");
/// assert_eq!(content.parts, vec![Part::text("hello")]);
/// ```
pub mod prelude {
    pub use crate::types::{
        AgentRunRequest, Content, Event, FunctionCall, FunctionResponse, Part, Session,
        StreamEvent, StreamEventType,
    };

    pub use crate::builders::ClientBuilder;
    pub use crate::config::ClientConfig;
    pub use crate::error::{AdkError, AdkResult};
    pub use crate::retry::{with_retry, RetryPolicy};
    pub use crate::utils::TextAccumulator;

    #[cfg(feature = "client")]
    pub use crate::client::{AdkClient, EventStream, SessionStore};
}

pub use builders::ClientBuilder;
pub use config::ClientConfig;
pub use error::{AdkError, AdkResult};
pub use types::*;
