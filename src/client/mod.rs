//! ADK client: talk to an ADK API server.
//!
//! - [`AdkClient`]: app discovery, sessions, unary and streaming runs
//! - [`SessionStore`]: in-memory session cache with read-through fetch
//! - [`Transport`] / [`HttpTransport`]: pluggable transport layer
//! - [`EventStream`]: parsed SSE stream of [`StreamEvent`](crate::types::StreamEvent)s
//! - [`extract_error_message`]: readable messages from failed responses
//!
//! # Quick Start
//!
//! ```no_run
//! use adk_client::client::AdkClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AdkClient::from_env()?;
//!
//! if let Some(session) = client.initialize("dealer_agent", None).await? {
//!     let reply = client
//!         .send_message(&session.app_name, &session.user_id, &session.session_id, "Hello")
//!         .await?;
//!     println!("{reply}");
//! }
//! # Ok(())
//! # }
//! ```

mod adk_client;
mod error_body;
mod sessions;
mod sse;
mod transport;

pub use adk_client::AdkClient;
pub use error_body::{extract_error_message, message_from_value, MESSAGE_FIELDS};
pub use sessions::SessionStore;
pub use sse::{
    normalize_event, parse_frame, EventStream, Frame, SseLineDecoder, DATA_PREFIX, DONE_SENTINEL,
};
pub use transport::{ByteStream, HttpTransport, Method, Transport};
