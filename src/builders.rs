//! Builder for ergonomic client construction.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::retry::RetryPolicy;

/// Builder for [`AdkClient`](crate::client::AdkClient).
///
/// # Example
///
/// ```no_run
/// use adk_client::builders::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ClientBuilder::new("http://localhost:8002")
///     .with_timeout(Duration::from_secs(30))
///     .with_retry(5, Duration::from_millis(250))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    url: String,
    timeout: Option<Duration>,
    headers: HashMap<String, String>,
    retry: Option<RetryPolicy>,
}

impl ClientBuilder {
    /// Create a new client builder for the given base URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: None,
            headers: HashMap::new(),
            retry: None,
        }
    }

    /// Start from an existing configuration's base URL and settings.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            url: config.base_url,
            timeout: Some(config.timeout),
            headers: config.headers,
            retry: Some(config.retry),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a custom HTTP header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the retry policy for unary calls.
    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.retry = Some(RetryPolicy::new(max_retries, base_delay));
        self
    }

    /// Disable retries.
    pub fn without_retry(mut self) -> Self {
        self.retry = Some(RetryPolicy::none());
        self
    }

    /// The configuration this builder would produce.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.url.clone());
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(retry) = self.retry {
            config.retry = retry;
        }
        config.headers = self.headers.clone();
        config
    }

    /// Build the client.
    #[cfg(feature = "client")]
    pub fn build(self) -> crate::AdkResult<crate::client::AdkClient> {
        crate::client::AdkClient::new(self.config())
    }
}
