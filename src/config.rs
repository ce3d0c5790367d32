//! Client configuration.
//!
//! The only required setting is the backend base URL. [`ClientConfig::from_env`]
//! picks it the same way the web front end does: an explicit override, else the
//! deployed backend when `ADK_USE_PRODUCTION_BACKEND=true`, else a local server.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::retry::RetryPolicy;

/// Base URL of a locally running `adk api_server`.
pub const LOCAL_BASE_URL: &str = "http://localhost:8002";

/// Base URL of the deployed backend.
pub const PRODUCTION_BASE_URL: &str =
    "https://adk-default-service-name-987669306571.us-central1.run.app";

/// Explicit base URL override.
pub const ENV_BASE_URL: &str = "ADK_API_BASE_URL";

/// Set to `true` to target [`PRODUCTION_BASE_URL`].
pub const ENV_USE_PRODUCTION: &str = "ADK_USE_PRODUCTION_BACKEND";

/// Request timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "ADK_API_TIMEOUT_SECS";

/// Configuration for [`AdkClient`](crate::client::AdkClient) and its transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Request timeout. Defaults to 60 seconds.
    ///
    /// Bounds whole unary calls. For streams it bounds connecting and the gap
    /// between two chunks, so a stalled stream fails with
    /// [`AdkError::Timeout`](crate::error::AdkError::Timeout) while a long
    /// answer that keeps sending is not cut off.
    pub timeout: Duration,
    /// Additional HTTP headers to include on every request.
    pub headers: HashMap<String, String>,
    /// Retry policy for unary calls.
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: LOCAL_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            headers: HashMap::new(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            ..Self::default()
        }
    }

    /// Build a configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let use_production = lookup(ENV_USE_PRODUCTION)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        config.base_url = match lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            Some(url) => {
                debug!(base_url = %url, "using base URL from {}", ENV_BASE_URL);
                normalize_base_url(url)
            }
            None if use_production => PRODUCTION_BASE_URL.to_string(),
            None => LOCAL_BASE_URL.to_string(),
        };

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }

        config
    }

    /// Join `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_to_local_backend() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.base_url, LOCAL_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn production_flag_selects_deployed_backend() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_USE_PRODUCTION, "true")]));
        assert_eq!(config.base_url, PRODUCTION_BASE_URL);
    }

    #[test]
    fn explicit_url_wins_over_production_flag() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_USE_PRODUCTION, "true"),
            (ENV_BASE_URL, "http://10.0.0.5:9000/"),
        ]));
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
    }

    #[test]
    fn invalid_timeout_is_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")]));
        assert_eq!(config.timeout, Duration::from_secs(60));

        let config = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "5")]));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn url_joins_paths() {
        let config = ClientConfig::new("http://localhost:8002/");
        assert_eq!(config.url("/list-apps"), "http://localhost:8002/list-apps");
        assert_eq!(config.url("run"), "http://localhost:8002/run");
    }
}
