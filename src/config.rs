//! Client configuration
//!
//! Configuration is an immutable value: defaults are applied field by field
//! at construction and nothing mutates it afterwards. The chainable setters
//! consume and return the value, so a config reads as one expression.

use std::time::Duration;

/// Configuration for a managed connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SluiceConfig {
    /// Server host, with optional port (e.g. "example.com:8080")
    pub server: String,

    /// Use `wss://` instead of `ws://`
    pub secure: bool,

    /// Subprotocol to negotiate, empty for none
    pub subprotocol: String,

    /// Whether to automatically reconnect after an unrequested close
    pub autoreconnect: bool,

    /// Maximum reconnect attempts per outage
    pub max_retries: u32,

    /// Fixed delay between reconnect attempts
    pub retry_delay: Duration,

    /// Separator used to join list payloads into one text frame
    pub separator: String,
}

impl Default for SluiceConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            secure: false,
            subprotocol: String::new(),
            autoreconnect: true,
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            separator: ",".to_string(),
        }
    }
}

impl SluiceConfig {
    /// Create a configuration for the given server host
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    /// Use TLS (`wss://`)
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Negotiate the given subprotocol
    pub fn subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = subprotocol.into();
        self
    }

    /// Disable automatic reconnection
    pub fn no_reconnect(mut self) -> Self {
        self.autoreconnect = false;
        self
    }

    /// Set the reconnect attempt cap
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between reconnect attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the separator for list payloads
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Build the connection URL for the given path
    ///
    /// A non-empty path is appended as a trailing segment; an empty path
    /// yields the root.
    pub(crate) fn url_for(&self, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        if path.is_empty() {
            format!("{scheme}://{}/", self.server)
        } else {
            format!("{scheme}://{}/{path}", self.server)
        }
    }
}
