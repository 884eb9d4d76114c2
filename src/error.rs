//! Error types for sluice
//!
//! Construction-time misuse (a non-callable subscriber, a malformed config
//! value) is a compile-time concern in Rust, so the error enum only covers
//! runtime conditions. Everything that can happen after `connect` returns is
//! surfaced asynchronously through the `"error"` event or the close-and-retry
//! policy, never by a panic or a returned `Err` from the public operations.
//!
//! The enum is `Clone` because errors travel inside event payloads, which are
//! cloned once per subscriber at dispatch time.

use thiserror::Error;

/// Result type for sluice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Runtime error conditions for the managed connection
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// No transport capability is configured
    ///
    /// Emitted on the `"error"` channel when `connect` is called on a client
    /// built without a connector. No transport is created in this case.
    #[error("transport capability unavailable")]
    TransportUnavailable,

    /// The WebSocket handshake failed
    ///
    /// Covers DNS failures, refused connections and protocol negotiation
    /// problems during connection establishment.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// WebSocket transport layer error after the connection was established
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// The configured server/path could not be turned into a request
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The transport closed before or while an operation used it
    #[error("connection closed")]
    ConnectionClosed,
}
