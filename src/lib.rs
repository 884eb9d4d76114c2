//! Managed auto-reconnecting WebSocket client with per-object pub/sub events
//!
//! This crate provides two layered components:
//!
//! - **[`Notifier`]**: a per-instance registry of named event channels with
//!   asynchronous, non-blocking dispatch. Reusable by any type that wants
//!   decoupled, crash-isolated event delivery.
//! - **[`Sluice`]**: a managed duplex WebSocket connection built on top of a
//!   `Notifier`. It tracks lifecycle state, wires transport notifications to
//!   event emission, and reconnects automatically with a fixed-delay, capped
//!   retry policy.
//!
//! The transport itself is a capability the client consumes through the
//! [`Connector`] trait; [`WsConnector`] is the tokio-tungstenite
//! implementation and tests substitute channel-backed mocks.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sluice::{event, Event, Sluice, SluiceConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Sluice::new(SluiceConfig::new("localhost:8080"));
//!
//!     client.bind(event::MESSAGE, |ev| async move {
//!         if let Event::Message { data: Some(text), .. } = ev {
//!             println!("received: {text}");
//!         }
//!     }).await;
//!
//!     client.bind(event::STATE_CHANGE, |ev| async move {
//!         if let Event::StateChange { new, old } = ev {
//!             println!("{old} -> {new}");
//!         }
//!     }).await;
//!
//!     client.connect("live").await;
//!     // ... later:
//!     client.send("hello").await;
//!     client.disconnect().await;
//! }
//! ```
//!
//! # Reconnection
//!
//! An unrequested close consumes one attempt from the retry budget and the
//! client re-enters `Connecting` after the configured delay. The budget
//! refills on every successful open. When it runs out, the client settles in
//! `Idle` and emits `"disconnect"`, which at the event level is
//! indistinguishable from a deliberate disconnect; `"stateChange"` history or
//! [`Sluice::retry_count`] tells the two apart.

mod client;
mod config;
mod connection_state;
mod error;
mod metrics;
mod notifier;
mod reconnect;
mod transport;

pub use client::{event, Event, Payload, Sluice, SluiceBuilder};
pub use config::SluiceConfig;
pub use connection_state::ConnState;
pub use error::{Error, Result};
pub use metrics::SluiceMetrics;
pub use notifier::{Notifier, SubscriberFn, SubscriberId};
pub use reconnect::RetryPolicy;
pub use transport::{
    Connector, Frame, Outbound, TransportEvent, TransportHandle, TransportInfo, WsConnector,
};
