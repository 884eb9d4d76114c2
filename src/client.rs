//! Managed connection client
//!
//! `Sluice` owns a single logical WebSocket connection: it tracks the
//! lifecycle state, wires transport notifications to event emission, and
//! applies the reconnection policy when the transport drops. Application
//! code subscribes to the named event channels and never touches the
//! transport directly.
//!
//! # Lifecycle
//!
//! 1. Build a [`SluiceConfig`] and create the client.
//! 2. `bind` subscribers for `"connect"`, `"message"`, `"disconnect"`,
//!    `"error"`, `"stateChange"`.
//! 3. Call [`Sluice::connect`]; it returns immediately and the run loop does
//!    the rest, including reconnection.
//! 4. [`Sluice::disconnect`] requests a close; the state settles in `Idle`
//!    when the close notification lands. The client is reusable across many
//!    connect/disconnect cycles.
//!
//! # Cloning
//!
//! `Sluice` is cheaply cloneable; all clones share the same connection and
//! subscriber registry.

use crate::config::SluiceConfig;
use crate::connection_state::ConnState;
use crate::error::Error;
use crate::metrics::SluiceMetrics;
use crate::notifier::{Notifier, SubscriberId};
use crate::reconnect::RetryPolicy;
use crate::transport::{
    Connector, Frame, Outbound, TransportEvent, TransportHandle, TransportInfo, WsConnector,
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Names of the event channels the client emits on
pub mod event {
    /// Transport opened; payload is [`Event::Connect`](super::Event::Connect)
    pub const CONNECT: &str = "connect";
    /// Settled without reconnecting; payload is [`Event::Disconnect`](super::Event::Disconnect)
    pub const DISCONNECT: &str = "disconnect";
    /// Payload arrived; payload is [`Event::Message`](super::Event::Message)
    pub const MESSAGE: &str = "message";
    /// Asynchronous failure; payload is [`Event::Error`](super::Event::Error)
    pub const ERROR: &str = "error";
    /// State transition; payload is [`Event::StateChange`](super::Event::StateChange)
    pub const STATE_CHANGE: &str = "stateChange";
}

/// Payload delivered to event subscribers
#[derive(Debug, Clone)]
pub enum Event {
    /// The transport opened; carries an inspectable reference to it
    Connect(TransportInfo),
    /// The connection settled without reconnecting; the payload is always
    /// `false`, for a deliberate disconnect and an exhausted retry budget alike
    Disconnect(bool),
    /// A payload arrived; `data` is the text content when the frame is text
    Message {
        /// Text content of the frame, `None` for binary frames
        data: Option<String>,
        /// The raw frame as received
        frame: Frame,
    },
    /// An asynchronous failure
    Error(Error),
    /// The state changed from `old` to `new`
    StateChange {
        /// State entered
        new: ConnState,
        /// State left
        old: ConnState,
    },
}

/// Outgoing payload accepted by [`Sluice::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A single text payload, transmitted as-is
    Text(String),
    /// A binary payload, transmitted as-is
    Binary(Vec<u8>),
    /// A sequence, joined with the configured separator into one text frame
    List(Vec<String>),
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(bytes)
    }
}

impl From<Vec<String>> for Payload {
    fn from(parts: Vec<String>) -> Self {
        Payload::List(parts)
    }
}

impl From<Vec<&str>> for Payload {
    fn from(parts: Vec<&str>) -> Self {
        Payload::List(parts.into_iter().map(str::to_string).collect())
    }
}

struct Inner {
    config: SluiceConfig,
    notifier: Notifier<Event>,
    state: RwLock<ConnState>,
    retry_count: AtomicU32,
    connected: AtomicBool,
    // The single authoritative slot for the live transport: connect installs
    // it, disconnect and send read it, the run loop clears it on close.
    outbound: Mutex<Option<tokio::sync::mpsc::Sender<Outbound>>>,
    connector: Option<Arc<dyn Connector>>,
    metrics: Option<Arc<SluiceMetrics>>,
}

/// Builder for a [`Sluice`] client
pub struct SluiceBuilder {
    config: SluiceConfig,
    connector: Option<Arc<dyn Connector>>,
    metrics: Option<Arc<SluiceMetrics>>,
}

impl SluiceBuilder {
    /// Start a builder with the given configuration and the default
    /// WebSocket connector
    pub fn new(config: SluiceConfig) -> Self {
        Self {
            config,
            connector: Some(Arc::new(WsConnector)),
            metrics: None,
        }
    }

    /// Substitute a custom transport capability
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build with no transport capability at all
    ///
    /// `connect` on such a client emits `"error"` with
    /// [`Error::TransportUnavailable`] instead of opening anything.
    pub fn without_transport(mut self) -> Self {
        self.connector = None;
        self
    }

    /// Record connection metrics through the given instruments
    pub fn metrics(mut self, metrics: Arc<SluiceMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the client
    pub fn build(self) -> Sluice {
        Sluice {
            inner: Arc::new(Inner {
                config: self.config,
                notifier: Notifier::new(),
                state: RwLock::new(ConnState::Idle),
                retry_count: AtomicU32::new(0),
                connected: AtomicBool::new(false),
                outbound: Mutex::new(None),
                connector: self.connector,
                metrics: self.metrics,
            }),
        }
    }
}

/// Managed, auto-reconnecting duplex connection
#[derive(Clone)]
pub struct Sluice {
    inner: Arc<Inner>,
}

impl Sluice {
    /// Create a client with the default WebSocket connector
    pub fn new(config: SluiceConfig) -> Self {
        SluiceBuilder::new(config).build()
    }

    /// Start a builder for custom transport or metrics wiring
    pub fn builder(config: SluiceConfig) -> SluiceBuilder {
        SluiceBuilder::new(config)
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &SluiceConfig {
        &self.inner.config
    }

    /// Current lifecycle state
    pub async fn state(&self) -> ConnState {
        self.inner.state().await
    }

    /// Cheap mirror of `state() == Connected`
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Reconnect attempts made since the last successful open
    pub fn retry_count(&self) -> u32 {
        self.inner.retry_count.load(Ordering::SeqCst)
    }

    /// Register a callback on the named event channel
    ///
    /// See [`Notifier::bind`]; channel names are in [`event`].
    pub async fn bind<F, Fut>(&self, event: impl Into<String>, callback: F) -> SubscriberId
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.notifier.bind(event, callback).await
    }

    /// Remove one subscription from the named channel
    pub async fn unbind(&self, event: &str, id: SubscriberId) -> bool {
        self.inner.notifier.unbind(event, id).await
    }

    /// Remove every subscription on the named channel
    pub async fn unbind_all(&self, event: &str) -> bool {
        self.inner.notifier.unbind_all(event).await
    }

    /// Dispatch a payload on the named channel
    ///
    /// Used internally for the lifecycle events, but public: subscribers can
    /// re-emit, and other components can piggyback on the same registry.
    pub async fn emit(&self, event: &str, payload: Event) -> bool {
        self.inner.notifier.emit(event, payload).await
    }

    /// Open the connection, appending `path` to the configured server
    ///
    /// Returns immediately; progress is reported through `"stateChange"`,
    /// `"connect"` and `"error"`. A call while an attempt is already in
    /// flight, while connected, or while a deliberate close is still pending
    /// is ignored; wait for `Idle` before reconnecting.
    pub async fn connect(&self, path: &str) {
        let inner = &self.inner;

        let Some(connector) = inner.connector.clone() else {
            inner.connected.store(false, Ordering::SeqCst);
            inner.set_state(ConnState::Errored).await;
            if let Some(m) = &inner.metrics {
                m.record_error("transport_unavailable");
            }
            inner
                .notifier
                .emit(event::ERROR, Event::Error(Error::TransportUnavailable))
                .await;
            return;
        };

        // Closing counts as in progress: a second run loop spawned while the
        // close notification is still in flight would race the first one for
        // the transport slot and the give-up decision.
        let current = inner.state().await;
        if matches!(
            current,
            ConnState::Connecting | ConnState::Connected | ConnState::Closing
        ) {
            tracing::debug!(state = %current, "connect ignored, already in progress");
            return;
        }

        let url = inner.config.url_for(path);
        // A fresh connect gets a fresh retry budget.
        inner.retry_count.store(0, Ordering::SeqCst);
        inner.set_state(ConnState::Connecting).await;
        tracing::info!(url = %url, "connecting");

        tokio::spawn(Arc::clone(inner).run_loop(connector, url));
    }

    /// Request a close of the current connection
    ///
    /// A request, not a guarantee: the state settles in `Idle` only when the
    /// close notification arrives. The intent is marked (`Closing`) before
    /// the request goes out, which is what suppresses reconnection for a
    /// deliberate disconnect. No-op when not connected.
    pub async fn disconnect(&self) {
        if !self.is_connected() {
            return;
        }

        self.inner.set_state(ConnState::Closing).await;

        let outbound = self.inner.outbound.lock().await.clone();
        if let Some(tx) = outbound {
            if tx.send(Outbound::Close).await.is_err() {
                tracing::debug!("close requested after transport already gone");
            }
        }
    }

    /// Transmit a payload over the current connection
    ///
    /// List payloads are joined with the configured separator into a single
    /// text frame. A silent no-op when not connected; check
    /// [`is_connected`](Self::is_connected) or watch `"stateChange"` to know
    /// when sending is safe.
    pub async fn send(&self, payload: impl Into<Payload>) {
        if !self.is_connected() {
            tracing::debug!("send skipped, not connected");
            return;
        }

        let frame = match payload.into() {
            Payload::Text(text) => Frame::Text(text),
            Payload::Binary(bytes) => Frame::Binary(bytes),
            Payload::List(parts) => Frame::Text(parts.join(&self.inner.config.separator)),
        };

        let outbound = self.inner.outbound.lock().await.clone();
        match outbound {
            Some(tx) => {
                if tx.send(Outbound::Frame(frame)).await.is_err() {
                    tracing::warn!("send failed, transport closed");
                } else if let Some(m) = &self.inner.metrics {
                    m.record_message_sent();
                }
            }
            None => tracing::debug!("send skipped, transport not available"),
        }
    }
}

impl Inner {
    async fn state(&self) -> ConnState {
        *self.state.read().await
    }

    /// Unconditionally overwrite the state and emit one `"stateChange"`
    async fn set_state(&self, new: ConnState) {
        let old = {
            let mut guard = self.state.write().await;
            std::mem::replace(&mut *guard, new)
        };
        if let Some(m) = &self.metrics {
            m.record_state(new.code());
        }
        self.notifier
            .emit(event::STATE_CHANGE, Event::StateChange { new, old })
            .await;
    }

    /// Connection run loop: open, drain, then retry or settle
    ///
    /// One task per connect cycle. Owns the transport events receiver for the
    /// life of each attempt.
    async fn run_loop(self: Arc<Self>, connector: Arc<dyn Connector>, url: String) {
        let policy = RetryPolicy::new(self.config.retry_delay, self.config.max_retries);

        loop {
            match connector.open(&url, &self.config.subprotocol).await {
                Ok(handle) => {
                    let TransportHandle {
                        outbound,
                        mut events,
                        info,
                    } = handle;

                    *self.outbound.lock().await = Some(outbound);
                    let was_retry = self.retry_count.load(Ordering::SeqCst) > 0;
                    // Per-outage retry semantics: the budget refills on open.
                    self.retry_count.store(0, Ordering::SeqCst);
                    self.connected.store(true, Ordering::SeqCst);
                    if was_retry {
                        if let Some(m) = &self.metrics {
                            m.record_reconnect_success();
                        }
                    }
                    self.set_state(ConnState::Connected).await;
                    tracing::info!(url = %info.url, "connected");
                    self.notifier.emit(event::CONNECT, Event::Connect(info)).await;

                    while let Some(transport_event) = events.recv().await {
                        match transport_event {
                            TransportEvent::Message(frame) => {
                                if let Some(m) = &self.metrics {
                                    m.record_message_received();
                                }
                                let data = frame.as_text().map(str::to_owned);
                                self.notifier
                                    .emit(event::MESSAGE, Event::Message { data, frame })
                                    .await;
                            }
                            TransportEvent::Closed => break,
                        }
                    }

                    *self.outbound.lock().await = None;
                    self.connected.store(false, Ordering::SeqCst);
                }
                // A failed attempt is an immediate close: it consults the
                // retry policy like any other drop and is not reported on the
                // "error" channel.
                Err(e) => {
                    tracing::warn!(error = %e, "connection attempt failed");
                    if let Some(m) = &self.metrics {
                        m.record_error("connect");
                    }
                }
            }

            let deliberate = self.state().await == ConnState::Closing;
            let attempt = self.retry_count.load(Ordering::SeqCst);
            let delay = if !deliberate && self.config.autoreconnect {
                policy.next_delay(attempt)
            } else {
                None
            };

            match delay {
                Some(delay) => {
                    self.retry_count.fetch_add(1, Ordering::SeqCst);
                    if let Some(m) = &self.metrics {
                        m.record_reconnect_attempt();
                    }
                    tracing::info!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "reconnecting"
                    );
                    tokio::time::sleep(delay).await;
                    self.set_state(ConnState::Connecting).await;
                }
                None => {
                    if !deliberate && self.config.autoreconnect {
                        tracing::warn!(attempts = attempt, "reconnect attempts exhausted");
                    }
                    self.connected.store(false, Ordering::SeqCst);
                    self.set_state(ConnState::Idle).await;
                    self.notifier
                        .emit(event::DISCONNECT, Event::Disconnect(false))
                        .await;
                    return;
                }
            }
        }
    }
}
