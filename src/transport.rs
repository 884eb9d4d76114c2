//! Transport capability seam
//!
//! The client never touches a WebSocket library directly; it consumes a
//! [`Connector`], a capability that opens a connection and hands back a
//! [`TransportHandle`]. The handle is a pair of channels: outbound requests
//! (frames and the close request) flow one way, transport notifications
//! (messages, close) flow the other. "Open" has no separate notification:
//! it is the successful resolution of [`Connector::open`].
//!
//! [`WsConnector`] is the production implementation on tokio-tungstenite.
//! It spawns a pump task that owns the socket and bridges it to the handle's
//! channels; tests substitute channel-backed mock connectors instead.

use crate::error::{Error, Result};
use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

/// A single payload unit carried over the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload
    Text(String),
    /// Raw binary payload
    Binary(Vec<u8>),
}

impl Frame {
    /// The text content, if this is a text frame
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Frame::Text(text) => Some(text),
            Frame::Binary(_) => None,
        }
    }

    /// Number of payload bytes
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(bytes) => bytes.len(),
        }
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn into_message(self) -> Message {
        match self {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(bytes) => Message::Binary(bytes),
        }
    }
}

/// Notification delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A payload arrived
    Message(Frame),
    /// The connection is gone, whether requested or not
    Closed,
}

/// Request issued toward the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Transmit a payload
    Frame(Frame),
    /// Request a close handshake
    Close,
}

/// Inspectable description of an open transport
///
/// This is what `"connect"` subscribers receive. It carries no ownership of
/// the connection; the handle itself stays with the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportInfo {
    /// The URL the transport was opened against
    pub url: String,
    /// The negotiated subprotocol, empty when none was requested
    pub subprotocol: String,
}

/// An open transport, exclusively owned by the client
///
/// At most one handle is live at a time; each reconnect attempt replaces the
/// previous one wholesale.
pub struct TransportHandle {
    /// Requests toward the transport
    pub outbound: mpsc::Sender<Outbound>,
    /// Notifications from the transport
    pub events: mpsc::Receiver<TransportEvent>,
    /// Diagnostics reference for subscribers
    pub info: TransportInfo,
}

/// Capability to open a duplex message transport
pub trait Connector: Send + Sync {
    /// Open a connection to `url`, negotiating `subprotocol` when non-empty
    ///
    /// Resolving successfully is the "open" notification; everything after
    /// that arrives on the handle's event channel.
    fn open(&self, url: &str, subprotocol: &str) -> BoxFuture<'static, Result<TransportHandle>>;
}

const CHANNEL_CAPACITY: usize = 64;

/// WebSocket connector backed by tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: &str, subprotocol: &str) -> BoxFuture<'static, Result<TransportHandle>> {
        let url = url.to_string();
        let subprotocol = subprotocol.to_string();

        Box::pin(async move {
            let mut request = url
                .clone()
                .into_client_request()
                .map_err(|e| Error::InvalidUrl(e.to_string()))?;
            if !subprotocol.is_empty() {
                let value = HeaderValue::from_str(&subprotocol)
                    .map_err(|e| Error::InvalidUrl(e.to_string()))?;
                request
                    .headers_mut()
                    .insert("Sec-WebSocket-Protocol", value);
            }

            let (ws_stream, _response) = connect_async(request)
                .await
                .map_err(|e| Error::Handshake(e.to_string()))?;
            let (mut sink, mut stream) = ws_stream.split();

            let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(CHANNEL_CAPACITY);
            let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

            // Pump task: owns the socket until either side goes away.
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        request = outbound_rx.recv() => match request {
                            Some(Outbound::Frame(frame)) => {
                                if let Err(e) = sink.send(frame.into_message()).await {
                                    tracing::warn!(error = %e, "websocket send failed");
                                    break;
                                }
                            }
                            Some(Outbound::Close) => {
                                if let Err(e) = sink.send(Message::Close(None)).await {
                                    tracing::debug!(error = %e, "close request after socket already gone");
                                }
                            }
                            // Handle dropped; stop pumping.
                            None => break,
                        },
                        incoming = stream.next() => match incoming {
                            Some(Ok(Message::Text(text))) => {
                                if event_tx.send(TransportEvent::Message(Frame::Text(text))).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Binary(bytes))) => {
                                if event_tx.send(TransportEvent::Message(Frame::Binary(bytes))).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            // Ping/pong and fragments are handled by tungstenite.
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "websocket error");
                                break;
                            }
                        },
                    }
                }
                let _ = event_tx.send(TransportEvent::Closed).await;
            });

            Ok(TransportHandle {
                outbound: outbound_tx,
                events: event_rx,
                info: TransportInfo { url, subprotocol },
            })
        })
    }
}
