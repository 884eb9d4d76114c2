//! Common test utilities for sluice integration tests
//!
//! Provides a real WebSocket mock server for end-to-end lifecycle tests and
//! channel-backed connectors for deterministic reconnection scenarios.

#![allow(dead_code)]

use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use sluice::{
    ConnState, Connector, Error, Event, Outbound, Sluice, TransportEvent, TransportHandle,
    TransportInfo,
};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// How the mock server treats accepted connections
#[derive(Debug, Clone, Copy)]
pub enum ServerBehavior {
    /// Record incoming text and echo it back
    Echo,
    /// Close every connection right after the handshake
    CloseImmediately,
}

/// Mock WebSocket server for client testing
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    received_rx: tokio::sync::Mutex<mpsc::Receiver<String>>,
    connections: Arc<AtomicUsize>,
}

impl MockWsServer {
    /// Start an echoing mock server on an ephemeral port
    pub async fn new() -> Self {
        Self::with_behavior(ServerBehavior::Echo).await
    }

    /// Start a mock server with the given behavior
    pub async fn with_behavior(behavior: ServerBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (received_tx, received_rx) = mpsc::channel::<String>(100);
        let connections = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::clone(&connections);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { break };
                        accepted.fetch_add(1, Ordering::SeqCst);
                        let received_tx = received_tx.clone();

                        tokio::spawn(async move {
                            let Ok(ws_stream) = accept_async(stream).await else {
                                return;
                            };
                            let (mut write, mut read) = ws_stream.split();

                            if matches!(behavior, ServerBehavior::CloseImmediately) {
                                let _ = write.send(Message::Close(None)).await;
                                return;
                            }

                            while let Some(Ok(message)) = read.next().await {
                                match message {
                                    Message::Text(text) => {
                                        let _ = received_tx.send(text.clone()).await;
                                        let _ = write.send(Message::Text(text)).await;
                                    }
                                    Message::Close(_) => break,
                                    _ => {}
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            received_rx: tokio::sync::Mutex::new(received_rx),
            connections,
        }
    }

    /// Host string suitable for `SluiceConfig::new`
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Number of connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Next text message the server received, or `None` on timeout
    pub async fn next_received(&self, timeout: Duration) -> Option<String> {
        tokio::time::timeout(timeout, self.received_rx.lock().await.recv())
            .await
            .ok()
            .flatten()
    }

    /// Stop accepting connections
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// The far side of a channel-backed transport
///
/// Tests drive the connection by reading outbound requests and pushing
/// transport events, playing the server role without any networking.
pub struct ServerEnd {
    pub outbound: mpsc::Receiver<Outbound>,
    pub events: mpsc::Sender<TransportEvent>,
}

/// Scripted outcome of one `Connector::open` call
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    /// Hand out a working channel-backed transport
    Open,
    /// Fail the attempt
    Refuse,
}

/// Connector whose open outcomes follow a script
///
/// Outcomes are consumed one per call; once the script is exhausted every
/// further call opens. Each successful open pushes a [`ServerEnd`] to the
/// receiver returned from [`ScriptedConnector::new`].
pub struct ScriptedConnector {
    script: StdMutex<VecDeque<Outcome>>,
    ends_tx: mpsc::UnboundedSender<ServerEnd>,
    opens: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Outcome>) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (ends_tx, ends_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            script: StdMutex::new(script.into()),
            ends_tx,
            opens: Arc::new(AtomicUsize::new(0)),
        });
        (connector, ends_rx)
    }

    /// Total `open` calls made, successful or not
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl Connector for ScriptedConnector {
    fn open(&self, url: &str, subprotocol: &str) -> BoxFuture<'static, sluice::Result<TransportHandle>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Open);

        match outcome {
            Outcome::Refuse => Box::pin(async { Err(Error::Handshake("refused".into())) }),
            Outcome::Open => {
                let (outbound_tx, outbound_rx) = mpsc::channel(16);
                let (event_tx, event_rx) = mpsc::channel(16);
                let _ = self.ends_tx.send(ServerEnd {
                    outbound: outbound_rx,
                    events: event_tx,
                });
                let info = TransportInfo {
                    url: url.to_string(),
                    subprotocol: subprotocol.to_string(),
                };
                Box::pin(async move {
                    Ok(TransportHandle {
                        outbound: outbound_tx,
                        events: event_rx,
                        info,
                    })
                })
            }
        }
    }
}

/// Connector that refuses every attempt
pub struct FailingConnector {
    opens: Arc<AtomicUsize>,
}

impl FailingConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            opens: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl Connector for FailingConnector {
    fn open(&self, _url: &str, _subprotocol: &str) -> BoxFuture<'static, sluice::Result<TransportHandle>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(Error::Handshake("refused".into())) })
    }
}

/// Record every `"stateChange"` as `(new, old)` pairs
pub async fn record_state_changes(client: &Sluice) -> Arc<StdMutex<Vec<(ConnState, ConnState)>>> {
    let log: Arc<StdMutex<Vec<(ConnState, ConnState)>>> = Arc::new(StdMutex::new(Vec::new()));
    let log_clone = Arc::clone(&log);
    client
        .bind(sluice::event::STATE_CHANGE, move |ev| {
            let log = Arc::clone(&log_clone);
            async move {
                if let Event::StateChange { new, old } = ev {
                    log.lock().unwrap().push((new, old));
                }
            }
        })
        .await;
    log
}

/// Record every `"disconnect"` payload
pub async fn record_disconnects(client: &Sluice) -> Arc<StdMutex<Vec<bool>>> {
    let log: Arc<StdMutex<Vec<bool>>> = Arc::new(StdMutex::new(Vec::new()));
    let log_clone = Arc::clone(&log);
    client
        .bind(sluice::event::DISCONNECT, move |ev| {
            let log = Arc::clone(&log_clone);
            async move {
                if let Event::Disconnect(clean) = ev {
                    log.lock().unwrap().push(clean);
                }
            }
        })
        .await;
    log
}

/// Record every `"error"` payload
pub async fn record_errors(client: &Sluice) -> Arc<StdMutex<Vec<Error>>> {
    let log: Arc<StdMutex<Vec<Error>>> = Arc::new(StdMutex::new(Vec::new()));
    let log_clone = Arc::clone(&log);
    client
        .bind(sluice::event::ERROR, move |ev| {
            let log = Arc::clone(&log_clone);
            async move {
                if let Event::Error(e) = ev {
                    log.lock().unwrap().push(e);
                }
            }
        })
        .await;
    log
}

/// Poll until the client reaches the given state, or time out
pub async fn wait_for_state(client: &Sluice, state: ConnState, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if client.state().await == state {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Poll until the client reports connected, or time out
pub async fn wait_for_connected(client: &Sluice, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if client.is_connected() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Install a test tracing subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sluice=debug")),
        )
        .with_test_writer()
        .try_init();
}
