//! # Transports
//!
//! A [`Connector`] opens one text-frame session to a URL. The session is a
//! pair of channels: frames queued on `outbound` are written to the socket,
//! and everything the socket produces arrives on `inbound` as a
//! [`TransportEvent`]. Dropping `outbound` closes the session.
//!
//! Two implementations ship with the crate:
//!
//! - [`WebSocketConnector`] speaks to real nodes through `tokio-tungstenite`.
//! - [`MemoryConnector`] keeps everything in process. Each accepted session is
//!   handed to the test (or embedder) as a [`MemoryPeer`] that plays the
//!   node's side of the socket.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use super::TransportError;
use crate::api::RpcError;

/// Something the transport observed on an open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound text frame.
    Message(String),
    /// The remote closed the session, optionally with a reason.
    Closed(Option<String>),
    /// The session failed. No further events follow.
    Error(String),
}

/// An open session.
#[derive(Debug)]
pub struct TransportSession {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<TransportSession, TransportError>;
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// WebSocket transport. TLS is negotiated by `tokio-tungstenite` for `wss://`
/// URLs using the bundled webpki roots.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<TransportSession, TransportError> {
        let (socket, _response) =
            tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| TransportError::Refused {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        debug!(url, "websocket open");

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (mut sink, mut stream) = socket.split();
        let url = url.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = outbound_rx.recv() => {
                        let Some(text) = frame else {
                            // Owner dropped the session.
                            let _ = sink.close().await;
                            break;
                        };
                        trace!(url = %url, bytes = text.len(), "ws send");
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            let _ = inbound_tx.send(TransportEvent::Error(e.to_string()));
                            break;
                        }
                    }
                    msg = stream.next() => {
                        let event = match msg {
                            Some(Ok(Message::Text(text))) => TransportEvent::Message(text),
                            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                                Ok(text) => TransportEvent::Message(text),
                                Err(_) => {
                                    warn!(url = %url, "dropping non-utf8 binary frame");
                                    continue;
                                }
                            },
                            Some(Ok(Message::Close(frame))) => {
                                TransportEvent::Closed(frame.map(|f| f.reason.into_owned()))
                            }
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => TransportEvent::Error(e.to_string()),
                            None => TransportEvent::Closed(None),
                        };
                        let terminal = !matches!(event, TransportEvent::Message(_));
                        if inbound_tx.send(event).is_err() || terminal {
                            break;
                        }
                    }
                }
            }
            debug!(url = %url, "websocket pump stopped");
        });

        Ok(TransportSession {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// In-process transport keyed by URL.
///
/// URLs that were never passed to [`accept`](Self::accept), or that were
/// [`refuse`](Self::refuse)d since, fail to connect.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    listeners: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<MemoryPeer>>>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting sessions for `url`. Every successful connect yields one
    /// [`MemoryPeer`] on the returned receiver.
    pub fn accept(&self, url: impl Into<String>) -> mpsc::UnboundedReceiver<MemoryPeer> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.lock().insert(url.into(), tx);
        rx
    }

    /// Refuse future sessions for `url`. Open sessions are unaffected.
    pub fn refuse(&self, url: &str) {
        self.listeners.lock().remove(url);
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<TransportSession, TransportError> {
        let refused = |reason: &str| TransportError::Refused {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let listener = self
            .listeners
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| refused("no listener"))?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let peer = MemoryPeer {
            url: url.to_string(),
            requests: outbound_rx,
            events: inbound_tx,
        };
        listener.send(peer).map_err(|_| refused("listener gone"))?;

        Ok(TransportSession {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// The node's end of an in-memory session. Dropping it closes the session.
#[derive(Debug)]
pub struct MemoryPeer {
    url: String,
    requests: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl MemoryPeer {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Next raw frame from the client, or `None` once the client hung up.
    pub async fn recv(&mut self) -> Option<String> {
        self.requests.recv().await
    }

    /// Next frame parsed as JSON. Frames that are not JSON are skipped.
    pub async fn recv_request(&mut self) -> Option<Value> {
        while let Some(text) = self.recv().await {
            match serde_json::from_str(&text) {
                Ok(value) => return Some(value),
                Err(e) => warn!(error = %e, "memory peer got a non-json frame"),
            }
        }
        None
    }

    /// Send a raw frame to the client. Returns `false` if it hung up.
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.events.send(TransportEvent::Message(text.into())).is_ok()
    }

    pub fn reply(&self, id: u64, result: Value) -> bool {
        self.send(serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string())
    }

    pub fn reply_error(&self, id: u64, error: &RpcError) -> bool {
        self.send(serde_json::json!({"jsonrpc": "2.0", "id": id, "error": error}).to_string())
    }

    /// Close the session with a reason, as a node going away would.
    pub fn close(self, reason: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Closed(Some(reason.into())));
    }

    /// Fail the session with a transport error.
    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Error(reason.into()));
    }
}
