//! # Node Networking
//!
//! Turns a list of candidate node URLs into one multiplexed request channel.
//!
//! ```text
//! transport.rs: Connector trait, WebSocket and in-memory sessions
//! connection.rs: NodeConnection, with endpoint failover and response routing
//! broadcast.rs: BroadcastSequence for one transaction
//! metrics.rs: per-connection Prometheus registry
//! ```
//!
//! ## Failure model
//!
//! Transport failures drive failover. Requests already written to a session
//! that later drops fail with [`RequestError::ConnectionLost`] and are never
//! replayed on the next endpoint; whether a call is safe to repeat is the
//! caller's decision. Node-reported errors reach the caller untouched as
//! [`RequestError::Node`].

pub mod broadcast;
pub mod connection;
pub mod metrics;
pub mod transport;

use thiserror::Error;

use crate::api::RpcError;
use crate::chain::ChainError;
use crate::transaction::TransactionError;

pub use broadcast::{BroadcastMode, BroadcastReceipt, BroadcastSequence, BroadcastStage};
pub use connection::{ConnectOptions, ConnectionState, FatalErrorHook, NodeConnection, PendingResponse};
pub use metrics::ConnectionMetrics;
pub use transport::{Connector, MemoryConnector, MemoryPeer, TransportEvent, TransportSession, WebSocketConnector};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection to {url} refused: {reason}")]
    Refused { url: String, reason: String },

    #[error("login to {url} rejected: {reason}")]
    Handshake { url: String, reason: String },

    #[error("session closed: {0}")]
    Closed(String),
}

/// Fatal outcomes of [`NodeConnection::connect`], also handed to the
/// fatal-error hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("can't connect, ran out of endpoints after trying {tried}")]
    OutOfEndpoints { tried: usize },

    #[error("failed to connect to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("connection to {url} lost: {reason}")]
    Lost { url: String, reason: String },

    #[error("connection is already active")]
    AlreadyActive,

    #[error("connection was closed while connecting")]
    Closed,
}

/// Why a request could not be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("not connected to any node")]
    NotConnected,

    #[error("request id {0} is already pending")]
    DuplicateRequestId(u64),
}

/// Terminal failure of one request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("connection lost before a response arrived")]
    ConnectionLost,

    #[error(transparent)]
    Node(#[from] RpcError),

    #[error("malformed {method} result: {reason}")]
    Decode { method: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BroadcastError {
    #[error("{stage} failed: {source}")]
    Request {
        stage: BroadcastStage,
        #[source]
        source: RequestError,
    },

    #[error("node quoted {returned} fees for {requested} operations")]
    FeeCountMismatch { requested: usize, returned: usize },

    #[error("transaction has no signatures")]
    Unsigned,

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl BroadcastError {
    /// The node's own rejection, if that is what ended the sequence.
    pub fn node_error(&self) -> Option<&RpcError> {
        match self {
            Self::Request {
                source: RequestError::Node(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}
