//! # Node Connection
//!
//! One [`NodeConnection`] owns an ordered list of candidate endpoints and at
//! most one live session. It assigns request ids, keeps the pending-request
//! map, routes responses back to their callers, and hops to the next
//! endpoint when a connect attempt or a live session fails.
//!
//! ```text
//!            connect()
//!   Idle ───────────────▶ Connecting(i) ──ok──▶ Connected
//!    ▲                       │    ▲                 │
//!    │ close()         fail  │    │ auto_reconnect   │ session lost
//!    │                       ▼    │ (i + 1)         ▼
//!    └──────────────────── Failing(i) ◀─────────────┘
//!                            │
//!                            │ no auto_reconnect, or i + 1 == endpoints.len()
//!                            ▼
//!                        Exhausted
//! ```
//!
//! Hopping is immediate: with `auto_reconnect`, each failure advances the
//! index by one, with no backoff and no wrap-around within a pass. Without
//! it the index stays on the endpoint that failed, so the next `connect`
//! retries it. A `connect` issued after a pass ran off the end starts a new
//! pass at the first endpoint, unless endpoints were appended since, in
//! which case it resumes at the first of those.
//!
//! Id assignment, registration, removal, and the transport write all happen
//! under a single lock, so two callers never share an id and a response can
//! never be routed before its request was written.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace, warn};

use super::metrics::ConnectionMetrics;
use super::transport::{Connector, TransportEvent, TransportSession, WebSocketConnector};
use super::{ConnectionError, DispatchError, RequestError, TransportError};
use crate::api::{parse_inbound, InboundMessage, Login, RequestHandler};
use crate::config::ClientConfig;

/// Called once per fatal connection failure.
pub type FatalErrorHook = Arc<dyn Fn(&ConnectionError) + Send + Sync>;

type Outcome = Result<Value, RequestError>;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting { index: usize, url: String },
    Connected { url: String },
    Failing { url: String, reason: String },
    /// The connect pass is over. Only an explicit `connect` leaves it.
    Exhausted,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    fn is_active(&self) -> bool {
        matches!(self, Self::Connecting { .. } | Self::Connected { .. })
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Connecting { url, .. } => write!(f, "connecting to {url}"),
            Self::Connected { url } => write!(f, "connected to {url}"),
            Self::Failing { url, reason } => write!(f, "failing ({url}: {reason})"),
            Self::Exhausted => f.write_str("exhausted"),
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ConnectOptions {
    /// Login handshake performed before the session accepts requests.
    /// Skipped when both parts are empty.
    pub credentials: Option<(String, String)>,
    /// Hop to the next endpoint after a failure instead of stopping.
    pub auto_reconnect: bool,
    pub on_fatal_error: Option<FatalErrorHook>,
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn on_fatal_error(mut self, hook: impl Fn(&ConnectionError) + Send + Sync + 'static) -> Self {
        self.on_fatal_error = Some(Arc::new(hook));
        self
    }

    fn login_credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .filter(|(username, password)| !(username.is_empty() && password.is_empty()))
            .map(|(username, password)| (username.as_str(), password.as_str()))
    }

    /// Options matching a loaded client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            credentials: config.credentials(),
            auto_reconnect: config.auto_reconnect,
            on_fatal_error: None,
        }
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            credentials: None,
            auto_reconnect: true,
            on_fatal_error: None,
        }
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("credentials", &self.credentials.as_ref().map(|(user, _)| user))
            .field("auto_reconnect", &self.auto_reconnect)
            .field("on_fatal_error", &self.on_fatal_error.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Node Connection
// ---------------------------------------------------------------------------

struct Inner {
    state: ConnectionState,
    endpoints: Vec<String>,
    /// Endpoint to try next, or the one currently in use.
    index: usize,
    outbound: Option<mpsc::UnboundedSender<String>>,
    shutdown: Option<oneshot::Sender<()>>,
    /// Bumped by `connect` and `close`; stale session tasks compare and bail.
    generation: u64,
    next_id: u64,
    pending: HashMap<u64, oneshot::Sender<Outcome>>,
}

/// A live session handed from the connect path to the session task.
struct Live {
    url: String,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    shutdown: oneshot::Receiver<()>,
}

pub struct NodeConnection {
    connector: Arc<dyn Connector>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ConnectionState>,
    metrics: ConnectionMetrics,
}

impl NodeConnection {
    pub fn new(connector: impl Connector) -> Arc<Self> {
        Self::with_connector(Arc::new(connector))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Arc<Self> {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Arc::new(Self {
            connector,
            inner: Mutex::new(Inner {
                state: ConnectionState::Idle,
                endpoints: Vec::new(),
                index: 0,
                outbound: None,
                shutdown: None,
                generation: 0,
                next_id: 1,
                pending: HashMap::new(),
            }),
            state_tx,
            metrics: ConnectionMetrics::new(),
        })
    }

    /// A WebSocket connection seeded with the configured nodes.
    pub fn from_config(config: &ClientConfig) -> Arc<Self> {
        let connection = Self::new(WebSocketConnector);
        connection.add_endpoints(config.nodes.iter().cloned());
        connection
    }

    pub fn add_endpoint(&self, url: impl Into<String>) {
        let url = url.into();
        debug!(url = %url, "endpoint added");
        self.inner.lock().endpoints.push(url);
    }

    pub fn add_endpoints<I, S>(&self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.lock();
        inner.endpoints.extend(urls.into_iter().map(Into::into));
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.inner.lock().endpoints.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state.clone()
    }

    /// Every state transition, starting from the current state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn metrics(&self) -> &ConnectionMetrics {
        &self.metrics
    }

    // -----------------------------------------------------------------------
    // Connecting
    // -----------------------------------------------------------------------

    /// Connect to the first endpoint that accepts, starting at the current
    /// index. Resolves once a session is live (and logged in, if credentials
    /// were given) or every remaining candidate failed.
    ///
    /// The session is then driven by a background task, which also handles
    /// failover after a session loss when `auto_reconnect` is set.
    pub async fn connect(self: &Arc<Self>, options: ConnectOptions) -> Result<(), ConnectionError> {
        let (generation, first) = {
            let mut inner = self.inner.lock();
            if inner.state.is_active() {
                return Err(ConnectionError::AlreadyActive);
            }
            inner.generation += 1;
            let generation = inner.generation;
            if inner.index >= inner.endpoints.len() {
                inner.index = 0;
            }
            match self.begin_attempt(&mut inner) {
                Some(first) => (generation, first),
                None => {
                    let err = self.exhaust(&mut inner);
                    drop(inner);
                    fire(&options, &err);
                    return Err(err);
                }
            }
        };

        let live = self.establish(generation, first, &options).await?;
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(generation, live, options).await });
        Ok(())
    }

    /// Close the live session, fail everything pending with
    /// [`RequestError::ConnectionLost`], and return to `Idle`.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.outbound = None;
        if let Some(shutdown) = inner.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.fail_pending(&mut inner);
        self.metrics.connected.set(0);
        self.transition(&mut inner, ConnectionState::Idle);
        info!("node connection closed");
    }

    /// Mark the current endpoint as being attempted, if one is left.
    fn begin_attempt(&self, inner: &mut Inner) -> Option<(usize, String)> {
        let url = inner.endpoints.get(inner.index)?.clone();
        let index = inner.index;
        self.transition(inner, ConnectionState::Connecting { index, url: url.clone() });
        Some((index, url))
    }

    fn exhaust(&self, inner: &mut Inner) -> ConnectionError {
        self.transition(inner, ConnectionState::Exhausted);
        ConnectionError::OutOfEndpoints {
            tried: inner.endpoints.len(),
        }
    }

    async fn establish(
        &self,
        generation: u64,
        mut attempt: (usize, String),
        options: &ConnectOptions,
    ) -> Result<Live, ConnectionError> {
        loop {
            let (index, url) = attempt;
            debug!(index, url = %url, "connecting");
            let result = self.open(&url, options).await;

            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return Err(ConnectionError::Closed);
            }

            let source = match result {
                Ok(session) => {
                    let (shutdown_tx, shutdown_rx) = oneshot::channel();
                    inner.outbound = Some(session.outbound);
                    inner.shutdown = Some(shutdown_tx);
                    self.metrics.connected.set(1);
                    self.transition(&mut inner, ConnectionState::Connected { url: url.clone() });
                    info!(url = %url, "connected to node");
                    return Ok(Live {
                        url,
                        inbound: session.inbound,
                        shutdown: shutdown_rx,
                    });
                }
                Err(source) => source,
            };

            warn!(url = %url, error = %source, "endpoint failed");
            self.transition(
                &mut inner,
                ConnectionState::Failing {
                    url: url.clone(),
                    reason: source.to_string(),
                },
            );

            if !options.auto_reconnect {
                self.transition(&mut inner, ConnectionState::Exhausted);
                drop(inner);
                let err = ConnectionError::Transport { url, source };
                fire(options, &err);
                return Err(err);
            }

            inner.index = index + 1;
            match self.begin_attempt(&mut inner) {
                Some(next) => {
                    self.metrics.failovers_total.inc();
                    info!(from = %url, to = %next.1, "hopping to next endpoint");
                    attempt = next;
                }
                None => {
                    let err = self.exhaust(&mut inner);
                    drop(inner);
                    warn!("ran out of endpoints");
                    fire(options, &err);
                    return Err(err);
                }
            }
        }
    }

    async fn open(&self, url: &str, options: &ConnectOptions) -> Result<TransportSession, TransportError> {
        let mut session = self.connector.connect(url).await?;
        if let Some((username, password)) = options.login_credentials() {
            self.login(url, &mut session, username, password).await?;
        }
        Ok(session)
    }

    /// Run the login call directly on a fresh session, before it is
    /// published for application requests.
    async fn login(
        &self,
        url: &str,
        session: &mut TransportSession,
        username: &str,
        password: &str,
    ) -> Result<(), TransportError> {
        let handler = Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            id
        };
        let rejected = |reason: String| TransportError::Handshake {
            url: url.to_string(),
            reason,
        };

        session
            .outbound
            .send(handler.to_request(id).to_json())
            .map_err(|_| TransportError::Closed("session ended before login".into()))?;

        while let Some(event) = session.inbound.recv().await {
            match event {
                TransportEvent::Message(text) => match parse_inbound(&text) {
                    Ok(InboundMessage::Response { id: got, outcome }) if got == id => {
                        return match outcome.map(|result| handler.parse(result)) {
                            Ok(Ok(true)) => Ok(()),
                            Ok(Ok(false)) => Err(rejected("credentials refused".into())),
                            Ok(Err(e)) => Err(rejected(e.to_string())),
                            Err(err) => Err(rejected(err.to_string())),
                        };
                    }
                    _ => trace!("ignoring frame during login"),
                },
                TransportEvent::Closed(reason) => {
                    return Err(TransportError::Closed(
                        reason.unwrap_or_else(|| "closed during login".into()),
                    ))
                }
                TransportEvent::Error(reason) => return Err(TransportError::Closed(reason)),
            }
        }
        Err(TransportError::Closed("closed during login".into()))
    }

    // -----------------------------------------------------------------------
    // Session task
    // -----------------------------------------------------------------------

    async fn run(self: Arc<Self>, generation: u64, mut live: Live, options: ConnectOptions) {
        loop {
            let reason = loop {
                tokio::select! {
                    _ = &mut live.shutdown => {
                        debug!(url = %live.url, "session shut down locally");
                        return;
                    }
                    event = live.inbound.recv() => match event {
                        Some(TransportEvent::Message(text)) => self.route(&text),
                        Some(TransportEvent::Closed(reason)) => {
                            break reason.unwrap_or_else(|| "closed by remote".to_string())
                        }
                        Some(TransportEvent::Error(reason)) => break reason,
                        None => break "transport ended".to_string(),
                    },
                }
            };

            match self.session_lost(generation, live.url, reason, &options).await {
                Some(next) => live = next,
                None => return,
            }
        }
    }

    /// Fail in-flight requests, then hop or stop per `auto_reconnect`.
    async fn session_lost(
        &self,
        generation: u64,
        url: String,
        reason: String,
        options: &ConnectOptions,
    ) -> Option<Live> {
        let next = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return None;
            }
            warn!(url = %url, reason = %reason, pending = inner.pending.len(), "session lost");
            inner.outbound = None;
            inner.shutdown = None;
            self.fail_pending(&mut inner);
            self.metrics.connected.set(0);
            self.transition(
                &mut inner,
                ConnectionState::Failing {
                    url: url.clone(),
                    reason: reason.clone(),
                },
            );

            if !options.auto_reconnect {
                None
            } else {
                inner.index += 1;
                match self.begin_attempt(&mut inner) {
                    Some(next) => Some(next),
                    None => {
                        let err = self.exhaust(&mut inner);
                        drop(inner);
                        warn!("ran out of endpoints");
                        fire(options, &err);
                        return None;
                    }
                }
            }
        };

        match next {
            Some(next) => {
                self.metrics.failovers_total.inc();
                info!(from = %url, to = %next.1, "hopping to next endpoint");
                self.establish(generation, next, options).await.ok()
            }
            None => {
                fire(options, &ConnectionError::Lost { url, reason });
                None
            }
        }
    }

    fn route(&self, text: &str) {
        match parse_inbound(text) {
            Ok(InboundMessage::Response { id, outcome }) => {
                let sender = {
                    let mut inner = self.inner.lock();
                    let sender = inner.pending.remove(&id);
                    self.metrics.pending_requests.set(inner.pending.len() as i64);
                    sender
                };
                let Some(sender) = sender else {
                    self.metrics.stale_responses_total.inc();
                    debug!(id, "dropping response for unknown request id");
                    return;
                };
                self.metrics.responses_received_total.inc();
                if outcome.is_err() {
                    self.metrics.node_errors_total.inc();
                }
                // The caller may have stopped waiting; the outcome is discarded.
                let _ = sender.send(outcome.map_err(RequestError::Node));
            }
            Ok(InboundMessage::Notice { method, .. }) => debug!(method = %method, "ignoring notice"),
            Err(e) => warn!(error = %e, "unroutable frame"),
        }
    }

    fn fail_pending(&self, inner: &mut Inner) {
        let lost = inner.pending.len();
        for (_, sender) in inner.pending.drain() {
            let _ = sender.send(Err(RequestError::ConnectionLost));
        }
        if lost > 0 {
            self.metrics.requests_lost_total.inc_by(lost as u64);
            debug!(lost, "failed in-flight requests");
        }
        self.metrics.pending_requests.set(0);
    }

    fn transition(&self, inner: &mut Inner, state: ConnectionState) {
        debug!(state = %state, "connection state");
        inner.state = state.clone();
        self.state_tx.send_replace(state);
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Assign an id, register it, and write the request. The returned
    /// [`PendingResponse`] resolves exactly once.
    pub fn submit<H: RequestHandler>(&self, handler: H) -> Result<PendingResponse<H>, DispatchError> {
        let mut inner = self.inner.lock();
        let outbound = match (&inner.state, &inner.outbound) {
            (ConnectionState::Connected { .. }, Some(outbound)) => outbound.clone(),
            _ => return Err(DispatchError::NotConnected),
        };

        let id = inner.next_id;
        inner.next_id += 1;
        if inner.pending.contains_key(&id) {
            return Err(DispatchError::DuplicateRequestId(id));
        }

        let (tx, rx) = oneshot::channel();
        inner.pending.insert(id, tx);
        if outbound.send(handler.to_request(id).to_json()).is_err() {
            inner.pending.remove(&id);
            return Err(DispatchError::NotConnected);
        }

        self.metrics.requests_dispatched_total.inc();
        self.metrics.pending_requests.set(inner.pending.len() as i64);
        trace!(id, api = %handler.api(), method = handler.method(), "request sent");
        Ok(PendingResponse { id, handler, rx })
    }

    /// Submit and wait for the typed result.
    pub async fn dispatch<H: RequestHandler>(&self, handler: H) -> Result<H::Output, RequestError> {
        self.submit(handler)?.wait().await
    }
}

impl fmt::Debug for NodeConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("NodeConnection")
            .field("state", &inner.state)
            .field("endpoints", &inner.endpoints)
            .field("index", &inner.index)
            .field("pending", &inner.pending.len())
            .finish()
    }
}

fn fire(options: &ConnectOptions, err: &ConnectionError) {
    if let Some(hook) = &options.on_fatal_error {
        hook(err);
    }
}

// ---------------------------------------------------------------------------
// Pending Response
// ---------------------------------------------------------------------------

/// A request that has been written and awaits its single terminal outcome.
/// Dropping it abandons the result; the connection still clears the id when
/// the response arrives.
pub struct PendingResponse<H: RequestHandler> {
    id: u64,
    handler: H,
    rx: oneshot::Receiver<Outcome>,
}

impl<H: RequestHandler> PendingResponse<H> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn wait(self) -> Result<H::Output, RequestError> {
        let result = self.rx.await.map_err(|_| RequestError::ConnectionLost)??;
        self.handler.parse(result).map_err(|e| RequestError::Decode {
            method: self.handler.method(),
            reason: e.to_string(),
        })
    }
}

impl<H: RequestHandler> fmt::Debug for PendingResponse<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResponse")
            .field("id", &self.id)
            .field("method", &self.handler.method())
            .finish()
    }
}
