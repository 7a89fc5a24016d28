//! Push gateway: authenticates live connections and delivers frames to them.
//!
//! Each live connection owns a bounded outbox (`mpsc`). The transport task
//! (WebSocket or SSE) drains the outbox through its [`PushSession`]; the
//! gateway only ever `try_send`s into it, so delivery never waits on a slow
//! client.
//!
//! Connection lifecycle:
//!
//! ```text
//! Connecting --authenticate ok--> Active --drop PushSession--> Closed
//!      |
//!      +--authenticate err--> Rejected (never registered)
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use dadaba_core::defaults::{PUSH_OUTBOX_CAPACITY, PUSH_PING_INTERVAL_SECS};
use dadaba_core::{
    ConnectionId, CredentialVerifier, Error, Identity, PushMessage, Result, SessionRegistry,
};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Push gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Capacity of each connection's outbox.
    pub outbox_capacity: usize,
    /// WebSocket keepalive ping interval in seconds.
    pub ping_interval_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: PUSH_OUTBOX_CAPACITY,
            ping_interval_secs: PUSH_PING_INTERVAL_SECS,
        }
    }
}

impl GatewayConfig {
    /// Read `PUSH_OUTBOX_CAPACITY` and `PUSH_PING_INTERVAL_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            outbox_capacity: std::env::var("PUSH_OUTBOX_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.outbox_capacity),
            ping_interval_secs: std::env::var("PUSH_PING_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.ping_interval_secs),
        }
    }

    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity.max(1);
        self
    }
}

// =============================================================================
// DELIVERY
// =============================================================================

/// Outcome of one delivery call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections targeted at the instant of the call.
    pub targeted: usize,
    /// Frames enqueued on an outbox.
    pub enqueued: usize,
    /// Frames dropped because the outbox was full.
    pub dropped: usize,
    /// Connections found dead and removed from the registry.
    pub closed: usize,
}

/// Destination for push frames. Implemented by [`PushGateway`]; the fan-out
/// only depends on this.
pub trait PushSink: Send + Sync {
    /// Send `message` to every live connection in `group`.
    fn deliver_to_group(&self, group: &str, message: &PushMessage) -> DeliveryReport;

    /// Send `message` to every live connection opened by `user_id`.
    fn deliver_to_user(&self, user_id: Uuid, message: &PushMessage) -> DeliveryReport;
}

// =============================================================================
// GATEWAY
// =============================================================================

struct GatewayInner {
    registry: SessionRegistry,
    outboxes: DashMap<ConnectionId, mpsc::Sender<PushMessage>>,
    verifier: Arc<dyn CredentialVerifier>,
    config: GatewayConfig,
}

/// Terminates live push connections. Cheap to clone.
#[derive(Clone)]
pub struct PushGateway {
    inner: Arc<GatewayInner>,
}

impl std::fmt::Debug for PushGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushGateway")
            .field("config", &self.inner.config)
            .field("live_connections", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

impl PushGateway {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, config: GatewayConfig) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                registry: SessionRegistry::new(),
                outboxes: DashMap::new(),
                verifier,
                config,
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Live connections currently in `group`.
    pub fn members_of(&self, group: &str) -> Vec<ConnectionId> {
        self.inner.registry.members_of(group)
    }

    /// Live connections held by one user.
    pub fn connections_for_user(&self, user_id: Uuid) -> Vec<ConnectionId> {
        self.inner.registry.connections_for_user(user_id)
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.inner.registry.contains(connection_id)
    }

    /// Number of live connections.
    pub fn live_connections(&self) -> usize {
        self.inner.registry.len()
    }

    /// Verify a handshake credential. Nothing is registered here.
    pub async fn authenticate(&self, credential: &str) -> Result<Identity> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(Error::Unauthorized("Missing credential".to_string()));
        }
        self.inner.verifier.verify(credential).await
    }

    /// Authenticate and, on success, open an Active session.
    pub async fn connect(&self, credential: &str) -> Result<PushSession> {
        match self.authenticate(credential).await {
            Ok(identity) => Ok(self.open(identity)),
            Err(e) => {
                debug!(
                    subsystem = "notify",
                    component = "gateway",
                    op = "authenticate",
                    error = %e,
                    "Push connection rejected"
                );
                Err(e)
            }
        }
    }

    /// Register a session for an already verified identity.
    pub fn open(&self, identity: Identity) -> PushSession {
        let connection_id = ConnectionId::next();
        let (tx, rx) = mpsc::channel(self.inner.config.outbox_capacity);

        self.inner.outboxes.insert(connection_id, tx);
        self.inner
            .registry
            .register(connection_id, identity.user_id, identity.role);

        info!(
            subsystem = "notify",
            component = "gateway",
            op = "open",
            connection_id = %connection_id,
            user_id = %identity.user_id,
            role = %identity.role,
            active = self.inner.registry.len(),
            "Push connection opened"
        );

        PushSession {
            connection_id,
            identity,
            receiver: rx,
            gateway: self.clone(),
        }
    }

    /// Remove a connection from the outbox table and the registry. Idempotent.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        self.inner.outboxes.remove(&connection_id);
        if let Some(session) = self.inner.registry.unregister(connection_id) {
            info!(
                subsystem = "notify",
                component = "gateway",
                op = "close",
                connection_id = %connection_id,
                user_id = %session.user_id,
                active = self.inner.registry.len(),
                "Push connection closed"
            );
        }
    }

    /// Send `message` to every member of `group` at the instant of the call.
    pub fn deliver(&self, group: &str, message: &PushMessage) -> DeliveryReport {
        let targets = self.inner.registry.members_of(group);
        let report = self.deliver_to(&targets, message);
        debug!(
            subsystem = "notify",
            component = "gateway",
            op = "deliver",
            group,
            delivered = report.enqueued,
            dropped = report.dropped,
            "Group delivery"
        );
        report
    }

    /// Send `message` to every connection opened by `user_id`.
    pub fn deliver_user(&self, user_id: Uuid, message: &PushMessage) -> DeliveryReport {
        let targets = self.inner.registry.connections_for_user(user_id);
        let report = self.deliver_to(&targets, message);
        debug!(
            subsystem = "notify",
            component = "gateway",
            op = "deliver_user",
            user_id = %user_id,
            delivered = report.enqueued,
            dropped = report.dropped,
            "User delivery"
        );
        report
    }

    fn deliver_to(&self, targets: &[ConnectionId], message: &PushMessage) -> DeliveryReport {
        let mut report = DeliveryReport {
            targeted: targets.len(),
            ..Default::default()
        };

        for &connection_id in targets {
            // The outbox guard must be released before disconnect() touches the map.
            let outcome = self
                .inner
                .outboxes
                .get(&connection_id)
                .map(|tx| tx.try_send(message.clone()));

            match outcome {
                Some(Ok(())) => {
                    report.enqueued += 1;
                    trace!(connection_id = %connection_id, "Frame enqueued");
                }
                Some(Err(TrySendError::Full(_))) => {
                    report.dropped += 1;
                    warn!(
                        subsystem = "notify",
                        component = "gateway",
                        connection_id = %connection_id,
                        "Outbox full, frame dropped for slow consumer"
                    );
                }
                Some(Err(TrySendError::Closed(_))) | None => {
                    report.closed += 1;
                    warn!(
                        subsystem = "notify",
                        component = "gateway",
                        connection_id = %connection_id,
                        "Connection gone during delivery, unregistering"
                    );
                    self.disconnect(connection_id);
                }
            }
        }
        report
    }
}

impl PushSink for PushGateway {
    fn deliver_to_group(&self, group: &str, message: &PushMessage) -> DeliveryReport {
        self.deliver(group, message)
    }

    fn deliver_to_user(&self, user_id: Uuid, message: &PushMessage) -> DeliveryReport {
        self.deliver_user(user_id, message)
    }
}

// =============================================================================
// SESSION HANDLE
// =============================================================================

/// An Active push connection. Dropping it closes the connection.
pub struct PushSession {
    connection_id: ConnectionId,
    identity: Identity,
    receiver: mpsc::Receiver<PushMessage>,
    gateway: PushGateway,
}

impl PushSession {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Next frame queued for this connection.
    pub async fn recv(&mut self) -> Option<PushMessage> {
        self.receiver.recv().await
    }
}

impl Stream for PushSession {
    type Item = PushMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for PushSession {
    fn drop(&mut self) {
        self.gateway.disconnect(self.connection_id);
    }
}

impl std::fmt::Debug for PushSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushSession")
            .field("connection_id", &self.connection_id)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
