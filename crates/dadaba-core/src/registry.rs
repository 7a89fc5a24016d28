//! In-memory registry of live push connections.
//!
//! Every authenticated push connection is tracked here together with the
//! identity it was opened with. Connections of administrative users are also
//! members of the [`ADMINS_GROUP`] broadcast group. The registry is shared by
//! the connection handlers (register/unregister) and the fan-out path
//! (membership lookups), so it is built on [`DashMap`] and never blocks.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::models::Role;

/// Broadcast group joined by every administrative connection.
pub const ADMINS_GROUP: &str = "admins";

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one live push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh identifier.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A registered connection and the identity it authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSession {
    pub connection_id: ConnectionId,
    pub user_id: Uuid,
    pub role: Role,
    pub connected_at: DateTime<Utc>,
}

impl LiveSession {
    /// Groups this session belongs to, derived from its role.
    pub fn groups(&self) -> Vec<&'static str> {
        if self.role.is_administrative() {
            vec![ADMINS_GROUP]
        } else {
            Vec::new()
        }
    }
}

/// Registry of live connections, indexed by id, group, and user.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, LiveSession>,
    groups: DashMap<&'static str, HashSet<ConnectionId>>,
    by_user: DashMap<Uuid, HashSet<ConnectionId>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection for `user_id` and add it to its role's groups.
    ///
    /// Registering an id twice replaces the earlier entry.
    pub fn register(&self, connection_id: ConnectionId, user_id: Uuid, role: Role) -> LiveSession {
        self.unregister(connection_id);

        let session = LiveSession {
            connection_id,
            user_id,
            role,
            connected_at: Utc::now(),
        };

        for group in session.groups() {
            self.groups.entry(group).or_default().insert(connection_id);
        }
        self.by_user.entry(user_id).or_default().insert(connection_id);
        self.sessions.insert(connection_id, session.clone());

        debug!(
            connection_id = %connection_id,
            user_id = %user_id,
            role = %role,
            active = self.sessions.len(),
            "Session registered"
        );
        session
    }

    /// Remove a connection from every index. Idempotent.
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<LiveSession> {
        let (_, session) = self.sessions.remove(&connection_id)?;

        for group in session.groups() {
            if let Some(mut members) = self.groups.get_mut(group) {
                members.remove(&connection_id);
            }
            self.groups.remove_if(group, |_, members| members.is_empty());
        }
        if let Some(mut conns) = self.by_user.get_mut(&session.user_id) {
            conns.remove(&connection_id);
        }
        self.by_user
            .remove_if(&session.user_id, |_, conns| conns.is_empty());

        debug!(
            connection_id = %connection_id,
            user_id = %session.user_id,
            active = self.sessions.len(),
            "Session unregistered"
        );
        Some(session)
    }

    /// Connections currently in `group`.
    pub fn members_of(&self, group: &str) -> Vec<ConnectionId> {
        self.groups
            .get(group)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Connections currently opened by `user_id`.
    pub fn connections_for_user(&self, user_id: Uuid) -> Vec<ConnectionId> {
        self.by_user
            .get(&user_id)
            .map(|conns| conns.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, connection_id: ConnectionId) -> Option<LiveSession> {
        self.sessions.get(&connection_id).map(|s| s.clone())
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.sessions.contains_key(&connection_id)
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
