//! Connection registry
//!
//! Pure bookkeeping of live connections, partitioned by role. Each admitted
//! connection gets an unbounded outbound queue; the registry owns the sender
//! half for the lifetime of the connection, the connection's writer task
//! drains the receiver half.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::protocol::Outbound;

/// Role a connection was admitted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Speaker endpoint rendering commands and relayed audio
    Player,
    /// Operator console issuing playback commands
    Controller,
    /// Live-microphone source able to pre-empt playback
    Master,
}

impl Role {
    /// All roles, in fan-out order
    pub const ALL: [Role; 3] = [Role::Player, Role::Controller, Role::Master];
}

/// Unique identifier of a live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to an admitted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub role: Role,
}

type OutboundSender = UnboundedSender<Outbound>;
type RoleShelf = RwLock<HashMap<ConnectionId, OutboundSender>>;

/// Live connections partitioned into three disjoint role collections.
///
/// A connection id is a member of exactly one collection from admission to
/// removal. Concurrent admit/remove/snapshot calls on the same role
/// serialize on that role's lock; snapshots are defensive copies usable
/// without holding it.
#[derive(Debug, Default)]
pub struct Registry {
    players: RoleShelf,
    controllers: RoleShelf,
    masters: RoleShelf,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn shelf(&self, role: Role) -> &RoleShelf {
        match role {
            Role::Player => &self.players,
            Role::Controller => &self.controllers,
            Role::Master => &self.masters,
        }
    }

    /// Admit a new connection under `role`.
    ///
    /// Admission always succeeds; there are no role capacity limits.
    /// Returns the connection handle and the receiver half of its outbound
    /// queue.
    pub fn admit(&self, role: Role) -> (Connection, UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId(Uuid::new_v4());
        self.shelf(role).write().insert(id, tx);
        (Connection { id, role }, rx)
    }

    /// Remove a connection.
    ///
    /// Idempotent: removing an already-absent connection is a no-op.
    /// Returns whether the connection was present.
    pub fn remove(&self, conn: &Connection) -> bool {
        self.shelf(conn.role).write().remove(&conn.id).is_some()
    }

    /// Point-in-time copy of one role collection.
    ///
    /// The copy may be stale by the time delivery completes; delivery is
    /// best-effort.
    pub fn snapshot(&self, role: Role) -> Vec<(ConnectionId, OutboundSender)> {
        self.shelf(role)
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }

    /// Number of live connections under `role`
    pub fn count(&self, role: Role) -> usize {
        self.shelf(role).read().len()
    }
}
