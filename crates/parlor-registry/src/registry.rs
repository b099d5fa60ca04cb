//! The registry: one entry per live connection.

use std::collections::HashMap;

use parlor_protocol::{ConnectionId, RoomId, ServerMessage};
use tokio::sync::mpsc;

/// Channel sender for delivering outbound messages to a connection's
/// writer task. Unbounded so routing never blocks on a slow peer.
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;

/// Session state for a single live connection.
#[derive(Debug)]
pub struct ConnectionEntry {
    id: ConnectionId,
    /// Display name supplied by the peer (via create_room/join_room).
    pub display_name: Option<String>,
    /// The room this connection is currently in, if any. Exclusive: a
    /// connection is in at most one room at a time.
    pub room: Option<RoomId>,
    sender: OutboundSender,
}

impl ConnectionEntry {
    /// The connection's immutable id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the connection's transport is still open, checked via the
    /// outbound channel: the writer task drops its receiver when the
    /// socket goes away.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queues a message for delivery. Fire-and-forget: a closed peer is
    /// silently skipped.
    pub fn send(&self, msg: ServerMessage) {
        let _ = self.sender.send(msg);
    }
}

/// Tracks each live connection's identity and session state.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Registers a freshly accepted connection.
    ///
    /// Called once per accept, before any envelope is processed. Ids are
    /// assigned by the transport from a process-lifetime counter, so a
    /// collision here would be a bug upstream.
    pub fn register(&mut self, id: ConnectionId, sender: OutboundSender) {
        let previous = self.connections.insert(
            id,
            ConnectionEntry {
                id,
                display_name: None,
                room: None,
                sender,
            },
        );
        debug_assert!(previous.is_none(), "duplicate connection id {id}");
        tracing::info!(%id, total = self.connections.len(), "connection registered");
    }

    /// Removes a connection. Called exactly once, at close, after
    /// lifecycle cleanup has run.
    pub fn unregister(&mut self, id: ConnectionId) {
        if self.connections.remove(&id).is_some() {
            tracing::info!(%id, total = self.connections.len(), "connection unregistered");
        }
    }

    /// Looks up a connection's entry.
    pub fn get(&self, id: ConnectionId) -> Option<&ConnectionEntry> {
        self.connections.get(&id)
    }

    /// The room a connection is currently in, if any.
    pub fn room_of(&self, id: ConnectionId) -> Option<RoomId> {
        self.connections.get(&id).and_then(|e| e.room.clone())
    }

    /// Points a connection at a room (or clears it with `None`).
    pub fn set_room(&mut self, id: ConnectionId, room: Option<RoomId>) {
        if let Some(entry) = self.connections.get_mut(&id) {
            entry.room = room;
        }
    }

    /// Records the peer-supplied display name.
    pub fn set_name(&mut self, id: ConnectionId, name: &str) {
        if let Some(entry) = self.connections.get_mut(&id) {
            entry.display_name = Some(name.to_string());
        }
    }

    /// Queues a message for one connection, skipping closed or unknown
    /// targets.
    pub fn send_to(&self, id: ConnectionId, msg: ServerMessage) {
        if let Some(entry) = self.connections.get(&id) {
            if entry.is_open() {
                entry.send(msg);
            }
        }
    }

    /// Iterates over all registered connections, for global broadcasts.
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionEntry> {
        self.connections.values()
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
