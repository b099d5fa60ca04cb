//! The pairing queue: two waiting lines and the set of active calls.

use std::collections::{HashMap, VecDeque};

use parlor_protocol::ConnectionId;

/// Result of a pairing request, from the requester's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingOutcome {
    /// A counterpart was waiting. Both sides of the new call.
    Matched {
        speaker: ConnectionId,
        client: ConnectionId,
    },

    /// No counterpart yet; the requester was enqueued (or already was).
    Waiting,

    /// The requester is already in an active call. The request is
    /// ignored by contract.
    AlreadyActive,
}

/// FIFO matchmaker between speakers and clients.
///
/// Invariants:
/// - a connection appears in at most one waiting queue, never both
/// - a waiting connection is never in an active call, and vice versa
/// - `active` holds both directions of every pairing
#[derive(Debug, Default)]
pub struct PairingQueue {
    waiting_speakers: VecDeque<ConnectionId>,
    waiting_clients: VecDeque<ConnectionId>,
    active: HashMap<ConnectionId, ConnectionId>,
}

impl PairingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client asks for a speaker to talk to.
    ///
    /// Pops waiting speakers until a live one is found; closed entries
    /// encountered on the way are discarded. With no live speaker the
    /// client joins the waiting line. Re-requesting while already
    /// waiting is idempotent; a side switch (previously waiting as a
    /// speaker) moves the connection to the client line.
    pub fn request_pairing<F>(
        &mut self,
        client: ConnectionId,
        is_open: F,
    ) -> PairingOutcome
    where
        F: Fn(ConnectionId) -> bool,
    {
        if self.active.contains_key(&client) {
            return PairingOutcome::AlreadyActive;
        }
        self.dequeue(client);

        match self.pop_live(Side::Speaker, &is_open) {
            Some(speaker) => self.activate(speaker, client),
            None => {
                self.waiting_clients.push_back(client);
                tracing::debug!(%client, "client waiting for a speaker");
                PairingOutcome::Waiting
            }
        }
    }

    /// A speaker announces availability. Mirror of
    /// [`request_pairing`](Self::request_pairing).
    pub fn available_as_speaker<F>(
        &mut self,
        speaker: ConnectionId,
        is_open: F,
    ) -> PairingOutcome
    where
        F: Fn(ConnectionId) -> bool,
    {
        if self.active.contains_key(&speaker) {
            return PairingOutcome::AlreadyActive;
        }
        self.dequeue(speaker);

        match self.pop_live(Side::Client, &is_open) {
            Some(client) => self.activate(speaker, client),
            None => {
                self.waiting_speakers.push_back(speaker);
                tracing::debug!(%speaker, "speaker waiting for a client");
                PairingOutcome::Waiting
            }
        }
    }

    /// Ends the requester's active call.
    ///
    /// Returns the now-former peer so the router can notify them, or
    /// `None` when the requester was not in a call (silent no-op).
    /// Neither side is re-enqueued.
    pub fn end_call(&mut self, conn: ConnectionId) -> Option<ConnectionId> {
        let peer = self.active.remove(&conn)?;
        self.active.remove(&peer);
        tracing::info!(%conn, %peer, "call ended");
        Some(peer)
    }

    /// Removes a disconnecting connection from all pairing state.
    ///
    /// Returns the abandoned peer, if the connection was mid-call.
    pub fn remove(&mut self, conn: ConnectionId) -> Option<ConnectionId> {
        self.dequeue(conn);
        self.end_call(conn)
    }

    /// Drops waiting entries whose connection has closed.
    ///
    /// Active calls are untouched; disconnects dissolve those through
    /// [`remove`](Self::remove).
    pub fn prune<F>(&mut self, is_open: F)
    where
        F: Fn(ConnectionId) -> bool,
    {
        self.waiting_speakers.retain(|c| is_open(*c));
        self.waiting_clients.retain(|c| is_open(*c));
    }

    /// The requester's current call peer, if any.
    pub fn peer_of(&self, conn: ConnectionId) -> Option<ConnectionId> {
        self.active.get(&conn).copied()
    }

    /// Whether the connection is waiting in either queue.
    pub fn is_waiting(&self, conn: ConnectionId) -> bool {
        self.waiting_speakers.contains(&conn)
            || self.waiting_clients.contains(&conn)
    }

    fn activate(
        &mut self,
        speaker: ConnectionId,
        client: ConnectionId,
    ) -> PairingOutcome {
        self.active.insert(speaker, client);
        self.active.insert(client, speaker);
        tracing::info!(%speaker, %client, "pairing matched");
        PairingOutcome::Matched { speaker, client }
    }

    fn dequeue(&mut self, conn: ConnectionId) {
        self.waiting_speakers.retain(|c| *c != conn);
        self.waiting_clients.retain(|c| *c != conn);
    }

    fn pop_live<F>(&mut self, side: Side, is_open: &F) -> Option<ConnectionId>
    where
        F: Fn(ConnectionId) -> bool,
    {
        let queue = match side {
            Side::Speaker => &mut self.waiting_speakers,
            Side::Client => &mut self.waiting_clients,
        };
        while let Some(candidate) = queue.pop_front() {
            if is_open(candidate) {
                return Some(candidate);
            }
            tracing::debug!(%candidate, "dropping closed waiting entry");
        }
        None
    }
}

enum Side {
    Speaker,
    Client,
}

// =========================================================================
// Tests
// =========================================================================
