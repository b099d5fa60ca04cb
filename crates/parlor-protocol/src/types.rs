//! Wire types for the Parlor signaling protocol.
//!
//! Every message on the wire is a JSON object with a mandatory snake_case
//! `"type"` tag; the remaining fields are camelCase. The broker never
//! interprets the `payload` of a signaling envelope — it is carried as an
//! opaque [`serde_json::Value`] and forwarded verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for one live connection.
///
/// Assigned once at accept time from a process-lifetime counter and
/// immutable for the connection's life. `#[serde(transparent)]` makes it
/// serialize as a plain number, which is what clients address their
/// `targetId` fields with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A unique identifier for a room.
///
/// Opaque random hex string generated when the room is created. Clients
/// learn room ids from the directory and echo them back in `join_room`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Room projections
// ---------------------------------------------------------------------------

/// A connection's membership record inside a room, as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ConnectionId,
    pub name: String,
}

/// One entry in the room directory (`rooms_list`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub title: String,
    /// Display name of the current host.
    pub host_name: String,
    pub participants: Vec<Participant>,
}

/// Full view of a single room, sent to a participant on create/join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub title: String,
    /// The participant currently designated host (authorized for
    /// `close_room`, subject to succession on departure).
    pub host_id: ConnectionId,
    pub participants: Vec<Participant>,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client may send to the broker.
///
/// An envelope whose `type` is unknown fails to decode and is ignored by
/// the handler — it must never terminate the connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Request the current room directory. Replied to the sender only.
    GetRooms,

    /// Create a room with the sender as sole participant and host.
    CreateRoom { title: String, host_name: String },

    /// Join an existing room. A nonexistent `roomId` yields an `error`
    /// reply to the sender and nothing else.
    JoinRoom { room_id: RoomId, user_name: String },

    /// Leave the current room (no-op when not in one).
    LeaveRoom,

    /// Force-delete the current room. Host-only; a non-host request is a
    /// silent no-op.
    CloseRoom,

    /// Session-description offer, relayed to `targetId` within the
    /// sender's room. The payload is opaque to the broker.
    Offer { target_id: ConnectionId, payload: Value },

    /// Session-description answer, relayed like [`ClientMessage::Offer`].
    Answer { target_id: ConnectionId, payload: Value },

    /// Negotiation candidate, relayed like [`ClientMessage::Offer`].
    IceCandidate { target_id: ConnectionId, payload: Value },

    /// Chat line, broadcast to the other members of the sender's room.
    Chat { text: String },

    /// Active-speaker indicator, broadcast to the other members of the
    /// sender's room.
    ActiveSpeaker { participant_id: ConnectionId, is_active: bool },

    /// Enter the anonymous pairing queue on the client side.
    RequestPairing,

    /// Enter the anonymous pairing queue on the speaker side.
    AvailableAsSpeaker,

    /// Dissolve the sender's active pairing; the peer is notified.
    EndCall,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the broker may send to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Directory snapshot. Sent as a reply to `get_rooms` and broadcast
    /// to every open connection whenever the directory changes.
    RoomsList { rooms: Vec<RoomSummary> },

    /// Acknowledgment to the creator of a room.
    RoomCreated { room: RoomSnapshot },

    /// Acknowledgment to a joiner, carrying the full room snapshot.
    RoomJoined { room: RoomSnapshot },

    /// Broadcast to existing members when someone joins their room.
    ParticipantJoined { participant: Participant },

    /// Broadcast to remaining members when someone leaves their room.
    /// `hostId` reflects any host succession caused by the departure.
    ParticipantLeft {
        participant_id: ConnectionId,
        participants: Vec<Participant>,
        host_id: ConnectionId,
    },

    /// Broadcast to all members of a force-closed room before eviction.
    RoomClosed { room_id: RoomId },

    /// Reported failure of a room-level operation (e.g. joining a room
    /// that does not exist).
    Error { message: String },

    /// Pairing request accepted but no peer is available yet.
    WaitingForPeer,

    /// Sent to the client side of a fresh pairing.
    SpeakerConnected { peer_id: ConnectionId },

    /// Sent to the speaker side of a fresh pairing.
    ClientConnected { peer_id: ConnectionId },

    /// The pairing peer ended the call or disconnected.
    CallEnded,

    /// Relayed offer with the sender's identity attached.
    Offer { sender_id: ConnectionId, payload: Value },

    /// Relayed answer with the sender's identity attached.
    Answer { sender_id: ConnectionId, payload: Value },

    /// Relayed negotiation candidate with the sender's identity attached.
    IceCandidate { sender_id: ConnectionId, payload: Value },

    /// Relayed chat line.
    Chat { sender_id: ConnectionId, text: String },

    /// Relayed active-speaker indicator.
    ActiveSpeaker { participant_id: ConnectionId, is_active: bool },
}

// =========================================================================
// Tests
// =========================================================================
