//! The message router: one dispatch point for every client envelope.
//!
//! All functions here run with the broker lock held and are synchronous,
//! so each envelope's mutations and resulting sends form one atomic unit.
//! Sends are fire-and-forget through the registry; a closed peer is
//! skipped, never waited on.

use parlor_pairing::PairingOutcome;
use parlor_protocol::{
    ClientMessage, ConnectionId, Participant, ServerMessage,
};
use parlor_registry::ConnectionRegistry;
use parlor_room::RoomError;

use crate::server::BrokerShared;

/// Routes one decoded envelope from `sender`.
pub(crate) fn dispatch(
    shared: &mut BrokerShared,
    sender: ConnectionId,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::GetRooms => {
            let rooms = shared.rooms.summaries();
            shared
                .registry
                .send_to(sender, ServerMessage::RoomsList { rooms });
        }

        ClientMessage::CreateRoom { title, host_name } => {
            create_room(shared, sender, &title, &host_name);
        }

        ClientMessage::JoinRoom { room_id, user_name } => {
            join_room(shared, sender, &room_id, &user_name);
        }

        ClientMessage::LeaveRoom => {
            if depart_current_room(shared, sender) {
                broadcast_directory(shared);
            }
        }

        ClientMessage::CloseRoom => close_room(shared, sender),

        ClientMessage::Offer { target_id, payload } => {
            relay(
                shared,
                sender,
                target_id,
                ServerMessage::Offer {
                    sender_id: sender,
                    payload,
                },
            );
        }

        ClientMessage::Answer { target_id, payload } => {
            relay(
                shared,
                sender,
                target_id,
                ServerMessage::Answer {
                    sender_id: sender,
                    payload,
                },
            );
        }

        ClientMessage::IceCandidate { target_id, payload } => {
            relay(
                shared,
                sender,
                target_id,
                ServerMessage::IceCandidate {
                    sender_id: sender,
                    payload,
                },
            );
        }

        ClientMessage::Chat { text } => {
            broadcast_room(
                shared,
                sender,
                ServerMessage::Chat {
                    sender_id: sender,
                    text,
                },
            );
        }

        ClientMessage::ActiveSpeaker {
            participant_id,
            is_active,
        } => {
            broadcast_room(
                shared,
                sender,
                ServerMessage::ActiveSpeaker {
                    participant_id,
                    is_active,
                },
            );
        }

        ClientMessage::RequestPairing => {
            let BrokerShared {
                registry, pairing, ..
            } = shared;
            let outcome =
                pairing.request_pairing(sender, |c| is_open(registry, c));
            deliver_pairing_outcome(shared, sender, outcome);
        }

        ClientMessage::AvailableAsSpeaker => {
            let BrokerShared {
                registry, pairing, ..
            } = shared;
            let outcome =
                pairing.available_as_speaker(sender, |c| is_open(registry, c));
            deliver_pairing_outcome(shared, sender, outcome);
        }

        ClientMessage::EndCall => {
            if let Some(peer) = shared.pairing.end_call(sender) {
                shared.registry.send_to(peer, ServerMessage::CallEnded);
            }
        }
    }
}

/// Lifecycle cleanup for a closed connection. Mirrors an explicit leave
/// plus pairing teardown; runs exactly once per connection.
pub(crate) fn handle_disconnect(shared: &mut BrokerShared, id: ConnectionId) {
    if let Some(entry) = shared.registry.get(id) {
        tracing::info!(
            %id,
            name = entry.display_name.as_deref().unwrap_or("-"),
            "connection closed, running lifecycle cleanup"
        );
    }
    let left_room = depart_current_room(shared, id);
    if let Some(peer) = shared.pairing.remove(id) {
        shared.registry.send_to(peer, ServerMessage::CallEnded);
    }
    shared.registry.unregister(id);
    if left_room {
        broadcast_directory(shared);
    }
}

/// Periodic background pass: expires dormant rooms and drops closed
/// entries from the pairing queue. Runs under the broker lock like any
/// other handler invocation.
pub(crate) fn sweep(shared: &mut BrokerShared) {
    let expired = shared.rooms.expire_dormant();
    if !expired.is_empty() {
        tracing::debug!(count = expired.len(), "expired dormant rooms");
    }

    let BrokerShared {
        registry, pairing, ..
    } = shared;
    pairing.prune(|c| is_open(registry, c));
}

// ---------------------------------------------------------------------------
// Room control
// ---------------------------------------------------------------------------

fn create_room(
    shared: &mut BrokerShared,
    sender: ConnectionId,
    title: &str,
    host_name: &str,
) {
    // One room at a time: creating while in a room leaves the old one
    // first, with the usual departure broadcasts.
    depart_current_room(shared, sender);

    shared.registry.set_name(sender, host_name);
    let creator = Participant {
        id: sender,
        name: host_name.to_string(),
    };
    let room = shared.rooms.create_room(title, creator);
    shared.registry.set_room(sender, Some(room.room_id.clone()));
    shared
        .registry
        .send_to(sender, ServerMessage::RoomCreated { room });
    broadcast_directory(shared);
}

fn join_room(
    shared: &mut BrokerShared,
    sender: ConnectionId,
    room_id: &parlor_protocol::RoomId,
    user_name: &str,
) {
    // Look the target up before the implicit leave: a join that cannot
    // succeed must not disturb the sender's current membership.
    if shared.rooms.get(room_id).is_none() {
        shared.registry.send_to(
            sender,
            ServerMessage::Error {
                message: RoomError::NotFound(room_id.clone()).to_string(),
            },
        );
        return;
    }

    // Rejoining the current room skips the leave; the store treats it
    // as a name update.
    if shared.registry.room_of(sender).as_ref() != Some(room_id) {
        depart_current_room(shared, sender);
    }

    let participant = Participant {
        id: sender,
        name: user_name.to_string(),
    };
    match shared.rooms.join_room(room_id, participant) {
        Ok(update) => {
            shared.registry.set_name(sender, user_name);
            shared.registry.set_room(sender, Some(room_id.clone()));
            shared
                .registry
                .send_to(sender, ServerMessage::RoomJoined { room: update.room });
            for other in update.others {
                shared.registry.send_to(
                    other,
                    ServerMessage::ParticipantJoined {
                        participant: update.participant.clone(),
                    },
                );
            }
            broadcast_directory(shared);
        }
        Err(e) => {
            shared.registry.send_to(
                sender,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            );
        }
    }
}

fn close_room(shared: &mut BrokerShared, sender: ConnectionId) {
    let Some(room_id) = shared.registry.room_of(sender) else {
        return;
    };
    // Non-host requests come back as None and stay silent.
    let Some(members) = shared.rooms.close_room(&room_id, sender) else {
        return;
    };
    for member in members {
        shared.registry.send_to(
            member,
            ServerMessage::RoomClosed {
                room_id: room_id.clone(),
            },
        );
        shared.registry.set_room(member, None);
    }
    broadcast_directory(shared);
}

/// Removes `id` from its current room, if any, notifying the remaining
/// members. Returns whether the directory changed.
fn depart_current_room(shared: &mut BrokerShared, id: ConnectionId) -> bool {
    let Some(room_id) = shared.registry.room_of(id) else {
        return false;
    };
    shared.registry.set_room(id, None);
    let Some(update) = shared.rooms.leave_room(&room_id, id) else {
        return false;
    };

    if let Some(host_id) = update.host_id {
        let notice = ServerMessage::ParticipantLeft {
            participant_id: update.participant_id,
            participants: update.remaining.clone(),
            host_id,
        };
        for participant in &update.remaining {
            shared.registry.send_to(participant.id, notice.clone());
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Relay and room-scoped broadcast
// ---------------------------------------------------------------------------

/// Forwards a signaling message to `target_id`, but only when sender and
/// target are members of the same room. Anything else is dropped without
/// a reply: delivery is best-effort by contract, and cross-room target
/// ids must never resolve.
fn relay(
    shared: &mut BrokerShared,
    sender: ConnectionId,
    target_id: ConnectionId,
    msg: ServerMessage,
) {
    let routable = shared
        .registry
        .room_of(sender)
        .and_then(|room_id| shared.rooms.get(&room_id))
        .is_some_and(|room| room.contains(target_id));

    if routable {
        shared.registry.send_to(target_id, msg);
    } else {
        tracing::debug!(%sender, %target_id, "dropping unroutable relay");
    }
}

/// Delivers a message to every other member of the sender's room. A
/// sender outside any room is a silent no-op.
fn broadcast_room(
    shared: &mut BrokerShared,
    sender: ConnectionId,
    msg: ServerMessage,
) {
    let Some(room_id) = shared.registry.room_of(sender) else {
        tracing::debug!(%sender, "room broadcast from roomless sender dropped");
        return;
    };
    let Some(room) = shared.rooms.get(&room_id) else {
        return;
    };
    for participant in room.participants() {
        if participant.id != sender {
            shared.registry.send_to(participant.id, msg.clone());
        }
    }
}

/// Sends the current directory to every open connection.
fn broadcast_directory(shared: &mut BrokerShared) {
    let msg = ServerMessage::RoomsList {
        rooms: shared.rooms.summaries(),
    };
    for entry in shared.registry.iter() {
        if entry.is_open() {
            entry.send(msg.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Pairing
// ---------------------------------------------------------------------------

fn deliver_pairing_outcome(
    shared: &mut BrokerShared,
    sender: ConnectionId,
    outcome: PairingOutcome,
) {
    match outcome {
        PairingOutcome::Matched { speaker, client } => {
            shared.registry.send_to(
                client,
                ServerMessage::SpeakerConnected { peer_id: speaker },
            );
            shared.registry.send_to(
                speaker,
                ServerMessage::ClientConnected { peer_id: client },
            );
        }
        PairingOutcome::Waiting => {
            shared
                .registry
                .send_to(sender, ServerMessage::WaitingForPeer);
        }
        PairingOutcome::AlreadyActive => {
            tracing::debug!(%sender, "pairing request while already in a call");
        }
    }
}

fn is_open(registry: &ConnectionRegistry, id: ConnectionId) -> bool {
    registry.get(id).is_some_and(|entry| entry.is_open())
}

// =========================================================================
// Tests
// =========================================================================
