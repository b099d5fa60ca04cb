//! The room store: every active room and its participant list.

use std::collections::HashMap;
use std::time::Instant;

use parlor_protocol::{
    ConnectionId, Participant, RoomId, RoomSnapshot, RoomSummary,
};
use rand::Rng;

use crate::{RoomConfig, RoomError, RoomPhase};

/// A named group of connections exchanging signaling traffic.
///
/// Participants are kept in join order; the first remaining participant is
/// the deterministic host-succession choice.
#[derive(Debug)]
pub struct Room {
    room_id: RoomId,
    title: String,
    host_id: ConnectionId,
    participants: Vec<Participant>,
    phase: RoomPhase,
}

impl Room {
    /// The room's unique id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// The participant currently designated host.
    pub fn host_id(&self) -> ConnectionId {
        self.host_id
    }

    /// Current participants in join order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Whether the given connection is a member of this room.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.participants.iter().any(|p| p.id == id)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Full view of the room, as sent to a creator or joiner.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id.clone(),
            title: self.title.clone(),
            host_id: self.host_id,
            participants: self.participants.clone(),
        }
    }

    fn summary(&self) -> RoomSummary {
        let host_name = self
            .participants
            .iter()
            .find(|p| p.id == self.host_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        RoomSummary {
            room_id: self.room_id.clone(),
            title: self.title.clone(),
            host_name,
            participants: self.participants.clone(),
        }
    }
}

/// What the router needs after a successful join.
#[derive(Debug)]
pub struct JoinUpdate {
    /// Snapshot after the join, for the joiner's acknowledgment.
    pub room: RoomSnapshot,
    /// The joiner's membership record, for the `participant_joined`
    /// broadcast.
    pub participant: Participant,
    /// Members other than the joiner, to receive that broadcast.
    pub others: Vec<ConnectionId>,
}

/// What the router needs after a departure.
#[derive(Debug)]
pub struct LeaveUpdate {
    pub room_id: RoomId,
    pub participant_id: ConnectionId,
    /// Members left in the room, in join order.
    pub remaining: Vec<Participant>,
    /// Host after any succession. `None` when the room emptied.
    pub host_id: Option<ConnectionId>,
    /// Whether the departure promoted a new host.
    pub host_changed: bool,
}

/// Owns the set of rooms and enforces their lifecycle.
#[derive(Debug)]
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
    config: RoomConfig,
}

impl RoomStore {
    /// Creates an empty store with the given lifecycle config.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Creates a room with the creator as sole participant and host.
    /// Always succeeds.
    pub fn create_room(
        &mut self,
        title: &str,
        creator: Participant,
    ) -> RoomSnapshot {
        let room_id = generate_room_id();
        let room = Room {
            room_id: room_id.clone(),
            title: title.to_string(),
            host_id: creator.id,
            participants: vec![creator],
            phase: RoomPhase::Active,
        };
        let snapshot = room.snapshot();
        self.rooms.insert(room_id.clone(), room);
        tracing::info!(%room_id, title, "room created");
        snapshot
    }

    /// Adds (or updates) a participant in a room.
    ///
    /// Idempotent per connection: joining twice updates the display name
    /// instead of duplicating the entry. A dormant room is reactivated,
    /// cancelling its pending expiry.
    ///
    /// # Errors
    /// Returns [`RoomError::NotFound`] if the room does not exist. The
    /// caller reports this to the requester only — no broadcast.
    pub fn join_room(
        &mut self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<JoinUpdate, RoomError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        if room.phase.is_dormant() {
            room.phase = RoomPhase::Active;
            tracing::info!(%room_id, "dormant room reactivated");
        }

        // A dormant room has no members; its stale host slot passes to
        // whoever revives it.
        if room.participants.is_empty() {
            room.host_id = participant.id;
        }

        match room.participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => existing.name = participant.name.clone(),
            None => room.participants.push(participant.clone()),
        }

        let others = room
            .participants
            .iter()
            .map(|p| p.id)
            .filter(|id| *id != participant.id)
            .collect();

        tracing::info!(
            %room_id,
            participant = %participant.id,
            members = room.participants.len(),
            "participant joined"
        );

        Ok(JoinUpdate {
            room: room.snapshot(),
            participant,
            others,
        })
    }

    /// Removes a participant from a room.
    ///
    /// Returns `None` when the room does not exist or the connection was
    /// not a member (a no-op by contract). Handles host succession and
    /// the emptied-room transition.
    pub fn leave_room(
        &mut self,
        room_id: &RoomId,
        id: ConnectionId,
    ) -> Option<LeaveUpdate> {
        let room = self.rooms.get_mut(room_id)?;
        let before = room.participants.len();
        room.participants.retain(|p| p.id != id);
        if room.participants.len() == before {
            return None;
        }

        let mut host_changed = false;
        if room.host_id == id {
            // Earliest-joined remaining participant becomes host.
            if let Some(next) = room.participants.first() {
                room.host_id = next.id;
                host_changed = true;
                tracing::info!(%room_id, new_host = %next.id, "host succession");
            }
        }

        let update = LeaveUpdate {
            room_id: room_id.clone(),
            participant_id: id,
            remaining: room.participants.clone(),
            host_id: if room.participants.is_empty() {
                None
            } else {
                Some(room.host_id)
            },
            host_changed,
        };

        tracing::info!(
            %room_id,
            participant = %id,
            members = room.participants.len(),
            "participant left"
        );

        if room.participants.is_empty() {
            match self.config.empty_grace {
                None => {
                    self.rooms.remove(room_id);
                    tracing::info!(%room_id, "empty room deleted");
                }
                Some(_) => {
                    room.phase = RoomPhase::Dormant {
                        since: Instant::now(),
                    };
                    tracing::info!(%room_id, "empty room dormant, pending expiry");
                }
            }
        }

        Some(update)
    }

    /// Force-deletes a room on behalf of its host.
    ///
    /// Host-only: a request from anyone else (or for a nonexistent room)
    /// is a silent no-op returning `None`. On success returns the member
    /// ids to receive the `room_closed` notice before eviction.
    pub fn close_room(
        &mut self,
        room_id: &RoomId,
        requester: ConnectionId,
    ) -> Option<Vec<ConnectionId>> {
        let room = self.rooms.get(room_id)?;
        if room.host_id != requester {
            tracing::debug!(%room_id, %requester, "close_room from non-host ignored");
            return None;
        }

        let room = self.rooms.remove(room_id)?;
        let members = room.participants.iter().map(|p| p.id).collect();
        tracing::info!(%room_id, "room closed by host");
        Some(members)
    }

    /// Directory projection of all listed (active) rooms. Dormant rooms
    /// are omitted but remain joinable until they expire.
    pub fn summaries(&self) -> Vec<RoomSummary> {
        self.rooms
            .values()
            .filter(|r| r.phase.is_listed())
            .map(Room::summary)
            .collect()
    }

    /// Deletes rooms that have been dormant past the grace window.
    /// Called from the periodic sweep; returns the expired room ids.
    pub fn expire_dormant(&mut self) -> Vec<RoomId> {
        let Some(grace) = self.config.empty_grace else {
            return Vec::new();
        };

        let mut expired = Vec::new();
        self.rooms.retain(|room_id, room| {
            if let RoomPhase::Dormant { since } = room.phase {
                if since.elapsed() >= grace {
                    expired.push(room_id.clone());
                    return false;
                }
            }
            true
        });

        for room_id in &expired {
            tracing::info!(%room_id, "dormant room expired");
        }
        expired
    }

    /// Looks up a room.
    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Number of rooms, dormant included.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms exist.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Generates an opaque random 32-character hex room id (128 bits).
fn generate_room_id() -> RoomId {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    RoomId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the store. Time-dependent behavior (grace expiry)
    //! is tested with a zero grace (expires on the next sweep) or an
    //! hour-long grace (never expires during the test) instead of sleeps.

    use std::time::Duration;

    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId(id)
    }

    fn part(id: u64, name: &str) -> Participant {
        Participant {
            id: cid(id),
            name: name.into(),
        }
    }

    /// Emptied rooms are deleted on the spot.
    fn store_immediate() -> RoomStore {
        RoomStore::new(RoomConfig { empty_grace: None })
    }

    /// Emptied rooms go dormant and expire on the next sweep.
    fn store_instant_expiry() -> RoomStore {
        RoomStore::new(RoomConfig {
            empty_grace: Some(Duration::ZERO),
        })
    }

    /// Emptied rooms go dormant and effectively never expire.
    fn store_long_grace() -> RoomStore {
        RoomStore::new(RoomConfig {
            empty_grace: Some(Duration::from_secs(3600)),
        })
    }

    // =====================================================================
    // create_room()
    // =====================================================================

    #[test]
    fn test_create_room_creator_is_sole_participant_and_host() {
        let mut store = store_long_grace();
        let snap = store.create_room("standup", part(1, "ana"));

        assert_eq!(snap.host_id, cid(1));
        assert_eq!(snap.participants, vec![part(1, "ana")]);
        assert_eq!(snap.room_id.0.len(), 32);
    }

    #[test]
    fn test_create_room_ids_are_unique() {
        let mut store = store_long_grace();
        let a = store.create_room("a", part(1, "ana"));
        let b = store.create_room("b", part(2, "bo"));
        assert_ne!(a.room_id, b.room_id);
        assert_eq!(store.len(), 2);
    }

    // =====================================================================
    // join_room()
    // =====================================================================

    #[test]
    fn test_join_room_not_found_mutates_nothing() {
        let mut store = store_long_grace();
        store.create_room("t", part(1, "ana"));

        let result =
            store.join_room(&RoomId("missing".into()), part(2, "bo"));

        assert!(matches!(result, Err(RoomError::NotFound(_))));
        assert_eq!(store.len(), 1);
        let only = store.summaries();
        assert_eq!(only[0].participants.len(), 1);
    }

    #[test]
    fn test_join_room_appends_participant_and_reports_others() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));

        let update = store.join_room(&snap.room_id, part(2, "bo")).unwrap();

        assert_eq!(update.room.participants.len(), 2);
        assert_eq!(update.participant, part(2, "bo"));
        assert_eq!(update.others, vec![cid(1)]);
        // Host is unchanged by a join.
        assert_eq!(update.room.host_id, cid(1));
    }

    #[test]
    fn test_join_room_twice_updates_name_without_duplicating() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));
        store.join_room(&snap.room_id, part(2, "bo")).unwrap();

        let update =
            store.join_room(&snap.room_id, part(2, "bob")).unwrap();

        assert_eq!(update.room.participants.len(), 2);
        assert_eq!(update.room.participants[1], part(2, "bob"));
    }

    #[test]
    fn test_no_duplicate_ids_across_join_sequences() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));
        for _ in 0..3 {
            store.join_room(&snap.room_id, part(2, "bo")).unwrap();
            store.join_room(&snap.room_id, part(3, "cy")).unwrap();
        }

        let room = store.get(&snap.room_id).unwrap();
        let mut ids: Vec<u64> =
            room.participants().iter().map(|p| p.id.0).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), room.participants().len());
    }

    // =====================================================================
    // leave_room()
    // =====================================================================

    #[test]
    fn test_leave_room_non_member_is_noop() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));

        assert!(store.leave_room(&snap.room_id, cid(9)).is_none());
        assert!(
            store
                .leave_room(&RoomId("missing".into()), cid(1))
                .is_none()
        );
    }

    #[test]
    fn test_leave_room_keeps_host_when_non_host_leaves() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));
        store.join_room(&snap.room_id, part(2, "bo")).unwrap();

        let update = store.leave_room(&snap.room_id, cid(2)).unwrap();

        assert!(!update.host_changed);
        assert_eq!(update.host_id, Some(cid(1)));
        assert_eq!(update.remaining, vec![part(1, "ana")]);
    }

    #[test]
    fn test_host_leaving_promotes_earliest_joined_remaining() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));
        store.join_room(&snap.room_id, part(2, "bo")).unwrap();
        store.join_room(&snap.room_id, part(3, "cy")).unwrap();

        let update = store.leave_room(&snap.room_id, cid(1)).unwrap();

        assert!(update.host_changed);
        assert_eq!(update.host_id, Some(cid(2)));
        assert_eq!(update.remaining.len(), 2);
        assert_eq!(store.get(&snap.room_id).unwrap().host_id(), cid(2));
    }

    #[test]
    fn test_last_leave_deletes_immediately_without_grace() {
        let mut store = store_immediate();
        let snap = store.create_room("t", part(1, "ana"));

        let update = store.leave_room(&snap.room_id, cid(1)).unwrap();

        assert_eq!(update.host_id, None);
        assert!(update.remaining.is_empty());
        assert!(store.get(&snap.room_id).is_none());
        // Unreachable by join afterwards.
        assert!(store.join_room(&snap.room_id, part(2, "bo")).is_err());
    }

    #[test]
    fn test_last_leave_goes_dormant_with_grace() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));

        store.leave_room(&snap.room_id, cid(1)).unwrap();

        let room = store.get(&snap.room_id).expect("still exists");
        assert!(room.phase().is_dormant());
        // Dormant rooms are unlisted.
        assert!(store.summaries().is_empty());
    }

    #[test]
    fn test_rejoin_before_expiry_reactivates_dormant_room() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));
        store.leave_room(&snap.room_id, cid(1)).unwrap();

        let update = store.join_room(&snap.room_id, part(2, "bo")).unwrap();

        assert_eq!(update.room.participants, vec![part(2, "bo")]);
        assert!(store.get(&snap.room_id).unwrap().phase().is_listed());
        // A later sweep must not delete the reactivated room.
        assert!(store.expire_dormant().is_empty());
        assert!(store.get(&snap.room_id).is_some());
    }

    #[test]
    fn test_expire_dormant_deletes_after_grace() {
        let mut store = store_instant_expiry();
        let snap = store.create_room("t", part(1, "ana"));
        store.leave_room(&snap.room_id, cid(1)).unwrap();

        let expired = store.expire_dormant();

        assert_eq!(expired, vec![snap.room_id.clone()]);
        assert!(store.get(&snap.room_id).is_none());
        assert!(store.join_room(&snap.room_id, part(2, "bo")).is_err());
    }

    #[test]
    fn test_expire_dormant_skips_rooms_within_grace() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));
        store.leave_room(&snap.room_id, cid(1)).unwrap();

        assert!(store.expire_dormant().is_empty());
        assert!(store.get(&snap.room_id).is_some());
    }

    #[test]
    fn test_reemptied_room_restarts_its_grace() {
        // Dormant → rejoin → empty again: the second dormancy gets its
        // own window, and one sweep deletes it exactly once.
        let mut store = store_instant_expiry();
        let snap = store.create_room("t", part(1, "ana"));
        store.leave_room(&snap.room_id, cid(1)).unwrap();
        store.join_room(&snap.room_id, part(2, "bo")).unwrap();
        store.leave_room(&snap.room_id, cid(2)).unwrap();

        assert_eq!(store.expire_dormant().len(), 1);
        assert!(store.expire_dormant().is_empty());
    }

    // =====================================================================
    // close_room()
    // =====================================================================

    #[test]
    fn test_close_room_by_host_evicts_all_members() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));
        store.join_room(&snap.room_id, part(2, "bo")).unwrap();

        let members = store.close_room(&snap.room_id, cid(1)).unwrap();

        assert_eq!(members, vec![cid(1), cid(2)]);
        assert!(store.get(&snap.room_id).is_none());
    }

    #[test]
    fn test_close_room_by_non_host_is_silent_noop() {
        let mut store = store_long_grace();
        let snap = store.create_room("t", part(1, "ana"));
        store.join_room(&snap.room_id, part(2, "bo")).unwrap();

        assert!(store.close_room(&snap.room_id, cid(2)).is_none());
        assert!(store.get(&snap.room_id).is_some());
    }

    #[test]
    fn test_close_room_unknown_room_is_silent_noop() {
        let mut store = store_long_grace();
        assert!(store.close_room(&RoomId("missing".into()), cid(1)).is_none());
    }

    // =====================================================================
    // summaries()
    // =====================================================================

    #[test]
    fn test_summaries_carry_host_name() {
        let mut store = store_long_grace();
        let snap = store.create_room("standup", part(1, "ana"));
        store.join_room(&snap.room_id, part(2, "bo")).unwrap();
        store.leave_room(&snap.room_id, cid(1)).unwrap();

        let summaries = store.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "standup");
        // Succession is reflected in the directory.
        assert_eq!(summaries[0].host_name, "bo");
    }
}
