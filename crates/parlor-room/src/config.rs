//! Room configuration and the per-room lifecycle phase.

use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for room lifecycle behavior.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long an emptied room survives before it is deleted by the
    /// sweep. `None` selects the immediate-delete policy: the room is
    /// removed the moment its last participant leaves.
    ///
    /// Default: 120 seconds. A rejoin within the window cancels the
    /// pending deletion.
    pub empty_grace: Option<Duration>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            empty_grace: Some(Duration::from_secs(120)),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room that currently exists.
///
/// ```text
/// Active ──(last participant leaves)──→ Dormant ──(grace elapses)──→ deleted
///    ↑                                     │
///    └─────────────(rejoin)────────────────┘
/// ```
///
/// Deletion is sweep-based: the sweep only removes rooms still `Dormant`
/// past the grace window, so a rejoin that flips the phase back to
/// `Active` makes any pending expiry a no-op rather than a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// The room has at least one participant.
    Active,

    /// The room emptied at the given instant and is pending expiry.
    /// Unlisted in the directory but still joinable.
    Dormant { since: Instant },
}

impl RoomPhase {
    /// Whether the room appears in directory listings.
    pub fn is_listed(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether the room is pending expiry.
    pub fn is_dormant(&self) -> bool {
        matches!(self, Self::Dormant { .. })
    }
}
