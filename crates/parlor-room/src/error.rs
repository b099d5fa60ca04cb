//! Error types for the room layer.

use parlor_protocol::RoomId;

/// Errors that can occur during room operations.
///
/// Deliberately small: leaving a room you are not in and closing a room
/// you do not host are silent no-ops by contract, not errors.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never did, or already expired).
    #[error("room {0} not found")]
    NotFound(RoomId),
}
