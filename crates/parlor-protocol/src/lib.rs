//! Wire protocol for the Parlor session broker.
//!
//! This crate defines the language that clients and the broker speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], ids and room
//!   projections) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! The protocol layer sits between the transport (raw frames) and the
//! router (membership and delivery decisions). It knows nothing about
//! connections or rooms beyond their identifiers.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientMessage, ConnectionId, Participant, RoomId, RoomSnapshot,
    RoomSummary, ServerMessage,
};
