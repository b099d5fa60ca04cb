//! Room store and lifecycle management for the Parlor broker.
//!
//! Owns the set of active rooms and their participant lists, and enforces
//! the room lifecycle:
//!
//! ```text
//! non-existent → active(≥1 participant) → dormant(0, pending expiry) → deleted
//!                        ↑                        │
//!                        └──────── rejoin ────────┘
//! ```
//!
//! The store is a pure state machine — it performs no I/O and holds no
//! channels. The router consults the updates it returns to decide which
//! broadcasts to emit.
//!
//! # Key types
//!
//! - [`RoomStore`] — creates, mutates, and expires rooms
//! - [`Room`] — one named group of connections
//! - [`RoomConfig`] — empty-room grace policy
//! - [`JoinUpdate`] / [`LeaveUpdate`] — what the router needs to broadcast

mod config;
mod error;
mod store;

pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use store::{JoinUpdate, LeaveUpdate, Room, RoomStore};
