//! Connection registry for the Parlor broker.
//!
//! Tracks every live connection's session state — display name, current
//! room, and the outbound channel used to reach it. This is deliberately a
//! side-table keyed by [`ConnectionId`](parlor_protocol::ConnectionId):
//! nothing is ever attached to the transport object itself.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is not thread-safe by itself — it uses a plain
//! `HashMap` and is guarded by the broker's single state lock at a higher
//! level, together with the room store and pairing queue.

mod registry;

pub use registry::{ConnectionEntry, ConnectionRegistry, OutboundSender};
