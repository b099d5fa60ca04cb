//! Anonymous speaker/client pairing for the Parlor broker.
//!
//! Connections enter one of two FIFO queues: speakers announcing
//! availability and clients requesting a conversation. Matching is eager:
//! a request scans the counterpart queue for the oldest live entry and
//! either pairs with it or waits. Pairings are one-to-one and independent
//! of rooms.
//!
//! Like the room store, this crate is a pure state machine. Liveness of
//! a candidate is decided by a caller-supplied predicate, and all sends
//! happen in the router.

mod queue;

pub use queue::{PairingOutcome, PairingQueue};
