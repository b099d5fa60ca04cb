//! # Parlor
//!
//! A WebSocket session broker for real-time signaling: named rooms with
//! membership tracking and host succession, targeted relay of
//! offer/answer/candidate envelopes within a room, room and global
//! broadcasts, and an anonymous speaker/client pairing queue.
//!
//! The broker never inspects signaling payloads — it moves opaque JSON
//! between connections according to room membership and pairing state.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BrokerError> {
//!     let server = BrokerServer::builder()
//!         .bind("0.0.0.0:8080")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod router;
mod server;

pub use error::BrokerError;
pub use server::{BrokerBuilder, BrokerServer};

/// Commonly used types, re-exported for one-line imports.
pub mod prelude {
    pub use crate::{BrokerBuilder, BrokerError, BrokerServer};
    pub use parlor_protocol::{
        ClientMessage, ConnectionId, Participant, RoomId, RoomSnapshot,
        RoomSummary, ServerMessage,
    };
    pub use parlor_room::RoomConfig;
}
