//! Transport abstraction for the Parlor broker.
//!
//! The broker consumes an ordered, reliable, message-framed duplex channel
//! per remote peer. [`Transport`] accepts such channels; [`Connection`] is
//! one of them. The default implementation is WebSocket via
//! `tokio-tungstenite` (behind the `websocket` feature, on by default).
//!
//! Connection ids are assigned here, once per accept, from a
//! process-lifetime counter — no two connections ever share an id.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use parlor_protocol::ConnectionId;

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single accepted connection that can send and receive framed messages.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one message to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// The identifier assigned to this connection at accept time.
    fn id(&self) -> ConnectionId;
}
