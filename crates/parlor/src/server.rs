//! `BrokerServer` builder and accept loop.
//!
//! This is the entry point for running a Parlor broker. It ties together
//! all the layers: transport → protocol → registry → rooms → pairing.

use std::sync::Arc;
use std::time::Duration;

use parlor_pairing::PairingQueue;
use parlor_registry::ConnectionRegistry;
use parlor_room::{RoomConfig, RoomStore};
use parlor_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::BrokerError;
use crate::handler::handle_connection;
use crate::router;

/// All broker state, guarded by a single lock.
///
/// Every inbound envelope (and the periodic sweep) runs to completion
/// under this lock: one mutation, one consistent set of sends, before the
/// next envelope anywhere is processed. At signaling scale the lock is
/// never contended enough to matter.
pub(crate) struct BrokerShared {
    pub(crate) registry: ConnectionRegistry,
    pub(crate) rooms: RoomStore,
    pub(crate) pairing: PairingQueue,
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) shared: Mutex<BrokerShared>,
}

/// Builder for configuring and starting a Parlor broker.
///
/// # Example
///
/// ```rust,ignore
/// use parlor::prelude::*;
///
/// let server = BrokerServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct BrokerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    sweep_interval: Duration,
}

impl BrokerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            sweep_interval: Duration::from_secs(2),
        }
    }

    /// Sets the address to bind the broker to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets how long an emptied room survives before expiry. `None`
    /// deletes emptied rooms immediately.
    pub fn empty_room_grace(mut self, grace: Option<Duration>) -> Self {
        self.room_config.empty_grace = grace;
        self
    }

    /// Sets the interval of the background sweep that expires dormant
    /// rooms and prunes the pairing queue.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Binds the transport and assembles the broker.
    pub async fn build(self) -> Result<BrokerServer, BrokerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            shared: Mutex::new(BrokerShared {
                registry: ConnectionRegistry::new(),
                rooms: RoomStore::new(self.room_config),
                pairing: PairingQueue::new(),
            }),
        });

        Ok(BrokerServer {
            transport,
            state,
            sweep_interval: self.sweep_interval,
        })
    }
}

impl Default for BrokerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Parlor broker.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BrokerServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    sweep_interval: Duration,
}

impl BrokerServer {
    /// Creates a new builder.
    pub fn builder() -> BrokerBuilder {
        BrokerBuilder::new()
    }

    /// Returns the local address the broker is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the broker: spawns the periodic sweep, then accepts
    /// connections until the process is terminated. Each connection gets
    /// its own handler task.
    pub async fn run(mut self) -> Result<(), BrokerError> {
        tracing::info!("Parlor broker running");

        let sweep_state = Arc::clone(&self.state);
        let sweep_interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut shared = sweep_state.shared.lock().await;
                router::sweep(&mut shared);
            }
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
