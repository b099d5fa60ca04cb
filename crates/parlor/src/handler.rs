//! Per-connection handler: registration, writer task, and the read loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register the connection with an outbound channel
//!   2. Spawn a writer task draining that channel into the socket
//!   3. Loop: receive envelopes → decode → dispatch under the broker lock
//!   4. On exit (clean close, error, or panic) run lifecycle cleanup once

use std::sync::Arc;

use parlor_protocol::{ClientMessage, Codec, ConnectionId, JsonCodec};
use parlor_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::BrokerError;
use crate::router;
use crate::server::ServerState;

/// Drop guard that runs lifecycle cleanup when the handler exits.
///
/// This ensures cleanup happens even if the handler panics, and exactly
/// once. Since `Drop` is synchronous, we spawn a fire-and-forget task for
/// the async lock.
struct ConnectionGuard {
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut shared = state.shared.lock().await;
            router::handle_disconnect(&mut shared, conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), BrokerError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, mut rx) = mpsc::unbounded_channel();
    {
        let mut shared = state.shared.lock().await;
        shared.registry.register(conn_id, tx);
    }
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    // Writer task: drains the outbound queue into the socket. Ends when
    // the registry entry (holding the sender) is removed, or on the
    // first failed send.
    let conn = Arc::new(conn);
    let writer_conn = Arc::clone(&conn);
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let bytes = match JsonCodec.encode(&msg) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "encode failed");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
        // Dropping rx closes the channel; `is_open` on the registry
        // entry turns false from this point.
    });

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        // Malformed or unknown envelopes are skipped, never fatal.
        let msg: ClientMessage = match JsonCodec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "ignoring bad envelope");
                continue;
            }
        };

        let mut shared = state.shared.lock().await;
        router::dispatch(&mut shared, conn_id, msg);
    }

    // _guard drops here → lifecycle cleanup fires.
    Ok(())
}
