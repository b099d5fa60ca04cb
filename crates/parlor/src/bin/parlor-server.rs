//! Standalone Parlor broker binary.
//!
//! Configuration via environment: `PORT` (default 8080) and `RUST_LOG`
//! for log filtering.

use parlor::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let server = BrokerServer::builder()
        .bind(&format!("0.0.0.0:{port}"))
        .build()
        .await?;

    tracing::info!(addr = %server.local_addr()?, "parlor broker listening");
    server.run().await?;
    Ok(())
}
