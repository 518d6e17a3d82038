//! PA Relay Server
//!
//! Accepts player, controller and master WebSocket connections and relays
//! announcements, playback commands and live audio between them.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pa_relay::config::AppConfig;
use pa_relay::relay::Relay;
use pa_relay::ui::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PA relay");

    let config = AppConfig::load()?;
    if let Some(dir) = &config.server.frontend_dir {
        tracing::info!("Serving operator frontend from {}", dir.display());
    }

    let relay = Arc::new(Relay::new());
    let server = WebServer::new(config.server.clone(), relay);

    server.run().await?;
    Ok(())
}
