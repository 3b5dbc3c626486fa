//! # Chat Hub
//!
//! Multi-user chat backend.
//!
//! This is the application entry point that initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - Storage (PostgreSQL pool or the in-process store)
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use chat_hub::config::Settings;
use chat_hub::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment and config files
    let settings = Settings::load()?;

    // Initialize tracing subscriber for structured logging
    chat_hub::telemetry::init_tracing(&settings.environment);

    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!(addr = %application.local_addr()?, "Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
