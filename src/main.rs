use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use merkle_log::api;
use merkle_log::config::AppConfig;
use merkle_log::LogService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merkle_log=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Merkle event log server");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded for server {}", config.server_id);

    // Seed the log; a broken hash engine aborts startup here
    let service = match &config.seed_path {
        Some(path) => LogService::from_file(path),
        None => LogService::empty(),
    }
    .map_err(|e| {
        error!("Failed to initialize log: {}", e);
        e
    })?;

    let head = service.head().await;
    info!("Log initialized: size {}, root {}", head.size, head.root_hash);

    // Build application
    let bind_address = config.bind_address();
    let app = api::router(config, service);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
