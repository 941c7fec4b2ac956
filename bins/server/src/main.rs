//! mediarelay upload server
//!
//! Accepts multipart uploads, relays them to the configured media provider
//! and serves the built client.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediarelay_api::{AppState, RouterOptions, create_router};
use mediarelay_core::provider;
use mediarelay_core::upload::{TempStore, UploadService};
use mediarelay_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediarelay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let provider = provider::from_config(&config.provider)
        .context("Failed to configure media provider")?;
    info!(
        provider = provider.name(),
        temp_dir = %config.upload.temp_dir.display(),
        max_file_size = config.upload.max_file_size,
        "Media provider configured"
    );

    let uploads = UploadService::new(
        TempStore::new(&config.upload.temp_dir),
        provider,
        config.upload.max_file_size,
    );
    let state = AppState {
        uploads: Arc::new(uploads),
    };

    let app = create_router(state, &RouterOptions::from_config(&config));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
