//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .context("Failed to initialize telemetry")?;

    tracing::info!(
        environment = %config.environment(),
        repository = %config.video_repository(),
        "Configuration loaded and validated successfully"
    );

    let videos = database::setup_repository(&config).await?;
    let (storage, assets) = storage::setup_storage(&config).await?;
    let state = services::initialize_services(&config, videos, storage, assets).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
