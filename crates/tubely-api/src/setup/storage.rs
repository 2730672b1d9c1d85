//! Object store and thumbnail asset store setup

use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_storage::{create_storage, LocalStorage, Storage};

/// Returns `(video storage, thumbnail assets)`.
///
/// Thumbnails always live on local disk under `ASSETS_ROOT` and are served
/// back from `/assets`.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Arc<dyn Storage>)> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize video storage")?;

    let assets_url = format!("{}/assets", config.assets_base_url().trim_end_matches('/'));
    let assets = LocalStorage::new(config.assets_root().clone(), assets_url)
        .await
        .context("Failed to initialize assets directory")?;

    tracing::info!(
        backend = %storage.backend_type(),
        assets_root = %config.assets_root().display(),
        "Storage initialized"
    );

    Ok((storage, Arc::new(assets)))
}
