use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bondsync_core::{
    load_config, load_config_or_default, validate_config, AtlasClient, BondSynchronizer,
    CatalogStore, JsonCatalogStore, ServantCache, UpstreamSource,
};

/// Config file used when `BONDSYNC_CONFIG` is not set
const DEFAULT_CONFIG_PATH: &str = "bondsync.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // An explicitly named config file must exist; the default one is optional
    let config = match std::env::var("BONDSYNC_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
        Err(_) => load_config_or_default(&PathBuf::from(DEFAULT_CONFIG_PATH))
            .context("Failed to load default configuration")?,
    };

    validate_config(&config).context("Configuration validation failed")?;

    info!("Catalog path: {:?}", config.catalog.path);
    info!("Servant cache path: {:?}", config.servant_cache.path);

    let source: Arc<dyn UpstreamSource> = Arc::new(
        AtlasClient::new(&config.upstream).context("Failed to create upstream client")?,
    );
    let cache = Arc::new(ServantCache::new(
        &config.servant_cache,
        Arc::clone(&source),
    ));
    let store: Arc<dyn CatalogStore> = Arc::new(JsonCatalogStore::new(&config.catalog.path));

    let synchronizer = BondSynchronizer::new(config.sync.clone(), source, cache, store);
    let report = synchronizer.run().await.context("Sync failed")?;

    if report.has_changes() {
        info!(
            "Update complete. Added {} new entries (watermark {} -> {})",
            report.added.len(),
            report.previous_watermark,
            report.new_watermark
        );
    } else {
        info!("Update complete. No changes made.");
    }

    if !report.skipped.is_empty() {
        info!("{} new items could not be resolved", report.skipped.len());
    }

    Ok(())
}
