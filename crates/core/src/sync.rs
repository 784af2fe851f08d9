//! One-shot synchronization of the bond catalog with the upstream export.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogRecord, CatalogStore};
use crate::config::SyncConfig;
use crate::delta::DeltaFinder;
use crate::error::SyncError;
use crate::resolver::{ChocolateIndex, OwnerResolver, Resolution};
use crate::servant_cache::ServantCache;
use crate::upstream::UpstreamSource;

/// An item that was new upstream but produced no record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedItem {
    pub id: u32,
    pub reason: String,
}

/// Summary of a sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub previous_watermark: u32,
    pub new_watermark: u32,
    /// New ids found by the delta, in processing order.
    pub discovered: Vec<u32>,
    pub added: Vec<CatalogRecord>,
    pub skipped: Vec<SkippedItem>,
    /// Whether the catalog was rewritten.
    pub written: bool,
}

impl SyncReport {
    pub fn has_changes(&self) -> bool {
        self.written
    }
}

/// Drives a sync run: load, fetch, diff, resolve, append, save.
pub struct BondSynchronizer {
    config: SyncConfig,
    source: Arc<dyn UpstreamSource>,
    cache: Arc<ServantCache>,
    store: Arc<dyn CatalogStore>,
}

impl BondSynchronizer {
    pub fn new(
        config: SyncConfig,
        source: Arc<dyn UpstreamSource>,
        cache: Arc<ServantCache>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            config,
            source,
            cache,
            store,
        }
    }

    /// Run one sync.
    ///
    /// The catalog is written at most once, and only when at least one new
    /// record was resolved.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();

        let mut snapshot = self.store.load()?;
        let previous_watermark = snapshot.watermark;
        info!(
            "Catalog loaded: {} records, watermark {}",
            snapshot.len(),
            previous_watermark
        );

        let items = self.source.fetch_all_items().await?;
        debug!("Upstream export: {} items", items.len());

        let discovered = DeltaFinder::new(self.config.bond_flag.as_str()).find_new_ids(
            &items,
            &snapshot.known_ids,
            snapshot.watermark,
        );

        if discovered.is_empty() {
            info!("No new bond craft essences");
            return Ok(SyncReport {
                started_at,
                finished_at: Utc::now(),
                previous_watermark,
                new_watermark: previous_watermark,
                discovered,
                added: Vec::new(),
                skipped: Vec::new(),
                written: false,
            });
        }

        info!("Found {} new bond craft essences", discovered.len());

        let resolver = OwnerResolver::new(
            Arc::clone(&self.source),
            Arc::clone(&self.cache),
            ChocolateIndex::build(&items, &self.config.choco_flag),
        );

        let mut added = Vec::new();
        let mut skipped = Vec::new();
        let delay = self.config.item_delay();

        for &id in &discovered {
            match resolver.resolve(id).await? {
                Resolution::Resolved(record) => {
                    info!(
                        "Processed CE {}: {} (choco CE: {:?})",
                        record.id, record.owner, record.choco_id
                    );
                    added.push(record);
                }
                Resolution::Skipped(reason) => {
                    warn!("Skipped CE {}: {}", id, reason);
                    skipped.push(SkippedItem {
                        id,
                        reason: reason.to_string(),
                    });
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let written = !added.is_empty();
        if written {
            snapshot.append(added.iter().cloned());
            self.store.save(&snapshot.records)?;
            info!("Added {} new entries", added.len());
        } else {
            info!("No entries could be resolved, catalog left untouched");
        }

        Ok(SyncReport {
            started_at,
            finished_at: Utc::now(),
            previous_watermark,
            new_watermark: snapshot.watermark,
            discovered,
            added,
            skipped,
            written,
        })
    }
}
