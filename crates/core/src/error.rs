use thiserror::Error;

use crate::catalog::CatalogError;
use crate::servant_cache::CacheError;
use crate::upstream::UpstreamError;

/// Conditions that abort a sync run.
///
/// Per-item problems never show up here; they are reported as skipped items.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to fetch the craft essence export: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Servant cache error: {0}")]
    ServantCache(#[from] CacheError),
}
