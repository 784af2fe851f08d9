//! TTL-gated on-disk cache of the servant export.
//!
//! The export maps servant ids to display metadata. It is large and changes
//! rarely, so it is kept on disk and only re-downloaded once the file's
//! modification time falls outside the freshness window (or a refresh is
//! forced). A failed refresh is tolerated as long as an older copy exists.
//!
//! The parsed map is built at most once per [`ServantCache`] and shared
//! afterwards. The mutex around it makes initialization single-flight.

mod types;

pub use types::*;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ServantCacheConfig;
use crate::persist::scratch_path;
use crate::upstream::{ServantSummary, UpstreamError, UpstreamSource};

#[derive(Debug, Error)]
pub enum CacheError {
    /// Refresh failed and there is no cached copy to fall back on.
    #[error("Servant export refresh failed and no cached copy exists: {0}")]
    Unavailable(#[source] UpstreamError),

    #[error("Failed to access servant cache {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Servant cache {path} is not a valid export: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Owner metadata lookup backed by the cached servant export.
pub struct ServantCache {
    path: PathBuf,
    ttl: Duration,
    source: Arc<dyn UpstreamSource>,
    owners: Mutex<Option<Arc<OwnerMap>>>,
    /// One-shot force flag from configuration, consumed by the first load.
    force_pending: AtomicBool,
}

impl ServantCache {
    pub fn new(config: &ServantCacheConfig, source: Arc<dyn UpstreamSource>) -> Self {
        Self {
            path: config.path.clone(),
            ttl: config.ttl(),
            source,
            owners: Mutex::new(None),
            force_pending: AtomicBool::new(config.force_refresh),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up display metadata for a servant.
    ///
    /// `Ok(None)` means the servant is not in the export, which is a normal
    /// outcome. Errors are only returned when no usable export exists at all
    /// or the cached file cannot be read.
    pub async fn get_owner_metadata(
        &self,
        owner_id: u32,
        force_refresh: bool,
    ) -> Result<Option<OwnerMetadata>, CacheError> {
        let owners = self.owners(force_refresh).await?;
        Ok(owners.get(owner_id).cloned())
    }

    /// The parsed export, loading it on first use.
    pub async fn owners(&self, force_refresh: bool) -> Result<Arc<OwnerMap>, CacheError> {
        let mut guard = self.owners.lock().await;
        let force = self.force_pending.swap(false, Ordering::SeqCst) || force_refresh;

        if !force {
            if let Some(owners) = guard.as_ref() {
                return Ok(Arc::clone(owners));
            }
        }

        self.ensure_file(force).await?;
        let owners = Arc::new(self.read_file().await?);
        debug!("Servant cache loaded: {} owners", owners.len());

        *guard = Some(Arc::clone(&owners));
        Ok(owners)
    }

    /// Make sure a cache file exists, refreshing it when stale or forced.
    async fn ensure_file(&self, force: bool) -> Result<(), CacheError> {
        if !force && self.is_fresh().await {
            debug!("Servant cache {:?} is fresh", self.path);
            return Ok(());
        }

        match self.refresh().await {
            Ok(bytes) => {
                info!("Servant export refreshed ({} bytes)", bytes);
                Ok(())
            }
            Err(e) => {
                if !self.exists().await {
                    return Err(e);
                }
                warn!("Servant export refresh failed, using stale cache: {}", e);
                Ok(())
            }
        }
    }

    /// Download to a scratch file, then rename it over the cache file.
    async fn refresh(&self) -> Result<u64, CacheError> {
        let tmp = scratch_path(&self.path);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let bytes = match self.source.download_servant_export(&tmp).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(CacheError::Unavailable(e));
            }
        };

        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_error(e));
        }

        Ok(bytes)
    }

    async fn is_fresh(&self) -> bool {
        let modified = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.modified(),
            Err(_) => return false,
        };

        match modified {
            Ok(mtime) => is_within_ttl(mtime, SystemTime::now(), self.ttl),
            Err(_) => false,
        }
    }

    async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    async fn read_file(&self) -> Result<OwnerMap, CacheError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        let rows: Vec<ServantSummary> =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        Ok(OwnerMap::from_rows(rows))
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// A timestamp in the future counts as fresh.
fn is_within_ttl(mtime: SystemTime, now: SystemTime, ttl: Duration) -> bool {
    match now.duration_since(mtime) {
        Ok(age) => age < ttl,
        Err(_) => true,
    }
}

impl OwnerMap {
    /// Build the lookup from export rows.
    ///
    /// Rows without a usable id or a name are dropped; a later row with the same id
    /// replaces an earlier one.
    pub fn from_rows(rows: impl IntoIterator<Item = ServantSummary>) -> Self {
        let mut owners = HashMap::new();
        for row in rows {
            let (Some(id), Some(name)) = (row.servant_id(), row.name) else {
                continue;
            };
            owners.insert(id, OwnerMetadata { name, face: row.face });
        }
        Self { owners }
    }
}
