//! Turns a new bond craft essence id into a catalog record.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::CatalogRecord;
use crate::servant_cache::{CacheError, ServantCache};
use crate::upstream::{UpstreamItem, UpstreamSource};

/// Why an item produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Detail request failed or returned an unreadable body.
    DetailUnavailable(String),
    /// The detail carries no usable owner reference.
    NoOwner,
    /// The owner is not in the servant export.
    UnknownOwner(u32),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DetailUnavailable(e) => write!(f, "detail unavailable: {}", e),
            Self::NoOwner => write!(f, "no owner"),
            Self::UnknownOwner(id) => write!(f, "owner {} not in servant export", id),
        }
    }
}

/// Outcome of resolving a single item.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(CatalogRecord),
    Skipped(SkipReason),
}

/// Servant id to the collection number of their valentine chocolate.
///
/// Built once per run; the first chocolate listed for an owner wins.
#[derive(Debug, Clone, Default)]
pub struct ChocolateIndex {
    by_owner: HashMap<u32, u32>,
}

impl ChocolateIndex {
    pub fn build(items: &[UpstreamItem], choco_flag: &str) -> Self {
        let mut by_owner = HashMap::new();
        for item in items.iter().filter(|item| item.flag == choco_flag) {
            if let Some(owner) = item.valentine_equip_owner {
                by_owner.entry(owner).or_insert(item.collection_no);
            }
        }
        Self { by_owner }
    }

    pub fn lookup(&self, owner_id: u32) -> Option<u32> {
        self.by_owner.get(&owner_id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }
}

/// Resolves bond craft essence owners through the detail endpoint and the
/// servant cache.
pub struct OwnerResolver {
    source: Arc<dyn UpstreamSource>,
    cache: Arc<ServantCache>,
    chocolates: ChocolateIndex,
}

impl OwnerResolver {
    pub fn new(
        source: Arc<dyn UpstreamSource>,
        cache: Arc<ServantCache>,
        chocolates: ChocolateIndex,
    ) -> Self {
        Self {
            source,
            cache,
            chocolates,
        }
    }

    /// Resolve one item.
    ///
    /// Only servant cache failures are returned as errors; everything that
    /// concerns this single item becomes [`Resolution::Skipped`].
    pub async fn resolve(&self, collection_no: u32) -> Result<Resolution, CacheError> {
        let detail = match self.source.fetch_item_detail(collection_no).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!("Failed to fetch detail for CE {}: {}", collection_no, e);
                return Ok(Resolution::Skipped(SkipReason::DetailUnavailable(
                    e.to_string(),
                )));
            }
        };

        let Some(owner_id) = detail
            .bond_equip_owner
            .as_ref()
            .and_then(|owner| owner.owner_id())
        else {
            debug!(
                "CE {} has no resolvable owner: {:?}",
                collection_no, detail.bond_equip_owner
            );
            return Ok(Resolution::Skipped(SkipReason::NoOwner));
        };

        let Some(metadata) = self.cache.get_owner_metadata(owner_id, false).await? else {
            warn!(
                "CE {} owner {} is not in the servant export",
                collection_no, owner_id
            );
            return Ok(Resolution::Skipped(SkipReason::UnknownOwner(owner_id)));
        };

        let record = CatalogRecord::new(collection_no, metadata.name)
            .with_face(metadata.face)
            .with_choco_id(self.chocolates.lookup(owner_id));

        Ok(Resolution::Resolved(record))
    }
}
