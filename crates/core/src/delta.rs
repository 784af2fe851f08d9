//! Which upstream bond craft essences are not in the catalog yet.

use std::collections::HashSet;

use crate::upstream::UpstreamItem;

/// Computes new ids for one category of the upstream export.
#[derive(Debug, Clone)]
pub struct DeltaFinder {
    flag: String,
}

impl DeltaFinder {
    pub fn new(flag: impl Into<String>) -> Self {
        Self { flag: flag.into() }
    }

    /// Ids of items tagged with this finder's flag that are above `watermark`
    /// and not in `known_ids`, in ascending order without duplicates.
    ///
    /// Both checks are needed: the watermark skips the bulk of the export
    /// cheaply, the set catches ids that are above it but were recorded
    /// out of order.
    pub fn find_new_ids(
        &self,
        items: &[UpstreamItem],
        known_ids: &HashSet<u32>,
        watermark: u32,
    ) -> Vec<u32> {
        let mut ids: Vec<u32> = items
            .iter()
            .filter(|item| item.flag == self.flag)
            .map(|item| item.collection_no)
            .collect();
        ids.sort_unstable();
        ids.dedup();

        ids.retain(|id| *id > watermark && !known_ids.contains(id));
        ids
    }
}
