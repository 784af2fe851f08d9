use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Display metadata for a servant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
}

/// Servant id to display metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerMap {
    pub(super) owners: HashMap<u32, OwnerMetadata>,
}

impl OwnerMap {
    pub fn get(&self, owner_id: u32) -> Option<&OwnerMetadata> {
        self.owners.get(&owner_id)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
