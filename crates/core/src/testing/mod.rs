//! Testing utilities: a mock upstream and fixture builders.
//!
//! # Example
//!
//! ```rust,ignore
//! use bondsync_core::testing::{fixtures, MockUpstream};
//!
//! let upstream = MockUpstream::new();
//! upstream.set_items(vec![fixtures::bond_item(180)]).await;
//! upstream.set_detail(180, fixtures::detail(OwnerReference::Id(100100))).await;
//! upstream.set_servant_export(&[(100100, "Artoria Pendragon", "https://x/a.png")]).await;
//! ```

mod mock_upstream;

pub use mock_upstream::{MockUpstream, RecordedUpstreamCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::upstream::{ItemDetail, OwnerReference, UpstreamItem};

    pub const BOND_FLAG: &str = "svtEquipFriendShip";
    pub const CHOCO_FLAG: &str = "svtEquipChocolate";

    /// An export row with the given flag and no valentine owner.
    pub fn upstream_item(collection_no: u32, flag: &str) -> UpstreamItem {
        UpstreamItem {
            collection_no,
            flag: flag.to_string(),
            valentine_equip_owner: None,
        }
    }

    /// A bond craft essence export row.
    pub fn bond_item(collection_no: u32) -> UpstreamItem {
        upstream_item(collection_no, BOND_FLAG)
    }

    /// A valentine chocolate export row belonging to `owner`.
    pub fn choco_item(collection_no: u32, owner: u32) -> UpstreamItem {
        UpstreamItem {
            valentine_equip_owner: Some(owner),
            ..upstream_item(collection_no, CHOCO_FLAG)
        }
    }

    /// A detail record with the given owner reference.
    pub fn detail(owner: OwnerReference) -> ItemDetail {
        ItemDetail {
            bond_equip_owner: Some(owner),
        }
    }

    /// A detail record with `bondEquipOwner` missing.
    pub fn no_owner_detail() -> ItemDetail {
        ItemDetail::default()
    }

    /// Servant export body for `(id, name, face)` rows.
    pub fn servant_export_json(rows: &[(u32, &str, &str)]) -> Vec<u8> {
        let rows: Vec<serde_json::Value> = rows
            .iter()
            .map(|(id, name, face)| {
                serde_json::json!({
                    "id": id,
                    "collectionNo": id % 1000,
                    "name": name,
                    "face": face,
                })
            })
            .collect();
        serde_json::to_vec(&rows).unwrap_or_default()
    }
}
