//! Wire types for Atlas Academy responses.

use serde::{Deserialize, Serialize};

/// One row of the craft essence export.
///
/// Only the fields the sync needs are modelled; everything else in the
/// export is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamItem {
    /// Category-local sequential number.
    pub collection_no: u32,
    /// Category tag, e.g. `svtEquipFriendShip`.
    #[serde(default)]
    pub flag: String,
    /// Servant a valentine chocolate belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valentine_equip_owner: Option<u32>,
}

/// Detail record of a single craft essence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_equip_owner: Option<OwnerReference>,
}

/// The shapes `bondEquipOwner` shows up in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OwnerReference {
    Id(i64),
    Text(String),
    Embedded(EmbeddedOwner),
    /// Anything else (floats, booleans, arrays). Never resolves.
    Other(serde_json::Value),
}

/// An owner embedded as an object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedOwner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_no: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl OwnerReference {
    /// Normalize to a servant id.
    ///
    /// Zero, negative and non-numeric values are treated as "no owner". For
    /// embedded objects `id` wins over `collectionNo`; `name` alone does not
    /// identify an owner.
    pub fn owner_id(&self) -> Option<u32> {
        match self {
            Self::Id(raw) => positive_id(*raw),
            Self::Text(text) => text.trim().parse::<i64>().ok().and_then(positive_id),
            Self::Embedded(owner) => owner
                .id
                .and_then(positive_id)
                .or_else(|| owner.collection_no.and_then(positive_id)),
            Self::Other(_) => None,
        }
    }
}

fn positive_id(raw: i64) -> Option<u32> {
    u32::try_from(raw).ok().filter(|id| *id != 0)
}

/// One row of the servant export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServantSummary {
    /// Raw id; see [`ServantSummary::servant_id`].
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub face: Option<String>,
}

impl ServantSummary {
    /// The row's id as a servant id. Integers and numeric strings are
    /// accepted; anything else (or out of range) yields `None`.
    pub fn servant_id(&self) -> Option<u32> {
        match &self.id {
            serde_json::Value::Number(n) => n.as_u64().and_then(|id| u32::try_from(id).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
