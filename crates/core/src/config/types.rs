use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub servant_cache: ServantCacheConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Local bond catalog file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("src/data/bond_ces.json")
}

/// Atlas Academy endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Full craft essence export (every flag).
    #[serde(default = "default_equip_export_url")]
    pub equip_export_url: String,
    /// Per-item detail endpoint, `{id}` is replaced by the collection number.
    #[serde(default = "default_equip_detail_url")]
    pub equip_detail_url: String,
    /// Servant export used for owner display metadata.
    #[serde(default = "default_servant_export_url")]
    pub servant_export_url: String,
    /// Timeout for list and detail requests, in seconds (default: 15)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Timeout for the streamed servant export, in seconds (default: 30)
    #[serde(default = "default_export_timeout")]
    pub export_timeout_secs: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            equip_export_url: default_equip_export_url(),
            equip_detail_url: default_equip_detail_url(),
            servant_export_url: default_servant_export_url(),
            timeout_secs: default_timeout(),
            export_timeout_secs: default_export_timeout(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_secs))
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.export_timeout_secs))
    }
}

fn default_equip_export_url() -> String {
    "https://api.atlasacademy.io/export/JP/basic_equip_lang_en.json".to_string()
}

fn default_equip_detail_url() -> String {
    "https://api.atlasacademy.io/nice/JP/equip/{id}".to_string()
}

fn default_servant_export_url() -> String {
    "https://api.atlasacademy.io/export/JP/basic_servant_lang_en.json".to_string()
}

fn default_timeout() -> u32 {
    15
}

fn default_export_timeout() -> u32 {
    30
}

/// On-disk servant export cache
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServantCacheConfig {
    #[serde(default = "default_servant_cache_path")]
    pub path: PathBuf,
    /// Freshness window in seconds, checked against the file mtime (default: 24h)
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// Re-download even when the cached file is fresh.
    #[serde(default)]
    pub force_refresh: bool,
}

impl Default for ServantCacheConfig {
    fn default() -> Self {
        Self {
            path: default_servant_cache_path(),
            ttl_secs: default_ttl(),
            force_refresh: false,
        }
    }
}

impl ServantCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_servant_cache_path() -> PathBuf {
    PathBuf::from("basic_servant_lang_en.json")
}

fn default_ttl() -> u64 {
    60 * 60 * 24
}

/// Delta and resolution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Category tag of bond craft essences.
    #[serde(default = "default_bond_flag")]
    pub bond_flag: String,
    /// Category tag of valentine chocolate craft essences.
    #[serde(default = "default_choco_flag")]
    pub choco_flag: String,
    /// Pause after every item resolution, in milliseconds (default: 500)
    #[serde(default = "default_item_delay")]
    pub item_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bond_flag: default_bond_flag(),
            choco_flag: default_choco_flag(),
            item_delay_ms: default_item_delay(),
        }
    }
}

impl SyncConfig {
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

fn default_bond_flag() -> String {
    "svtEquipFriendShip".to_string()
}

fn default_choco_flag() -> String {
    "svtEquipChocolate".to_string()
}

fn default_item_delay() -> u64 {
    500
}
