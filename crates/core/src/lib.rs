pub mod catalog;
pub mod config;
pub mod delta;
pub mod error;
mod persist;
pub mod resolver;
pub mod servant_cache;
pub mod sync;
pub mod testing;
pub mod upstream;

pub use catalog::{
    CatalogError, CatalogRecord, CatalogSnapshot, CatalogStore, JsonCatalogStore, StoredRecord,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, CatalogConfig,
    Config, ConfigError, ServantCacheConfig, SyncConfig, UpstreamConfig,
};
pub use delta::DeltaFinder;
pub use error::SyncError;
pub use resolver::{ChocolateIndex, OwnerResolver, Resolution, SkipReason};
pub use servant_cache::{CacheError, OwnerMap, OwnerMetadata, ServantCache};
pub use sync::{BondSynchronizer, SkippedItem, SyncReport};
pub use upstream::{
    AtlasClient, EmbeddedOwner, ItemDetail, OwnerReference, ServantSummary, UpstreamError,
    UpstreamItem, UpstreamSource,
};
