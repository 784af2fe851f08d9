//! Bond catalog - the locally persisted list of already known bond craft essences.
//!
//! The catalog is loaded once per run, grows only by appending the records
//! discovered in that run, and is written back in one piece.

mod json;
mod types;

pub use json::JsonCatalogStore;
pub use types::*;

/// Trait for bond catalog storage.
pub trait CatalogStore: Send + Sync {
    /// Load the current catalog.
    ///
    /// A missing store is the first-run case and yields an empty snapshot.
    /// A store that exists but cannot be decoded is an error, never an
    /// empty catalog.
    fn load(&self) -> Result<CatalogSnapshot, CatalogError>;

    /// Replace the stored catalog with `records`.
    fn save(&self, records: &[StoredRecord]) -> Result<(), CatalogError>;
}
