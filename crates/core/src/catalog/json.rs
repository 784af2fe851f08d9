//! JSON file backed catalog store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::persist::write_atomic;

use super::{CatalogError, CatalogSnapshot, CatalogStore, StoredRecord};

/// Catalog stored as a pretty-printed JSON array.
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> Result<CatalogSnapshot, CatalogError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Catalog {:?} does not exist yet, starting empty", self.path);
                return Ok(CatalogSnapshot::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let records: Vec<StoredRecord> =
            serde_json::from_slice(&bytes).map_err(|e| CatalogError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        debug!("Loaded {} catalog records from {:?}", records.len(), self.path);
        Ok(CatalogSnapshot::from_records(records))
    }

    fn save(&self, records: &[StoredRecord]) -> Result<(), CatalogError> {
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;

        write_atomic(&self.path, &json).map_err(|e| self.io_error(e))?;

        debug!("Saved {} catalog records to {:?}", records.len(), self.path);
        Ok(())
    }
}
