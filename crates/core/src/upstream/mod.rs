//! Atlas Academy data source.
//!
//! Three endpoints feed a sync run: the full craft essence export, the
//! per-item detail endpoint (which carries the bond owner reference) and the
//! servant export that backs [`crate::servant_cache::ServantCache`].

mod atlas;
mod types;

pub use atlas::AtlasClient;
pub use types::*;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Failed to write a downloaded body to disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read access to the upstream catalog.
///
/// Implemented by [`AtlasClient`] for real runs and by
/// [`crate::testing::MockUpstream`] in tests.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Fetch the full craft essence export (all categories).
    async fn fetch_all_items(&self) -> Result<Vec<UpstreamItem>, UpstreamError>;

    /// Fetch the detail record of a single craft essence.
    async fn fetch_item_detail(&self, collection_no: u32) -> Result<ItemDetail, UpstreamError>;

    /// Stream the servant export into `dest`, returning the number of bytes written.
    ///
    /// `dest` may be left partially written on failure; callers download to a
    /// scratch path and rename on success.
    async fn download_servant_export(&self, dest: &Path) -> Result<u64, UpstreamError>;
}
