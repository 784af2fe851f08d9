//! Mock upstream for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::upstream::{ItemDetail, UpstreamError, UpstreamItem, UpstreamSource};

use super::fixtures;

/// A recorded upstream call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedUpstreamCall {
    FetchAllItems,
    FetchItemDetail { collection_no: u32 },
    DownloadServantExport,
}

/// Mock implementation of the UpstreamSource trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable export rows, details and servant export bodies
/// - Track calls for assertions
/// - Simulate failures per endpoint
#[derive(Debug, Default)]
pub struct MockUpstream {
    items: Arc<RwLock<Vec<UpstreamItem>>>,
    details: Arc<RwLock<HashMap<u32, ItemDetail>>>,
    servant_export: Arc<RwLock<Vec<u8>>>,
    calls: Arc<RwLock<Vec<RecordedUpstreamCall>>>,
    fail_items: Arc<RwLock<bool>>,
    failing_details: Arc<RwLock<HashSet<u32>>>,
    fail_export: Arc<RwLock<bool>>,
}

impl MockUpstream {
    /// Create a new mock with an empty export and servant export.
    pub fn new() -> Self {
        Self {
            servant_export: Arc::new(RwLock::new(b"[]".to_vec())),
            ..Default::default()
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set the craft essence export.
    pub async fn set_items(&self, items: Vec<UpstreamItem>) {
        *self.items.write().await = items;
    }

    /// Set the detail record returned for an item.
    pub async fn set_detail(&self, collection_no: u32, detail: ItemDetail) {
        self.details.write().await.insert(collection_no, detail);
    }

    /// Set the servant export body from `(id, name, face)` rows.
    pub async fn set_servant_export(&self, rows: &[(u32, &str, &str)]) {
        *self.servant_export.write().await = fixtures::servant_export_json(rows);
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Make the export fetch fail.
    pub async fn fail_items(&self, fail: bool) {
        *self.fail_items.write().await = fail;
    }

    /// Make the detail request for one item fail.
    pub async fn fail_detail(&self, collection_no: u32) {
        self.failing_details.write().await.insert(collection_no);
    }

    /// Make servant export downloads fail.
    pub async fn fail_servant_export(&self, fail: bool) {
        *self.fail_export.write().await = fail;
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedUpstreamCall> {
        self.calls.read().await.clone()
    }

    /// Number of detail requests made.
    pub async fn detail_requests(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedUpstreamCall::FetchItemDetail { .. }))
            .count()
    }

    /// Number of servant export downloads attempted.
    pub async fn export_downloads(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedUpstreamCall::DownloadServantExport))
            .count()
    }

    async fn record(&self, call: RecordedUpstreamCall) {
        self.calls.write().await.push(call);
    }
}

fn unavailable() -> UpstreamError {
    UpstreamError::ApiError {
        status: 503,
        message: "mock upstream failure".to_string(),
    }
}

#[async_trait]
impl UpstreamSource for MockUpstream {
    async fn fetch_all_items(&self) -> Result<Vec<UpstreamItem>, UpstreamError> {
        self.record(RecordedUpstreamCall::FetchAllItems).await;

        if *self.fail_items.read().await {
            return Err(unavailable());
        }
        Ok(self.items.read().await.clone())
    }

    async fn fetch_item_detail(&self, collection_no: u32) -> Result<ItemDetail, UpstreamError> {
        self.record(RecordedUpstreamCall::FetchItemDetail { collection_no })
            .await;

        if self.failing_details.read().await.contains(&collection_no) {
            return Err(unavailable());
        }
        self.details
            .read()
            .await
            .get(&collection_no)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(format!("equip {}", collection_no)))
    }

    async fn download_servant_export(&self, dest: &Path) -> Result<u64, UpstreamError> {
        self.record(RecordedUpstreamCall::DownloadServantExport).await;

        if *self.fail_export.read().await {
            return Err(unavailable());
        }
        let body = self.servant_export.read().await.clone();
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}
