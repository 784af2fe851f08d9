//! Sync lifecycle integration tests.
//!
//! These tests drive a full run against the mock upstream and a temporary
//! directory: load catalog -> fetch export -> delta -> resolve -> save.

use std::sync::Arc;

use tempfile::TempDir;

use bondsync_core::{
    testing::{fixtures, MockUpstream, RecordedUpstreamCall},
    BondSynchronizer, CatalogRecord, CatalogStore, EmbeddedOwner, JsonCatalogStore,
    OwnerReference, ServantCache, ServantCacheConfig, StoredRecord, SyncConfig, SyncError,
    UpstreamSource,
};

/// Test helper wiring a synchronizer to a mock upstream and temp files.
struct TestHarness {
    upstream: Arc<MockUpstream>,
    store: Arc<JsonCatalogStore>,
    cache_config: ServantCacheConfig,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(JsonCatalogStore::new(
            temp_dir.path().join("data").join("bond_ces.json"),
        ));
        let cache_config = ServantCacheConfig {
            path: temp_dir.path().join("basic_servant_lang_en.json"),
            ..Default::default()
        };

        let upstream = Arc::new(MockUpstream::new());
        upstream
            .set_servant_export(&[
                (800100, "Mash Kyrielight", "https://x/mash.png"),
                (100100, "Artoria Pendragon", "https://x/artoria.png"),
                (100200, "Altera", "https://x/altera.png"),
            ])
            .await;

        Self {
            upstream,
            store,
            cache_config,
            _temp_dir: temp_dir,
        }
    }

    /// A fresh synchronizer, as a new process would build it.
    fn synchronizer(&self) -> BondSynchronizer {
        self.synchronizer_with_delay(0)
    }

    fn synchronizer_with_delay(&self, item_delay_ms: u64) -> BondSynchronizer {
        let source = Arc::clone(&self.upstream) as Arc<dyn UpstreamSource>;
        let cache = Arc::new(ServantCache::new(&self.cache_config, Arc::clone(&source)));
        let config = SyncConfig {
            item_delay_ms,
            ..Default::default()
        };

        BondSynchronizer::new(
            config,
            source,
            cache,
            Arc::clone(&self.store) as Arc<dyn CatalogStore>,
        )
    }

    fn seed_catalog(&self, records: &[CatalogRecord]) {
        let records: Vec<StoredRecord> = records.iter().cloned().map(Into::into).collect();
        self.store.save(&records).expect("Failed to seed catalog");
    }

    fn catalog_bytes(&self) -> Option<Vec<u8>> {
        std::fs::read(self.store.path()).ok()
    }

    async fn standard_upstream(&self) {
        self.upstream
            .set_items(vec![
                fixtures::bond_item(1),
                fixtures::bond_item(2),
                fixtures::upstream_item(3, "normal"),
                fixtures::bond_item(4),
                fixtures::choco_item(530, 100100),
            ])
            .await;
        self.upstream
            .set_detail(1, fixtures::detail(OwnerReference::Id(800100)))
            .await;
        self.upstream
            .set_detail(
                2,
                fixtures::detail(OwnerReference::Embedded(EmbeddedOwner {
                    id: Some(100100),
                    ..Default::default()
                })),
            )
            .await;
        self.upstream
            .set_detail(4, fixtures::detail(OwnerReference::Text("100200".into())))
            .await;
    }
}

#[tokio::test]
async fn test_first_run_builds_catalog() {
    let h = TestHarness::new().await;
    h.standard_upstream().await;

    let report = h.synchronizer().run().await.expect("sync failed");

    assert!(report.written);
    assert_eq!(report.previous_watermark, 0);
    assert_eq!(report.new_watermark, 4);
    assert_eq!(report.discovered, vec![1, 2, 4]);

    let snapshot = h.store.load().unwrap();
    let ids: Vec<u32> = snapshot.records.iter().map(StoredRecord::id).collect();
    assert_eq!(ids, vec![1, 2, 4]);

    assert_eq!(snapshot.records[0].owner(), Some("Mash Kyrielight"));
    assert_eq!(snapshot.records[0].get("choco_id"), None);
    assert_eq!(snapshot.records[1].owner(), Some("Artoria Pendragon"));
    assert_eq!(
        snapshot.records[1].get("face").and_then(|v| v.as_str()),
        Some("https://x/artoria.png")
    );
    assert_eq!(
        snapshot.records[1].get("choco_id").and_then(|v| v.as_u64()),
        Some(530)
    );
    assert_eq!(snapshot.records[2].owner(), Some("Altera"));
}

#[tokio::test]
async fn test_second_run_is_a_noop() {
    let h = TestHarness::new().await;
    h.standard_upstream().await;

    h.synchronizer().run().await.expect("first sync failed");
    let before = h.catalog_bytes().expect("catalog missing");

    let report = h.synchronizer().run().await.expect("second sync failed");

    assert!(!report.written);
    assert!(report.discovered.is_empty());
    assert!(report.added.is_empty());
    assert_eq!(report.new_watermark, report.previous_watermark);
    assert_eq!(h.catalog_bytes().expect("catalog missing"), before);
}

#[tokio::test]
async fn test_incremental_run_appends_in_order() {
    let h = TestHarness::new().await;
    h.seed_catalog(&[
        CatalogRecord::new(5, "Existing A"),
        CatalogRecord::new(6, "Existing B"),
        CatalogRecord::new(9, "Existing C"),
    ]);
    h.upstream
        .set_items((5..=11).map(fixtures::bond_item).collect())
        .await;
    for id in [7, 8, 10, 11] {
        h.upstream
            .set_detail(id, fixtures::detail(OwnerReference::Id(800100)))
            .await;
    }

    let report = h.synchronizer().run().await.expect("sync failed");

    // 7 and 8 are below the watermark and never requested.
    assert_eq!(report.discovered, vec![10, 11]);
    assert_eq!(h.upstream.detail_requests().await, 2);

    let snapshot = h.store.load().unwrap();
    let ids: Vec<u32> = snapshot.records.iter().map(StoredRecord::id).collect();
    assert_eq!(ids, vec![5, 6, 9, 10, 11]);
    assert!(report.new_watermark >= report.previous_watermark);
    assert_eq!(snapshot.watermark, 11);
}

#[tokio::test]
async fn test_unresolvable_items_are_skipped() {
    let h = TestHarness::new().await;
    h.upstream
        .set_items((1..=5).map(fixtures::bond_item).collect())
        .await;
    h.upstream
        .set_detail(1, fixtures::detail(OwnerReference::Id(800100)))
        .await;
    h.upstream.set_detail(2, fixtures::no_owner_detail()).await;
    h.upstream
        .set_detail(3, fixtures::detail(OwnerReference::Id(424242)))
        .await;
    h.upstream.fail_detail(4).await;
    h.upstream
        .set_detail(5, fixtures::detail(OwnerReference::Text("not-a-number".into())))
        .await;

    let report = h.synchronizer().run().await.expect("sync failed");

    let added: Vec<u32> = report.added.iter().map(|r| r.id).collect();
    let skipped: Vec<u32> = report.skipped.iter().map(|s| s.id).collect();
    assert_eq!(added, vec![1]);
    assert_eq!(skipped, vec![2, 3, 4, 5]);

    let snapshot = h.store.load().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot
        .records
        .iter()
        .all(|r| r.owner().is_some_and(|owner| !owner.is_empty())));
}

#[tokio::test]
async fn test_all_resolutions_failing_leaves_catalog_untouched() {
    let h = TestHarness::new().await;
    h.seed_catalog(&[CatalogRecord::new(1, "Existing")]);
    let before = h.catalog_bytes();
    h.upstream
        .set_items(vec![fixtures::bond_item(1), fixtures::bond_item(2)])
        .await;
    h.upstream.fail_detail(2).await;

    let report = h.synchronizer().run().await.expect("sync failed");

    assert_eq!(report.discovered, vec![2]);
    assert!(!report.written);
    assert_eq!(h.catalog_bytes(), before);
}

#[tokio::test]
async fn test_export_failure_is_fatal() {
    let h = TestHarness::new().await;
    h.seed_catalog(&[CatalogRecord::new(1, "Existing")]);
    let before = h.catalog_bytes();
    h.upstream.fail_items(true).await;

    let err = h.synchronizer().run().await.unwrap_err();

    assert!(matches!(err, SyncError::Upstream(_)));
    assert_eq!(h.catalog_bytes(), before);
}

#[tokio::test]
async fn test_corrupt_catalog_is_fatal() {
    let h = TestHarness::new().await;
    std::fs::create_dir_all(h.store.path().parent().unwrap()).unwrap();
    std::fs::write(h.store.path(), "this is not json").unwrap();
    h.standard_upstream().await;

    let err = h.synchronizer().run().await.unwrap_err();

    assert!(matches!(err, SyncError::Catalog(_)));
    assert_eq!(
        std::fs::read_to_string(h.store.path()).unwrap(),
        "this is not json"
    );
    // Nothing was fetched once the catalog turned out unreadable.
    assert!(h.upstream.recorded_calls().await.is_empty());
}

#[tokio::test]
async fn test_missing_servant_export_without_cache_is_fatal() {
    let h = TestHarness::new().await;
    h.standard_upstream().await;
    h.upstream.fail_servant_export(true).await;

    let err = h.synchronizer().run().await.unwrap_err();

    assert!(matches!(err, SyncError::ServantCache(_)));
    assert!(h.catalog_bytes().is_none());
}

#[tokio::test]
async fn test_stale_servant_cache_is_used_when_refresh_fails() {
    let h = TestHarness::new().await;
    std::fs::write(
        &h.cache_config.path,
        fixtures::servant_export_json(&[(800100, "Cached Mash", "https://x/old.png")]),
    )
    .unwrap();
    let file = std::fs::File::options()
        .write(true)
        .open(&h.cache_config.path)
        .unwrap();
    file.set_modified(std::time::SystemTime::now() - std::time::Duration::from_secs(3 * 86_400))
        .unwrap();
    drop(file);

    h.upstream.fail_servant_export(true).await;
    h.upstream.set_items(vec![fixtures::bond_item(1)]).await;
    h.upstream
        .set_detail(1, fixtures::detail(OwnerReference::Id(800100)))
        .await;

    let report = h.synchronizer().run().await.expect("sync failed");

    assert_eq!(report.added.len(), 1);
    assert_eq!(report.added[0].owner, "Cached Mash");
}

#[tokio::test]
async fn test_servant_export_downloaded_once_per_run() {
    let h = TestHarness::new().await;
    h.standard_upstream().await;

    h.synchronizer().run().await.expect("sync failed");

    let calls = h.upstream.recorded_calls().await;
    assert_eq!(calls.first(), Some(&RecordedUpstreamCall::FetchAllItems));
    assert_eq!(h.upstream.export_downloads().await, 1);
}

#[tokio::test]
async fn test_no_new_items_skips_servant_export() {
    let h = TestHarness::new().await;
    h.seed_catalog(&[CatalogRecord::new(1, "Existing")]);
    h.upstream.set_items(vec![fixtures::bond_item(1)]).await;

    let report = h.synchronizer().run().await.expect("sync failed");

    assert!(!report.written);
    assert_eq!(h.upstream.export_downloads().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_item_delay_applies_to_every_attempt() {
    let h = TestHarness::new().await;
    h.standard_upstream().await;
    h.upstream.fail_detail(2).await;

    let start = tokio::time::Instant::now();
    let report = h
        .synchronizer_with_delay(500)
        .run()
        .await
        .expect("sync failed");

    assert_eq!(report.discovered, vec![1, 2, 4]);
    assert_eq!(report.skipped.len(), 1);
    assert!(start.elapsed() >= std::time::Duration::from_millis(1500));
}

#[tokio::test]
async fn test_catalog_with_null_owner_is_extended() {
    let h = TestHarness::new().await;
    std::fs::create_dir_all(h.store.path().parent().unwrap()).unwrap();
    std::fs::write(h.store.path(), r#"[{"id": 1, "owner": null, "face": null}]"#).unwrap();
    h.standard_upstream().await;

    let report = h.synchronizer().run().await.expect("sync failed");

    assert_eq!(report.previous_watermark, 1);
    assert_eq!(report.discovered, vec![2, 4]);

    let snapshot = h.store.load().unwrap();
    assert_eq!(snapshot.records[0].get("face"), Some(&serde_json::Value::Null));
    assert_eq!(snapshot.len(), 3);
}
