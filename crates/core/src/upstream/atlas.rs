//! Atlas Academy API client.
//!
//! No authentication; every request carries its own timeout and is attempted
//! exactly once.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::UpstreamConfig;

use super::types::{ItemDetail, UpstreamItem};
use super::{UpstreamError, UpstreamSource};

/// Atlas Academy API client.
pub struct AtlasClient {
    client: Client,
    equip_export_url: String,
    equip_detail_url: String,
    servant_export_url: String,
    timeout: Duration,
    export_timeout: Duration,
}

impl AtlasClient {
    /// Create a new client from the upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .user_agent(concat!("bond-updater/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            equip_export_url: config.equip_export_url.clone(),
            equip_detail_url: config.equip_detail_url.clone(),
            servant_export_url: config.servant_export_url.clone(),
            timeout: config.timeout(),
            export_timeout: config.export_timeout(),
        })
    }

    fn detail_url(&self, collection_no: u32) -> String {
        self.equip_detail_url
            .replace("{id}", &collection_no.to_string())
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<Response, UpstreamError> {
        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if status == 404 {
            return Err(UpstreamError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, UpstreamError> {
        let response = self.get(url, self.timeout).await?;
        response.json().await.map_err(|e| {
            UpstreamError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl UpstreamSource for AtlasClient {
    async fn fetch_all_items(&self) -> Result<Vec<UpstreamItem>, UpstreamError> {
        debug!("Fetching craft essence export: {}", self.equip_export_url);
        self.get_json(&self.equip_export_url, "craft essence export")
            .await
    }

    async fn fetch_item_detail(&self, collection_no: u32) -> Result<ItemDetail, UpstreamError> {
        let url = self.detail_url(collection_no);
        debug!("Fetching craft essence detail: id={}", collection_no);
        self.get_json(&url, "craft essence detail").await
    }

    async fn download_servant_export(&self, dest: &Path) -> Result<u64, UpstreamError> {
        debug!(
            "Downloading servant export {} to {:?}",
            self.servant_export_url, dest
        );

        let response = self.get(&self.servant_export_url, self.export_timeout).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        debug!("Servant export downloaded: {} bytes", written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::OwnerReference;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AtlasClient {
        let config = UpstreamConfig {
            equip_export_url: format!("{}/export/JP/basic_equip_lang_en.json", server.uri()),
            equip_detail_url: format!("{}/nice/JP/equip/{{id}}", server.uri()),
            servant_export_url: format!("{}/export/JP/basic_servant_lang_en.json", server.uri()),
            timeout_secs: 5,
            export_timeout_secs: 5,
        };
        AtlasClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_all_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export/JP/basic_equip_lang_en.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "collectionNo": 1, "flag": "normal", "name": "Tenacity" },
                { "collectionNo": 102, "flag": "svtEquipFriendShip" },
                { "collectionNo": 530, "flag": "svtEquipChocolate", "valentineEquipOwner": 2 }
            ])))
            .mount(&server)
            .await;

        let items = client_for(&server).fetch_all_items().await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].collection_no, 102);
        assert_eq!(items[2].valentine_equip_owner, Some(2));
    }

    #[tokio::test]
    async fn test_fetch_all_items_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export/JP/basic_equip_lang_en.json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_all_items().await.unwrap_err();
        match err {
            UpstreamError::ApiError { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_items_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export/JP/basic_equip_lang_en.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_all_items().await.unwrap_err();
        assert!(matches!(err, UpstreamError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_fetch_item_detail_substitutes_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nice/JP/equip/1234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 9401234,
                "collectionNo": 1234,
                "bondEquipOwner": 100100
            })))
            .mount(&server)
            .await;

        let detail = client_for(&server).fetch_item_detail(1234).await.unwrap();
        assert_eq!(detail.bond_equip_owner, Some(OwnerReference::Id(100100)));
    }

    #[tokio::test]
    async fn test_fetch_item_detail_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nice/JP/equip/99"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_item_detail(99).await.unwrap_err();
        assert!(matches!(err, UpstreamError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_download_servant_export_writes_body() {
        let server = MockServer::start().await;
        let body = json!([{ "id": 100100, "name": "Artoria Pendragon", "face": "https://x/f.png" }])
            .to_string();
        Mock::given(method("GET"))
            .and(path("/export/JP/basic_servant_lang_en.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("servants.json.tmp");

        let written = client_for(&server)
            .download_servant_export(&dest)
            .await
            .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_download_servant_export_error_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export/JP/basic_servant_lang_en.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("servants.json.tmp");

        let err = client_for(&server)
            .download_servant_export(&dest)
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::ApiError { status: 500, .. }));
        assert!(!dest.exists());
    }
}
