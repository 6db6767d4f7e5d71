use crate::error::SourceError;
use crate::notion::api::{self, NotionPage};
use crate::notion::schema;
use crate::traits::RecordStore;
use async_trait::async_trait;
use record_sync_config::SchemaConfig;
use record_sync_models::Record;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct NotionClient {
    client: Arc<Client>,
    token: String,
    database_id: String,
    schema: SchemaConfig,
    snapshot_path: Option<PathBuf>,
}

impl NotionClient {
    pub fn new(token: String, database_id: String, schema: SchemaConfig) -> Self {
        Self {
            client: Arc::new(Client::new()),
            token,
            database_id,
            schema,
            snapshot_path: None,
        }
    }

    /// Dump the raw query response to this path before mapping it.
    /// Diagnostic artifact only; it is never read back.
    pub fn with_snapshot_path(mut self, path: Option<PathBuf>) -> Self {
        self.snapshot_path = path;
        self
    }

    fn dump_snapshot(path: &PathBuf, pages: &[NotionPage]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(pages)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn query_all(&self) -> Result<Vec<Record>, SourceError> {
        let pages = api::query_database(&self.client, &self.token, &self.database_id).await?;

        if let Some(path) = &self.snapshot_path {
            if let Err(e) = Self::dump_snapshot(path, &pages) {
                warn!("Failed to write snapshot to {}: {}", path.display(), e);
            }
        }

        pages
            .iter()
            .map(|page| schema::record_from_page(&self.schema, page))
            .collect()
    }

    async fn archive(&self, page_id: &str) -> Result<(), SourceError> {
        api::archive_page(&self.client, &self.token, page_id).await
    }

    async fn create(&self, record: &Record) -> Result<(), SourceError> {
        let properties = schema::page_properties(&self.schema, record);
        api::create_page(&self.client, &self.token, &self.database_id, properties).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dump_snapshot_writes_raw_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots").join("notion-snapshot.json");

        let pages = vec![NotionPage {
            id: "page-1".to_string(),
            properties: json!({ "Album": { "title": [] } }),
        }];

        NotionClient::dump_snapshot(&path, &pages).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<NotionPage> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "page-1");
    }
}
