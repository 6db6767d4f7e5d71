use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discogs: DiscogsConfig,
    pub notion: NotionConfig,
    #[serde(default)]
    pub sync: SyncOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscogsConfig {
    /// Discogs username. Resolved via the identity endpoint when absent.
    #[serde(default)]
    pub username: Option<String>,
    /// Discogs rejects requests without a User-Agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DiscogsConfig {
    fn default() -> Self {
        Self {
            username: None,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Target database. All pages in it belong to the mirror.
    pub database_id: String,
    #[serde(default)]
    pub schema: SchemaConfig,
}

/// Property names of the Notion database. The whole column-name coupling
/// lives here; nothing else in the workspace spells them out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaConfig {
    #[serde(default = "default_album_property")]
    pub album: String,
    #[serde(default = "default_artist_property")]
    pub artist: String,
    #[serde(default = "default_url_property")]
    pub url: String,
    #[serde(default = "default_tags_property")]
    pub tags: String,
    #[serde(default = "default_cover_property")]
    pub cover: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    #[serde(default = "default_true")]
    pub sync_collection: bool,
    #[serde(default = "default_true")]
    pub sync_wantlist: bool,
    /// Concurrency cap shared by the fetch, purge and write batches.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Write the raw Notion query response to the data dir before mapping it.
    #[serde(default)]
    pub dump_snapshot: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_requests() -> usize {
    8
}

fn default_user_agent() -> String {
    format!("waxmirror/{}", env!("CARGO_PKG_VERSION"))
}

fn default_album_property() -> String {
    "Album".to_string()
}

fn default_artist_property() -> String {
    "Artist".to_string()
}

fn default_url_property() -> String {
    "URL".to_string()
}

fn default_tags_property() -> String {
    "Tags".to_string()
}

fn default_cover_property() -> String {
    "Album cover".to_string()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            album: default_album_property(),
            artist: default_artist_property(),
            url: default_url_property(),
            tags: default_tags_property(),
            cover: default_cover_property(),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            sync_collection: true,
            sync_wantlist: true,
            max_concurrent_requests: default_max_concurrent_requests(),
            dump_snapshot: false,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.notion.database_id.is_empty() {
            return Err(anyhow::anyhow!("notion.database_id is required"));
        }
        if self.sync.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("sync.max_concurrent_requests must be at least 1"));
        }
        Ok(())
    }
}
