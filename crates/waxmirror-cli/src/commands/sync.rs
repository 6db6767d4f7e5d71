use crate::output::Output;
use color_eyre::Result;
use record_sync_config::{Config, CredentialStore, PathManager};
use record_sync_core::{SyncOptions, SyncOrchestrator};
use record_sync_sources::{DiscogsClient, NotionClient};
use serde_json::json;

pub async fn run_sync(
    collection: bool,
    wantlist: bool,
    concurrency: Option<usize>,
    dump_snapshot: bool,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Sync command started");

    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    let config = Config::load_from_file(&config_file).map_err(|e| {
        color_eyre::eyre::eyre!(
            "Failed to load config from {}: {} (run `waxmirror config notion` first)",
            config_file.display(),
            e
        )
    })?;
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration: {}", e))?;

    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load().map_err(|e| {
        color_eyre::eyre::eyre!(
            "Failed to load credentials from {}: {}",
            credentials_file.display(),
            e
        )
    })?;

    let discogs_token = cred_store.discogs_token().ok_or_else(|| {
        color_eyre::eyre::eyre!(
            "Discogs token not configured. Set DISCOGS_TOKEN or run `waxmirror config discogs`."
        )
    })?;
    let notion_token = cred_store.notion_token().ok_or_else(|| {
        color_eyre::eyre::eyre!(
            "Notion token not configured. Set NOTION_TOKEN or run `waxmirror config notion`."
        )
    })?;

    // With no list flags, the config decides; a flag narrows the run to that list
    let any_flags_set = collection || wantlist;
    let sync_collection = if any_flags_set { collection } else { config.sync.sync_collection };
    let sync_wantlist = if any_flags_set { wantlist } else { config.sync.sync_wantlist };

    let options = SyncOptions {
        sync_collection,
        sync_wantlist,
        max_concurrent_requests: concurrency.unwrap_or(config.sync.max_concurrent_requests),
    };

    let mut discogs = DiscogsClient::new(discogs_token, config.discogs.user_agent.clone())
        .with_username(config.discogs.username.clone());
    discogs
        .authenticate()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to authenticate to Discogs: {}", e))?;

    let snapshot_path = if dump_snapshot || config.sync.dump_snapshot {
        path_manager
            .ensure_directories()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directory: {}", e))?;
        Some(path_manager.snapshot_file())
    } else {
        None
    };

    let notion = NotionClient::new(
        notion_token,
        config.notion.database_id.clone(),
        config.notion.schema.clone(),
    )
    .with_snapshot_path(snapshot_path.clone());

    let orchestrator = SyncOrchestrator::new(discogs, notion).with_options(options);

    let report = orchestrator
        .sync()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Sync failed: {}", e))?;

    match output.format() {
        crate::output::OutputFormat::Human => {
            output.success(&format!(
                "Sync completed: {} releases fetched, {} pages archived, {} pages created in {:?}",
                report.collection_fetched + report.wantlist_fetched,
                report.pages_archived,
                report.pages_created,
                report.duration
            ));
            if let Some(path) = snapshot_path {
                output.info(&format!("Raw snapshot written to {}", path.display()));
            }
            if !report.errors.is_empty() {
                output.warn(&format!("{} items failed:", report.errors.len()));
                for error in &report.errors {
                    output.warn(&format!("  {}", error));
                }
            }
        }
        crate::output::OutputFormat::Json | crate::output::OutputFormat::JsonPretty => {
            let json_result = json!({
                "success": true,
                "started_at": report.started_at.to_rfc3339(),
                "collection_fetched": report.collection_fetched,
                "wantlist_fetched": report.wantlist_fetched,
                "pages_archived": report.pages_archived,
                "pages_created": report.pages_created,
                "duration_seconds": report.duration.as_secs_f64(),
                "errors": report.errors,
            });
            output.json(&json_result);
        }
    }

    Ok(())
}
