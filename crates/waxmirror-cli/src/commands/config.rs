use crate::output::Output;
use color_eyre::Result;
use record_sync_config::{Config, CredentialStore, DiscogsConfig, NotionConfig, PathManager, SchemaConfig, SyncOptions};
use serde_json::json;

pub async fn run_config(cmd: crate::ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => show_config(full, output),
        crate::ConfigCommands::Discogs { token, username } => {
            configure_discogs(token, username, output)
        }
        crate::ConfigCommands::Notion { token, database_id } => {
            configure_notion(token, database_id, output)
        }
    }
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        output.warn(&format!(
            "Configuration file not found at: {}",
            config_file.display()
        ));
        output.info("It will be created when you run `waxmirror config discogs` or `waxmirror config notion`.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file).map_err(|e| {
        color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e)
    })?;

    let mut cred_store = CredentialStore::new(path_manager.credentials_file());
    cred_store.load().map_err(|e| {
        color_eyre::eyre::eyre!("Failed to load credentials: {}", e)
    })?;

    let discogs_token = cred_store.discogs_token().unwrap_or_default();
    let notion_token = cred_store.notion_token().unwrap_or_default();
    let discogs_token_display = if full { discogs_token.clone() } else { mask_string(&discogs_token) };
    let notion_token_display = if full { notion_token.clone() } else { mask_string(&notion_token) };

    match output.format() {
        crate::output::OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            output.info(&format!("Config file: {}", config_file.display()));
            output.info("");
            output.info("[discogs]");
            output.info(&format!(
                "  username: {}",
                config.discogs.username.as_deref().unwrap_or("<resolved at runtime>")
            ));
            output.info(&format!("  user_agent: {}", config.discogs.user_agent));
            output.info(&format!("  token: {}", discogs_token_display));
            output.info("");
            output.info("[notion]");
            output.info(&format!("  database_id: {}", config.notion.database_id));
            output.info(&format!("  token: {}", notion_token_display));
            output.info(&format!(
                "  schema: {} / {} / {} / {} / {}",
                config.notion.schema.album,
                config.notion.schema.artist,
                config.notion.schema.url,
                config.notion.schema.tags,
                config.notion.schema.cover
            ));
            output.info("");
            output.info("[sync]");
            output.info(&format!("  sync_collection: {}", config.sync.sync_collection));
            output.info(&format!("  sync_wantlist: {}", config.sync.sync_wantlist));
            output.info(&format!(
                "  max_concurrent_requests: {}",
                config.sync.max_concurrent_requests
            ));
            output.info(&format!("  dump_snapshot: {}", config.sync.dump_snapshot));
        }
        crate::output::OutputFormat::Json | crate::output::OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "discogs": {
                    "username": config.discogs.username,
                    "user_agent": config.discogs.user_agent,
                    "token": discogs_token_display,
                },
                "notion": {
                    "database_id": config.notion.database_id,
                    "token": notion_token_display,
                    "schema": config.notion.schema,
                },
                "sync": config.sync,
            }));
        }
    }

    Ok(())
}

fn configure_discogs(
    token: Option<String>,
    username: Option<String>,
    output: &Output,
) -> Result<()> {
    let path_manager = PathManager::default();
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create config directory: {}", e))?;

    let token = match token {
        Some(token) => token,
        None => rpassword::prompt_password("Discogs token: ")
            .map_err(|e| color_eyre::eyre::eyre!("Failed to read token: {}", e))?,
    };
    if token.is_empty() {
        return Err(color_eyre::eyre::eyre!("Token cannot be empty"));
    }

    let mut cred_store = CredentialStore::new(path_manager.credentials_file());
    cred_store
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;
    cred_store.set_discogs_token(token);
    cred_store
        .save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials: {}", e))?;

    let config_file = path_manager.config_file();
    let mut config = load_or_default_config(&config_file)?;
    if username.is_some() {
        config.discogs.username = username;
    }
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success("Discogs credentials saved");
    if config.notion.database_id.is_empty() {
        output.warn("Notion is not configured yet. Run `waxmirror config notion` next.");
    }

    Ok(())
}

fn configure_notion(
    token: Option<String>,
    database_id: Option<String>,
    output: &Output,
) -> Result<()> {
    let path_manager = PathManager::default();
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create config directory: {}", e))?;

    let token = match token {
        Some(token) => token,
        None => rpassword::prompt_password("Notion integration token: ")
            .map_err(|e| color_eyre::eyre::eyre!("Failed to read token: {}", e))?,
    };
    if token.is_empty() {
        return Err(color_eyre::eyre::eyre!("Token cannot be empty"));
    }

    let mut cred_store = CredentialStore::new(path_manager.credentials_file());
    cred_store
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;
    cred_store.set_notion_token(token);
    cred_store
        .save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials: {}", e))?;

    let config_file = path_manager.config_file();
    let mut config = load_or_default_config(&config_file)?;
    if let Some(database_id) = database_id {
        config.notion.database_id = database_id;
    }
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success("Notion credentials saved");
    if config.notion.database_id.is_empty() {
        output.warn("No database id set. Pass `--database-id` to point at the mirror database.");
    }

    Ok(())
}

fn load_or_default_config(config_file: &std::path::PathBuf) -> Result<Config> {
    if config_file.exists() {
        Config::load_from_file(config_file).map_err(|e| {
            color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e)
        })
    } else {
        Ok(Config {
            discogs: DiscogsConfig::default(),
            notion: NotionConfig {
                database_id: String::new(),
                schema: SchemaConfig::default(),
            },
            sync: SyncOptions::default(),
        })
    }
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    format!("{}***{}", &s[..2], &s[s.len() - 2..])
}
