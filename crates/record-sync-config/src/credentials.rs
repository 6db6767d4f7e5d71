use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use toml;

const DISCOGS_TOKEN_ENV: &str = "DISCOGS_TOKEN";
const NOTION_TOKEN_ENV: &str = "NOTION_TOKEN";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Flat key/value secret file. Tokens set in the process environment take
/// precedence over anything stored here.
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    fn get_with_env(&self, env_var: &str, key: &str) -> Option<String> {
        std::env::var(env_var)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.get(key).cloned())
    }

    // Convenience methods for specific credentials
    pub fn discogs_token(&self) -> Option<String> {
        self.get_with_env(DISCOGS_TOKEN_ENV, "discogs_token")
    }

    pub fn set_discogs_token(&mut self, token: String) {
        self.set("discogs_token".to_string(), token);
    }

    pub fn notion_token(&self) -> Option<String> {
        self.get_with_env(NOTION_TOKEN_ENV, "notion_token")
    }

    pub fn set_notion_token(&mut self, token: String) {
        self.set("notion_token".to_string(), token);
    }
}
