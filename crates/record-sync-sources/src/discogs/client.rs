use crate::discogs::api;
use crate::error::SourceError;
use crate::traits::ReleaseSource;
use async_trait::async_trait;
use record_sync_models::ReleaseInfo;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct DiscogsClient {
    client: Arc<Client>,
    token: String,
    user_agent: String,
    username: Option<String>,
}

impl DiscogsClient {
    pub fn new(token: String, user_agent: String) -> Self {
        Self {
            client: Arc::new(Client::new()),
            token,
            user_agent,
            username: None,
        }
    }

    /// Pin the username instead of resolving it through the identity endpoint.
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// Resolve the username behind the token, unless one is already pinned.
    pub async fn authenticate(&mut self) -> Result<(), SourceError> {
        if self.username.is_none() {
            let username =
                api::get_identity(&self.client, &self.token, &self.user_agent).await?;
            info!("Authenticated to Discogs as {}", username);
            self.username = Some(username);
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    fn username(&self) -> Result<&str, SourceError> {
        self.username.as_deref().ok_or(SourceError::NotAuthenticated)
    }
}

#[async_trait]
impl ReleaseSource for DiscogsClient {
    async fn collection_ids(&self) -> Result<Vec<u64>, SourceError> {
        let username = self.username()?;
        api::get_collection_ids(&self.client, &self.token, &self.user_agent, username).await
    }

    async fn wantlist_ids(&self) -> Result<Vec<u64>, SourceError> {
        let username = self.username()?;
        api::get_wantlist_ids(&self.client, &self.token, &self.user_agent, username).await
    }

    async fn release(&self, id: u64) -> Result<ReleaseInfo, SourceError> {
        api::get_release(&self.client, &self.token, &self.user_agent, id).await
    }
}
