use crate::error::SourceError;
use record_sync_models::ReleaseInfo;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

const API_BASE: &str = "https://api.discogs.com";
const PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct Identity {
    username: String,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    pages: u32,
}

#[derive(Debug, Deserialize)]
struct CollectionPage {
    pagination: Pagination,
    releases: Vec<CollectionEntry>,
}

#[derive(Debug, Deserialize)]
struct CollectionEntry {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct WantlistPage {
    pagination: Pagination,
    wants: Vec<WantEntry>,
}

#[derive(Debug, Deserialize)]
struct WantEntry {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct DiscogsRelease {
    title: String,
    #[serde(default)]
    artists: Vec<DiscogsArtist>,
    uri: Option<String>,
    #[serde(default)]
    images: Vec<DiscogsImage>,
}

#[derive(Debug, Deserialize)]
struct DiscogsArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DiscogsImage {
    uri: String,
}

/// Strip parenthetical disambiguation suffixes from an artist display name.
/// Discogs renders homonymous artists as e.g. "Prince (2)".
pub fn normalize_artist_name(name: &str) -> String {
    let mut stripped = String::with_capacity(name.len());
    let mut depth = 0usize;
    for ch in name.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

async fn ensure_success(response: Response) -> Result<Response, SourceError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Api {
            service: "discogs",
            status,
            body,
        });
    }
    Ok(response)
}

/// Resolve the username behind the token.
pub async fn get_identity(
    client: &Client,
    token: &str,
    user_agent: &str,
) -> Result<String, SourceError> {
    let response = client
        .get(format!("{}/oauth/identity", API_BASE))
        .header("Authorization", format!("Discogs token={}", token))
        .header("User-Agent", user_agent)
        .send()
        .await?;

    let identity: Identity = ensure_success(response).await?.json().await?;
    Ok(identity.username)
}

/// Release ids of the user's collection (folder 0 = "All"), across all pages.
pub async fn get_collection_ids(
    client: &Client,
    token: &str,
    user_agent: &str,
    username: &str,
) -> Result<Vec<u64>, SourceError> {
    let mut ids = Vec::new();
    let mut page = 1u32;

    loop {
        let url = format!(
            "{}/users/{}/collection/folders/0/releases?page={}&per_page={}",
            API_BASE,
            urlencoding::encode(username),
            page,
            PER_PAGE
        );
        let response = client
            .get(&url)
            .header("Authorization", format!("Discogs token={}", token))
            .header("User-Agent", user_agent)
            .send()
            .await?;

        let parsed: CollectionPage = ensure_success(response).await?.json().await?;
        ids.extend(parsed.releases.iter().map(|entry| entry.id));

        if page >= parsed.pagination.pages {
            break;
        }
        page += 1;
    }

    debug!("Collected {} collection release ids", ids.len());
    Ok(ids)
}

/// Release ids of the user's wantlist, across all pages.
pub async fn get_wantlist_ids(
    client: &Client,
    token: &str,
    user_agent: &str,
    username: &str,
) -> Result<Vec<u64>, SourceError> {
    let mut ids = Vec::new();
    let mut page = 1u32;

    loop {
        let url = format!(
            "{}/users/{}/wants?page={}&per_page={}",
            API_BASE,
            urlencoding::encode(username),
            page,
            PER_PAGE
        );
        let response = client
            .get(&url)
            .header("Authorization", format!("Discogs token={}", token))
            .header("User-Agent", user_agent)
            .send()
            .await?;

        let parsed: WantlistPage = ensure_success(response).await?.json().await?;
        ids.extend(parsed.wants.iter().map(|entry| entry.id));

        if page >= parsed.pagination.pages {
            break;
        }
        page += 1;
    }

    debug!("Collected {} wantlist release ids", ids.len());
    Ok(ids)
}

/// Resolve one release to normalized metadata. Every field is required: a
/// release without a title, credited artist, canonical url or cover image is
/// a failed fetch, not a partial record.
pub async fn get_release(
    client: &Client,
    token: &str,
    user_agent: &str,
    id: u64,
) -> Result<ReleaseInfo, SourceError> {
    let response = client
        .get(format!("{}/releases/{}", API_BASE, id))
        .header("Authorization", format!("Discogs token={}", token))
        .header("User-Agent", user_agent)
        .send()
        .await?;

    let release: DiscogsRelease = ensure_success(response).await?.json().await?;

    if release.title.is_empty() {
        return Err(SourceError::MissingField("title"));
    }

    let artist = release
        .artists
        .first()
        .map(|artist| normalize_artist_name(&artist.name))
        .filter(|name| !name.is_empty())
        .ok_or(SourceError::MissingField("artists"))?;

    let url = release
        .uri
        .filter(|uri| !uri.is_empty())
        .ok_or(SourceError::MissingField("uri"))?;

    let image = release
        .images
        .into_iter()
        .next()
        .map(|image| image.uri)
        .filter(|uri| !uri.is_empty())
        .ok_or(SourceError::MissingField("images"))?;

    Ok(ReleaseInfo {
        title: release.title,
        artist,
        url,
        image,
    })
}
