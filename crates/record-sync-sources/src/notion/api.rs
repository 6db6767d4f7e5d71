use crate::error::SourceError;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

const API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

/// One database entry as returned by the query endpoint. Properties stay as
/// raw JSON here; the schema layer owns their interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionPage {
    pub id: String,
    pub properties: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<NotionPage>,
    has_more: bool,
    next_cursor: Option<String>,
}

async fn ensure_success(response: Response) -> Result<Response, SourceError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Api {
            service: "notion",
            status,
            body,
        });
    }
    Ok(response)
}

/// Fetch every entry of the database, following the cursor until exhausted.
pub async fn query_database(
    client: &Client,
    token: &str,
    database_id: &str,
) -> Result<Vec<NotionPage>, SourceError> {
    let url = format!("{}/databases/{}/query", API_BASE, database_id);
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let mut body = json!({ "page_size": PAGE_SIZE });
        if let Some(start_cursor) = &cursor {
            body["start_cursor"] = json!(start_cursor);
        }

        let response = client
            .post(&url)
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;

        let parsed: QueryResponse = ensure_success(response).await?.json().await?;
        pages.extend(parsed.results);

        match (parsed.has_more, parsed.next_cursor) {
            (true, Some(next)) => cursor = Some(next),
            _ => break,
        }
    }

    debug!("Queried {} pages from database", pages.len());
    Ok(pages)
}

/// Soft-delete a page.
pub async fn archive_page(
    client: &Client,
    token: &str,
    page_id: &str,
) -> Result<(), SourceError> {
    let response = client
        .patch(format!("{}/pages/{}", API_BASE, page_id))
        .bearer_auth(token)
        .header("Notion-Version", NOTION_VERSION)
        .json(&json!({ "archived": true }))
        .send()
        .await?;

    ensure_success(response).await?;
    Ok(())
}

/// Insert a page into the database.
pub async fn create_page(
    client: &Client,
    token: &str,
    database_id: &str,
    properties: serde_json::Value,
) -> Result<(), SourceError> {
    let payload = json!({
        "parent": { "database_id": database_id },
        "properties": properties,
    });

    let response = client
        .post(format!("{}/pages", API_BASE))
        .bearer_auth(token)
        .header("Notion-Version", NOTION_VERSION)
        .json(&payload)
        .send()
        .await?;

    ensure_success(response).await?;
    Ok(())
}
