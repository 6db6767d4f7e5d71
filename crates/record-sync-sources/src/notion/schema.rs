use crate::error::SourceError;
use crate::notion::api::NotionPage;
use record_sync_models::{tag_color, Record, Tag};
use record_sync_config::SchemaConfig;
use serde_json::{json, Value};

/// Build the property payload for creating a page from a record. The
/// property names come from the schema table; nothing else in the workspace
/// spells them out.
pub fn page_properties(schema: &SchemaConfig, record: &Record) -> Value {
    let tag_name = record.tag.name();

    let mut properties = serde_json::Map::new();
    properties.insert(
        schema.album.clone(),
        json!({ "title": [{ "text": { "content": record.title } }] }),
    );
    properties.insert(
        schema.artist.clone(),
        json!({ "multi_select": [{ "name": record.artist }] }),
    );
    properties.insert(schema.url.clone(), json!({ "url": record.url }));
    properties.insert(
        schema.tags.clone(),
        json!({ "multi_select": [{ "name": tag_name, "color": tag_color(tag_name) }] }),
    );
    properties.insert(
        schema.cover.clone(),
        json!({ "files": [{ "name": "cover", "type": "external", "external": { "url": record.image } }] }),
    );

    Value::Object(properties)
}

/// Parse a queried page back into a record. Any missing piece is a malformed
/// snapshot: an entry this tool cannot account for must abort the run before
/// the purge, or stale pages would survive it.
pub fn record_from_page(schema: &SchemaConfig, page: &NotionPage) -> Result<Record, SourceError> {
    let title = extract_str(page, &schema.album, "/title/0/text/content")?;
    let artist = extract_str(page, &schema.artist, "/multi_select/0/name")?;
    let url = extract_str(page, &schema.url, "/url")?;
    let image = extract_str(page, &schema.cover, "/files/0/external/url")?;

    let tag_name = extract_str(page, &schema.tags, "/multi_select/0/name")?;
    let tag = Tag::from_name(&tag_name).ok_or_else(|| {
        SourceError::Malformed(format!("page {} has unknown tag `{}`", page.id, tag_name))
    })?;

    Ok(Record {
        title,
        artist,
        url,
        image,
        tag,
        page_id: Some(page.id.clone()),
    })
}

fn extract_str(page: &NotionPage, property: &str, pointer: &str) -> Result<String, SourceError> {
    page.properties
        .get(property)
        .and_then(|value| value.pointer(pointer))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            SourceError::Malformed(format!(
                "page {} missing property `{}`{}",
                page.id, property, pointer
            ))
        })
}
