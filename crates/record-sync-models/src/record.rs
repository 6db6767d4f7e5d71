use crate::tag::Tag;
use serde::{Deserialize, Serialize};

/// Normalized release metadata as resolved from Discogs, before a tag is
/// attached. The fetcher only produces one of these when all four fields
/// resolved to non-empty values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseInfo {
    pub title: String,
    pub artist: String,
    pub url: String,
    pub image: String,
}

/// The unit flowing through a sync run. Freshly fetched records and records
/// read back from Notion share this shape; `page_id` is set only on the
/// latter and is what the purge phase keys on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub title: String,
    pub artist: String,
    pub url: String,
    pub image: String,
    pub tag: Tag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
}

impl Record {
    pub fn from_release(release: ReleaseInfo, tag: Tag) -> Self {
        Self {
            title: release.title,
            artist: release.artist,
            url: release.url,
            image: release.image,
            tag,
            page_id: None,
        }
    }
}
