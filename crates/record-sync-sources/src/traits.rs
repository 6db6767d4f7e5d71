use crate::error::SourceError;
use async_trait::async_trait;
use record_sync_models::{Record, ReleaseInfo};

/// Read side of a sync run: the external catalog the mirror is built from.
///
/// List retrieval failures are phase-fatal; `release` failures are tolerated
/// per item by the fetch batch.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Release ids of everything the user owns.
    async fn collection_ids(&self) -> Result<Vec<u64>, SourceError>;

    /// Release ids of everything the user wants.
    async fn wantlist_ids(&self) -> Result<Vec<u64>, SourceError>;

    /// Resolve one release to its normalized metadata.
    async fn release(&self, id: u64) -> Result<ReleaseInfo, SourceError>;
}

/// Write side of a sync run: the document store holding the mirrored pages.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record currently in the store, each with its `page_id` set.
    async fn query_all(&self) -> Result<Vec<Record>, SourceError>;

    /// Soft-delete one page.
    async fn archive(&self, page_id: &str) -> Result<(), SourceError>;

    /// Insert one freshly fetched record as a new page.
    async fn create(&self, record: &Record) -> Result<(), SourceError>;
}
