use crate::batch::run_batch;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use record_sync_models::{Record, Tag};
use record_sync_sources::{ProgressTracker, RecordStore, ReleaseSource};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub sync_collection: bool,
    pub sync_wantlist: bool,
    /// Concurrency cap shared by the fetch, purge and write batches.
    pub max_concurrent_requests: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            sync_collection: true,
            sync_wantlist: true,
            max_concurrent_requests: 8,
        }
    }
}

#[derive(Debug)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub collection_fetched: usize,
    pub wantlist_fetched: usize,
    pub pages_archived: usize,
    pub pages_created: usize,
    pub duration: Duration,
    /// Per-item failures. These never abort the run; they surface here.
    pub errors: Vec<String>,
}

/// Rebuilds the destination from the source in four barriered phases:
/// fetch both release lists, read the destination snapshot, archive every
/// snapshot page, then recreate pages from the fetched records. The purge
/// barrier before the write phase is the only duplicate guard; nothing is
/// diffed against a prior run.
pub struct SyncOrchestrator<S, D> {
    source: S,
    store: D,
    options: SyncOptions,
}

impl<S: ReleaseSource, D: RecordStore> SyncOrchestrator<S, D> {
    pub fn new(source: S, store: D) -> Self {
        Self {
            source,
            store,
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    #[instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut errors = Vec::new();

        info!(
            operation = "sync_start",
            collection = self.options.sync_collection,
            wantlist = self.options.sync_wantlist,
            concurrency = self.options.max_concurrent_requests,
            "Starting sync (Fetch → Read → Purge → Write)"
        );

        // List retrieval is all-or-nothing: with no id list there is nothing
        // to rebuild from, and purging against a half-known source would
        // empty the mirror. Per-release failures below are the tolerated kind.
        let (collection_ids, wantlist_ids) = futures::try_join!(
            async {
                if self.options.sync_collection {
                    self.source.collection_ids().await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if self.options.sync_wantlist {
                    self.source.wantlist_ids().await
                } else {
                    Ok(Vec::new())
                }
            }
        )
        .context("failed to list releases")?;

        info!(
            operation = "fetch",
            collection = collection_ids.len(),
            wantlist = wantlist_ids.len(),
            "Resolved release id lists"
        );

        let (collection_outcome, wantlist_outcome) = futures::join!(
            self.fetch_records(&collection_ids, Tag::Collection),
            self.fetch_records(&wantlist_ids, Tag::Wish)
        );
        let (collection, mut fetch_errors) = collection_outcome;
        errors.append(&mut fetch_errors);
        let (wantlist, mut fetch_errors) = wantlist_outcome;
        errors.append(&mut fetch_errors);

        // An incomplete snapshot would let stale pages survive the purge, so
        // any failure here aborts the run.
        let existing = self
            .store
            .query_all()
            .await
            .context("failed to read destination snapshot")?;
        info!(operation = "read", pages = existing.len(), "Read destination snapshot");

        let pages_archived = self.purge_records(&existing, &mut errors).await;

        let mut pages_created = self
            .write_records(&collection, "collection write", &mut errors)
            .await;
        pages_created += self
            .write_records(&wantlist, "wantlist write", &mut errors)
            .await;

        let report = SyncReport {
            started_at,
            collection_fetched: collection.len(),
            wantlist_fetched: wantlist.len(),
            pages_archived,
            pages_created,
            duration: start.elapsed(),
            errors,
        };

        info!(
            operation = "sync_complete",
            fetched = report.collection_fetched + report.wantlist_fetched,
            archived = report.pages_archived,
            created = report.pages_created,
            failures = report.errors.len(),
            "Sync finished in {:?}",
            report.duration
        );

        Ok(report)
    }

    /// Resolve each release id to a record, one task per id. A failed id is
    /// dropped from the output and recorded; it never aborts the batch.
    async fn fetch_records(&self, ids: &[u64], tag: Tag) -> (Vec<Record>, Vec<String>) {
        if ids.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let mut tracker = ProgressTracker::new(ids.len());
        let outcomes = run_batch(
            ids.to_vec(),
            self.options.max_concurrent_requests,
            |id| async move {
                let release = self.source.release(id).await?;
                info!("{}", release.title);
                Ok(release)
            },
        )
        .await;

        let mut records = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(release) => {
                    tracker.record_resolved();
                    records.push(Record::from_release(release, tag));
                }
                Err(e) => {
                    tracker.record_failed(e.category());
                    warn!("Skipping {} release {}: {}", tag.name(), id, e);
                    errors.push(format!("fetch {} release {}: {}", tag.name(), id, e));
                }
            }
        }
        tracker.log_summary(&format!("{} fetch", tag.name()));
        (records, errors)
    }

    /// Archive every page from the snapshot. A failed archive leaves a stale
    /// page behind until the next run; the run continues regardless.
    async fn purge_records(&self, existing: &[Record], errors: &mut Vec<String>) -> usize {
        let page_ids: Vec<String> = existing
            .iter()
            .filter_map(|record| record.page_id.clone())
            .collect();
        if page_ids.is_empty() {
            info!("Destination is empty, nothing to purge");
            return 0;
        }

        let mut tracker = ProgressTracker::new(page_ids.len());
        let outcomes = run_batch(
            page_ids,
            self.options.max_concurrent_requests,
            |page_id| async move { self.store.archive(&page_id).await },
        )
        .await;

        for (page_id, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    tracker.record_resolved();
                    debug!("Archived page {}", page_id);
                }
                Err(e) => {
                    tracker.record_failed(e.category());
                    warn!("Failed to archive page {} (stale page remains): {}", page_id, e);
                    errors.push(format!("archive page {}: {}", page_id, e));
                }
            }
        }
        tracker.log_summary("purge");
        tracker.resolved()
    }

    /// Create one page per record. No uniqueness check: the purge barrier
    /// before this phase is the only thing preventing duplicates.
    async fn write_records(
        &self,
        records: &[Record],
        operation: &str,
        errors: &mut Vec<String>,
    ) -> usize {
        if records.is_empty() {
            return 0;
        }

        let mut tracker = ProgressTracker::new(records.len());
        let outcomes = run_batch(
            records.to_vec(),
            self.options.max_concurrent_requests,
            |record| async move { self.store.create(&record).await },
        )
        .await;

        for (record, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    tracker.record_resolved();
                    debug!("Created page for \"{}\"", record.title);
                }
                Err(e) => {
                    tracker.record_failed(e.category());
                    warn!("Failed to create page for \"{}\": {}", record.title, e);
                    errors.push(format!("create page \"{}\": {}", record.title, e));
                }
            }
        }
        tracker.log_summary(operation);
        tracker.resolved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use record_sync_models::ReleaseInfo;
    use record_sync_sources::SourceError;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        collection: Vec<u64>,
        wantlist: Vec<u64>,
        releases: HashMap<u64, ReleaseInfo>,
        failing_ids: HashSet<u64>,
        fail_listing: bool,
    }

    impl FakeSource {
        fn with_release(mut self, id: u64, title: &str, artist: &str) -> Self {
            self.releases.insert(
                id,
                ReleaseInfo {
                    title: title.to_string(),
                    artist: artist.to_string(),
                    url: format!("https://discogs.com/r/{}", id),
                    image: format!("http://img/{}.jpg", id),
                },
            );
            self
        }
    }

    #[async_trait]
    impl ReleaseSource for FakeSource {
        async fn collection_ids(&self) -> Result<Vec<u64>, SourceError> {
            if self.fail_listing {
                return Err(SourceError::Malformed("listing unavailable".to_string()));
            }
            Ok(self.collection.clone())
        }

        async fn wantlist_ids(&self) -> Result<Vec<u64>, SourceError> {
            if self.fail_listing {
                return Err(SourceError::Malformed("listing unavailable".to_string()));
            }
            Ok(self.wantlist.clone())
        }

        async fn release(&self, id: u64) -> Result<ReleaseInfo, SourceError> {
            if self.failing_ids.contains(&id) {
                return Err(SourceError::MissingField("images"));
            }
            self.releases
                .get(&id)
                .cloned()
                .ok_or_else(|| SourceError::Malformed(format!("unknown release {}", id)))
        }
    }

    struct StoredPage {
        id: String,
        record: Record,
        archived: bool,
    }

    #[derive(Default)]
    struct FakeStore {
        pages: Mutex<Vec<StoredPage>>,
        events: Mutex<Vec<&'static str>>,
        next_id: AtomicUsize,
        failing_archives: Mutex<HashSet<String>>,
        failing_titles: Mutex<HashSet<String>>,
        fail_query: bool,
    }

    impl FakeStore {
        fn seed(&self, record: Record) -> String {
            let id = format!("page-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            self.pages.lock().unwrap().push(StoredPage {
                id: id.clone(),
                record,
                archived: false,
            });
            id
        }

        fn active_records(&self) -> Vec<Record> {
            self.pages
                .lock()
                .unwrap()
                .iter()
                .filter(|page| !page.archived)
                .map(|page| page.record.clone())
                .collect()
        }

        fn active_page_ids(&self) -> HashSet<String> {
            self.pages
                .lock()
                .unwrap()
                .iter()
                .filter(|page| !page.archived)
                .map(|page| page.id.clone())
                .collect()
        }
    }

    #[async_trait]
    impl RecordStore for FakeStore {
        async fn query_all(&self) -> Result<Vec<Record>, SourceError> {
            if self.fail_query {
                return Err(SourceError::Malformed("query failed".to_string()));
            }
            Ok(self
                .pages
                .lock()
                .unwrap()
                .iter()
                .filter(|page| !page.archived)
                .map(|page| {
                    let mut record = page.record.clone();
                    record.page_id = Some(page.id.clone());
                    record
                })
                .collect())
        }

        async fn archive(&self, page_id: &str) -> Result<(), SourceError> {
            if self.failing_archives.lock().unwrap().contains(page_id) {
                return Err(SourceError::Malformed("archive rejected".to_string()));
            }
            self.events.lock().unwrap().push("archive");
            let mut pages = self.pages.lock().unwrap();
            let page = pages
                .iter_mut()
                .find(|page| page.id == page_id)
                .ok_or_else(|| SourceError::Malformed(format!("no page {}", page_id)))?;
            page.archived = true;
            Ok(())
        }

        async fn create(&self, record: &Record) -> Result<(), SourceError> {
            if self.failing_titles.lock().unwrap().contains(&record.title) {
                return Err(SourceError::Malformed("create rejected".to_string()));
            }
            self.events.lock().unwrap().push("create");
            let id = format!("page-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            self.pages.lock().unwrap().push(StoredPage {
                id,
                record: record.clone(),
                archived: false,
            });
            Ok(())
        }
    }

    fn record(title: &str, artist: &str, tag: Tag) -> Record {
        Record {
            title: title.to_string(),
            artist: artist.to_string(),
            url: format!("https://discogs.com/r/{}", title),
            image: format!("http://img/{}.jpg", title),
            tag,
            page_id: None,
        }
    }

    /// Comparable view of a record, ignoring the per-run page id.
    fn tuples(records: &[Record]) -> Vec<(String, String, String, String, &'static str)> {
        let mut tuples: Vec<_> = records
            .iter()
            .map(|r| {
                (
                    r.title.clone(),
                    r.artist.clone(),
                    r.url.clone(),
                    r.image.clone(),
                    r.tag.name(),
                )
            })
            .collect();
        tuples.sort();
        tuples
    }

    #[tokio::test]
    async fn test_end_to_end_single_collection_release() {
        let source = FakeSource {
            collection: vec![1],
            ..Default::default()
        }
        .with_release(1, "OK Computer", "Radiohead");
        let store = FakeStore::default();

        let orchestrator = SyncOrchestrator::new(source, store);
        let report = orchestrator.sync().await.unwrap();

        assert_eq!(report.collection_fetched, 1);
        assert_eq!(report.wantlist_fetched, 0);
        assert_eq!(report.pages_archived, 0);
        assert_eq!(report.pages_created, 1);
        assert!(report.errors.is_empty());

        let active = orchestrator.store.active_records();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "OK Computer");
        assert_eq!(active[0].artist, "Radiohead");
        assert_eq!(active[0].url, "https://discogs.com/r/1");
        assert_eq!(active[0].image, "http://img/1.jpg");
        assert_eq!(active[0].tag, Tag::Collection);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let source = FakeSource {
            collection: vec![1, 2],
            failing_ids: [2].into_iter().collect(),
            ..Default::default()
        }
        .with_release(1, "OK Computer", "Radiohead");
        let store = FakeStore::default();

        let orchestrator = SyncOrchestrator::new(source, store);
        let report = orchestrator.sync().await.unwrap();

        assert_eq!(report.collection_fetched, 1);
        assert_eq!(report.pages_created, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("release 2"));
    }

    #[tokio::test]
    async fn test_wantlist_records_carry_wish_tag() {
        let source = FakeSource {
            wantlist: vec![7],
            ..Default::default()
        }
        .with_release(7, "Discovery", "Daft Punk");
        let store = FakeStore::default();

        let orchestrator = SyncOrchestrator::new(source, store);
        let report = orchestrator.sync().await.unwrap();

        assert_eq!(report.wantlist_fetched, 1);
        let active = orchestrator.store.active_records();
        assert_eq!(active[0].tag, Tag::Wish);
    }

    #[tokio::test]
    async fn test_purge_then_write_supersedes_everything() {
        let store = FakeStore::default();
        let old_ids: HashSet<String> = [
            store.seed(record("Stale One", "Old Artist", Tag::Collection)),
            store.seed(record("Stale Two", "Old Artist", Tag::Wish)),
        ]
        .into_iter()
        .collect();

        let source = FakeSource {
            collection: vec![1],
            ..Default::default()
        }
        .with_release(1, "OK Computer", "Radiohead");

        let orchestrator = SyncOrchestrator::new(source, store);
        let report = orchestrator.sync().await.unwrap();

        assert_eq!(report.pages_archived, 2);
        assert_eq!(report.pages_created, 1);

        // No page id from before the run survives unarchived
        let active_ids = orchestrator.store.active_page_ids();
        assert!(active_ids.is_disjoint(&old_ids));
        assert_eq!(orchestrator.store.active_records().len(), 1);

        // Every archive strictly precedes every create
        let events = orchestrator.store.events.lock().unwrap().clone();
        let last_archive = events.iter().rposition(|e| *e == "archive").unwrap();
        let first_create = events.iter().position(|e| *e == "create").unwrap();
        assert!(last_archive < first_create);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent_with_fresh_page_ids() {
        let source = FakeSource {
            collection: vec![1, 2],
            wantlist: vec![3],
            ..Default::default()
        }
        .with_release(1, "OK Computer", "Radiohead")
        .with_release(2, "Kid A", "Radiohead")
        .with_release(3, "Discovery", "Daft Punk");
        let store = FakeStore::default();

        let orchestrator = SyncOrchestrator::new(source, store);

        orchestrator.sync().await.unwrap();
        let first_tuples = tuples(&orchestrator.store.active_records());
        let first_ids = orchestrator.store.active_page_ids();

        orchestrator.sync().await.unwrap();
        let second_tuples = tuples(&orchestrator.store.active_records());
        let second_ids = orchestrator.store.active_page_ids();

        assert_eq!(first_tuples, second_tuples);
        assert_eq!(second_tuples.len(), 3);
        assert!(first_ids.is_disjoint(&second_ids));
    }

    #[tokio::test]
    async fn test_destination_read_failure_aborts_before_purge() {
        let store = FakeStore {
            fail_query: true,
            ..Default::default()
        };
        store.seed(record("Untouched", "Artist", Tag::Collection));

        let source = FakeSource {
            collection: vec![1],
            ..Default::default()
        }
        .with_release(1, "OK Computer", "Radiohead");

        let orchestrator = SyncOrchestrator::new(source, store);
        assert!(orchestrator.sync().await.is_err());

        // Nothing was archived and nothing was created
        assert!(orchestrator.store.events.lock().unwrap().is_empty());
        assert_eq!(orchestrator.store.active_records().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts() {
        let source = FakeSource {
            fail_listing: true,
            ..Default::default()
        };
        let store = FakeStore::default();
        store.seed(record("Untouched", "Artist", Tag::Collection));

        let orchestrator = SyncOrchestrator::new(source, store);
        assert!(orchestrator.sync().await.is_err());
        assert_eq!(orchestrator.store.active_records().len(), 1);
    }

    #[tokio::test]
    async fn test_archive_failure_leaves_stale_page_and_continues() {
        let store = FakeStore::default();
        let stubborn = store.seed(record("Stubborn", "Artist", Tag::Collection));
        store.seed(record("Removable", "Artist", Tag::Collection));
        store
            .failing_archives
            .lock()
            .unwrap()
            .insert(stubborn.clone());

        let source = FakeSource {
            collection: vec![1],
            ..Default::default()
        }
        .with_release(1, "OK Computer", "Radiohead");

        let orchestrator = SyncOrchestrator::new(source, store);
        let report = orchestrator.sync().await.unwrap();

        assert_eq!(report.pages_archived, 1);
        assert_eq!(report.pages_created, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains(&stubborn));

        // The stale page survives alongside the fresh one
        assert!(orchestrator.store.active_page_ids().contains(&stubborn));
        assert_eq!(orchestrator.store.active_records().len(), 2);
    }

    #[tokio::test]
    async fn test_create_failure_skips_only_that_record() {
        let source = FakeSource {
            collection: vec![1, 2],
            ..Default::default()
        }
        .with_release(1, "OK Computer", "Radiohead")
        .with_release(2, "Kid A", "Radiohead");
        let store = FakeStore::default();
        store
            .failing_titles
            .lock()
            .unwrap()
            .insert("Kid A".to_string());

        let orchestrator = SyncOrchestrator::new(source, store);
        let report = orchestrator.sync().await.unwrap();

        assert_eq!(report.collection_fetched, 2);
        assert_eq!(report.pages_created, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Kid A"));

        let active = orchestrator.store.active_records();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "OK Computer");
    }

    #[tokio::test]
    async fn test_disabled_wantlist_is_not_fetched() {
        let source = FakeSource {
            collection: vec![1],
            wantlist: vec![3],
            ..Default::default()
        }
        .with_release(1, "OK Computer", "Radiohead")
        .with_release(3, "Discovery", "Daft Punk");
        let store = FakeStore::default();

        let orchestrator = SyncOrchestrator::new(source, store).with_options(SyncOptions {
            sync_wantlist: false,
            ..SyncOptions::default()
        });
        let report = orchestrator.sync().await.unwrap();

        assert_eq!(report.collection_fetched, 1);
        assert_eq!(report.wantlist_fetched, 0);
        let active = orchestrator.store.active_records();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].tag, Tag::Collection);
    }
}
