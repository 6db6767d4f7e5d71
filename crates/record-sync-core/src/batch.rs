use futures::stream::{self, StreamExt};
use record_sync_sources::SourceError;
use std::future::Future;

/// Run one task per item with at most `limit` in flight, and collect every
/// outcome keyed by its item. Results arrive in completion order, not
/// submission order. A failing task only fails its own slot; the batch always
/// runs to completion. The returned `Vec` materializing is the phase barrier.
pub async fn run_batch<T, R, F, Fut>(
    items: Vec<T>,
    limit: usize,
    task: F,
) -> Vec<(T, Result<R, SourceError>)>
where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, SourceError>>,
{
    stream::iter(items.into_iter().map(|item| {
        let work = task(item.clone());
        async move { (item, work.await) }
    }))
    .buffer_unordered(limit.max(1))
    .collect()
    .await
}
