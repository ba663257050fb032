// src/paging.rs
// Pagination drivers for providers that cap a single response.
//
// Two shapes exist upstream: cursor-chained APIs where each request needs
// the last id of the previous page (must run sequentially), and plain
// page-number APIs whose pages are independent (safe to fetch in parallel).
// Both drivers are fail-soft: a fetch error ends collection and whatever
// was gathered so far is returned.

use std::future::Future;

use tokio::task::JoinSet;

/// Sequentially collect up to `target_count` items from a cursor-chained
/// API. `fetch` receives the cursor from the previous page (`None` for the
/// first call); `cursor_of` derives the next cursor from the last item of a
/// page. Stops on an empty page, on reaching the target, or on error.
pub async fn collect_chained<T, F, Fut, C>(
    mut fetch: F,
    cursor_of: C,
    target_count: usize,
    max_pages: usize,
) -> Vec<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<T>>>,
    C: Fn(&T) -> String,
{
    let mut collected = Vec::new();
    let mut cursor = None;

    for page in 0..max_pages {
        let batch = match fetch(cursor.clone()).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = ?e, page, "chained page fetch failed, stopping");
                break;
            }
        };
        if batch.is_empty() {
            break;
        }
        cursor = batch.last().map(&cursor_of);
        collected.extend(batch);
        if collected.len() >= target_count {
            break;
        }
    }

    collected.truncate(target_count);
    collected
}

/// Fetch pages `1..=max_pages` of an independently indexed API
/// concurrently and reassemble the results in page order. A failed page
/// contributes nothing.
pub async fn collect_indexed<T, F, Fut>(fetch: F, max_pages: usize) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize) -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<T>>> + Send + 'static,
{
    let mut set = JoinSet::new();
    for page in 1..=max_pages {
        let fut = fetch(page);
        set.spawn(async move { (page, fut.await) });
    }

    let mut pages: Vec<(usize, Vec<T>)> = Vec::with_capacity(max_pages);
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((page, Ok(batch))) => pages.push((page, batch)),
            Ok((page, Err(e))) => {
                tracing::warn!(error = ?e, page, "indexed page fetch failed, skipping");
            }
            Err(e) => {
                tracing::warn!(error = ?e, "indexed page task panicked, skipping");
            }
        }
    }

    pages.sort_by_key(|(page, _)| *page);
    pages.into_iter().flat_map(|(_, batch)| batch).collect()
}
