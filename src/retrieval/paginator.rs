//! Bounded cursor pagination over any listing operation.

use crate::error::ServiceError;
use std::future::Future;
use tracing::debug;

/// Largest page the service will return; every listing call asks for this.
pub const PAGE_SIZE: u32 = 100;

/// A listing response that may point at a following page.
pub trait CursorPage {
    fn next_cursor(&self) -> Option<&str>;
}

/// Collect up to `max_items` items across consecutive pages.
///
/// `list` is called with [`PAGE_SIZE`] and the cursor from the previous page
/// (`None` first). `project` pulls the items out of a response. Iteration
/// stops when a page has no continuation cursor, a page is empty, or
/// `max_items` items have been collected; the result is truncated to
/// `max_items`.
///
/// `progress` receives `collected / max_items` (clamped to 1.0) after every
/// page and exactly 1.0 at the end. Listing errors are returned as-is.
pub async fn paginate<R, T, L, Fut, P, G>(
    mut list: L,
    project: P,
    max_items: usize,
    mut progress: G,
) -> Result<Vec<T>, ServiceError>
where
    R: CursorPage,
    L: FnMut(u32, Option<String>) -> Fut,
    Fut: Future<Output = Result<R, ServiceError>>,
    P: Fn(R) -> Vec<T>,
    G: FnMut(f64),
{
    let mut results: Vec<T> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page = 0usize;

    while results.len() < max_items {
        let resp = list(PAGE_SIZE, cursor.take()).await?;
        let next = resp.next_cursor().map(str::to_owned);
        let items = project(resp);
        page += 1;

        debug!(
            "Page {}: {} items, more pages: {}",
            page,
            items.len(),
            next.is_some()
        );

        let page_was_empty = items.is_empty();
        results.extend(items);
        progress((results.len() as f64 / max_items as f64).min(1.0));

        match next {
            Some(token) if !page_was_empty => cursor = Some(token),
            _ => break,
        }
    }

    results.truncate(max_items);
    progress(1.0);
    Ok(results)
}
