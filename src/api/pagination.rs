use crate::api::PageSource;
use crate::core::error::FetchError;
use std::time::Instant;

/// Walks every page of `source` and concatenates the items in order.
///
/// There is no page cap: the walk ends only when the API stops returning a
/// cursor, so a server that always hands back a cursor keeps this looping.
/// A failed page discards everything collected so far.
pub async fn fetch_all<S>(source: &S) -> Result<Vec<S::Item>, FetchError>
where
    S: PageSource + ?Sized,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages: usize = 0;

    loop {
        let started = Instant::now();
        let page = source.fetch_page(cursor.as_deref()).await?;
        pages += 1;

        tracing::debug!(
            page = pages,
            items = page.items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            has_next = page.next_cursor.is_some(),
            "Fetched page"
        );

        items.extend(page.items);

        // Helix sends an empty cursor object on the last page.
        match page.next_cursor.filter(|c| !c.is_empty()) {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    tracing::debug!(pages, total = items.len(), "Pagination complete");
    Ok(items)
}
