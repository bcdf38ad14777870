//! resolver::paginate
//!
//! Cursor-driven traversal of a paginated collection.
//!
//! Pages are requested one at a time: each request needs the cursor from the
//! previous response. Items are handed on in document order and never
//! reordered. Failures are returned as-is; nothing here retries.

use std::future::Future;

use crate::catalog::{CatalogError, Page};

/// Fetch every page of a collection, passing each page's items to `sink`.
///
/// Returns the number of pages fetched.
///
/// # Errors
///
/// Propagates the first page error. A page that reports a successor but no
/// cursor is a `CatalogError::Decode`, since following it is impossible.
pub async fn for_each_page<T, F, Fut, S>(
    collection: &str,
    mut fetch_page: F,
    mut sink: S,
) -> Result<usize, CatalogError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, CatalogError>>,
    S: FnMut(Vec<T>),
{
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch_page(cursor.take()).await?;
        pages += 1;

        tracing::debug!(
            collection,
            page = pages,
            items = page.items.len(),
            has_next_page = page.has_next_page,
            "fetched page"
        );

        sink(page.items);

        if !page.has_next_page {
            return Ok(pages);
        }

        match page.end_cursor {
            Some(next) => cursor = Some(next),
            None => {
                return Err(CatalogError::Decode(format!(
                    "{}: page {} reports more pages but no end cursor",
                    collection, pages
                )))
            }
        }
    }
}

/// Fetch every page of a collection and concatenate the items.
pub async fn collect_all<T, F, Fut>(collection: &str, fetch_page: F) -> Result<Vec<T>, CatalogError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, CatalogError>>,
{
    let mut items = Vec::new();
    for_each_page(collection, fetch_page, |page| items.extend(page)).await?;
    Ok(items)
}
