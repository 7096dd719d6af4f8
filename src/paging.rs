//! Paginated traversal
//!
//! Walks a cursor-paginated collection page by page. The absence of a
//! continuation token is the only end signal; an empty page with a token
//! still has a successor.

use nexus3_wire::ListingPage;

use crate::error::NexusResult;

/// Position in a paginated listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// What is being listed, e.g. a repository name
    pub scope: String,
    pub continuation_token: Option<String>,
}

impl PageRequest {
    /// Request for the first page of `scope`
    pub fn first(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            continuation_token: None,
        }
    }

    /// Same scope, next cursor
    pub fn next(&self, token: String) -> Self {
        Self {
            scope: self.scope.clone(),
            continuation_token: Some(token),
        }
    }
}

/// Fetch pages starting at `initial` and hand each to `handle_page`
///
/// `handle_page` receives the page and whether it is the last one, and
/// returns whether to keep going. Its answer for the last page is ignored.
/// The first error from either closure stops the walk and is returned.
pub fn traverse<T, F, H>(initial: PageRequest, mut fetch_page: F, mut handle_page: H) -> NexusResult<()>
where
    F: FnMut(&PageRequest) -> NexusResult<ListingPage<T>>,
    H: FnMut(ListingPage<T>, bool) -> NexusResult<bool>,
{
    let mut request = initial;
    let mut index = 0usize;

    loop {
        let mut page = fetch_page(&request)?;
        let token = page.continuation_token.take();

        tracing::debug!(
            scope = %request.scope,
            page = index,
            items = page.items.len(),
            has_next = token.is_some(),
            "fetched page"
        );

        let Some(token) = token else {
            handle_page(page, true)?;
            return Ok(());
        };

        page.continuation_token = Some(token.clone());
        if !handle_page(page, false)? {
            return Ok(());
        }

        request = request.next(token);
        index += 1;
    }
}

/// Every item of every page, in order
pub fn collect_all<T, F>(initial: PageRequest, fetch_page: F) -> NexusResult<Vec<T>>
where
    F: FnMut(&PageRequest) -> NexusResult<ListingPage<T>>,
{
    let mut items = Vec::new();
    traverse(initial, fetch_page, |page, _| {
        items.extend(page.items);
        Ok(true)
    })?;
    Ok(items)
}
