//! Page-token driven listing helper.

use std::future::Future;

use tracing::debug;

use crate::error::Result;

/// One page of a listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }
}

/// What to do when a page comes back without items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPagePolicy {
    /// Keep following the continuation token.
    Continue,
    /// Return what has been collected so far.
    StopOnEmpty,
}

/// Call `fetch` with successive page tokens, starting with `None`, and
/// collect every item until a page omits its continuation token.
///
/// Items are returned in server order.
pub async fn collect_pages<T, F, Fut>(mut fetch: F, policy: EmptyPagePolicy) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(page_token.take()).await?;
        pages += 1;
        debug!(page = pages, items = page.items.len(), "fetched listing page");

        if page.items.is_empty() && policy == EmptyPagePolicy::StopOnEmpty {
            break;
        }
        all_items.extend(page.items);

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(all_items)
}
