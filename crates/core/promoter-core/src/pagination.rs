//! Cursor-following pagination
//!
//! Every listing in a promotion run goes through [`paginate`]. Pages are
//! requested strictly in sequence: the next request is only issued once the
//! previous page's cursor is known, and listing stops at the first page that
//! carries no cursor.
//!
//! A failed page aborts the whole listing. Callers must treat that as "state
//! unknown", never as "state empty".

use crate::error::{PromotionError, Result};
use crate::traits::Page;
use futures::{Stream, TryStreamExt};
use std::collections::HashSet;
use std::future::Future;
use tracing::debug;

/// Maximum page size accepted by the association listing API
pub const MAX_ASSOCIATION_PAGE_SIZE: i32 = 25;

/// Maximum page size accepted by the function listing API
pub const MAX_FUNCTION_PAGE_SIZE: i32 = 10_000;

/// Maximum page size accepted by the contact-flow and routing-profile listing APIs
pub const MAX_ARTIFACT_PAGE_SIZE: i32 = 1_000;

/// Maximum page size accepted by the routing-profile queue listing API
pub const MAX_PROFILE_QUEUE_PAGE_SIZE: i32 = 100;

/// Page-size hints per call site.
///
/// Each listing API has its own maximum, so sizes are chosen per resource
/// rather than globally and every setter clamps to the API's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizes {
    pub associations: i32,
    pub functions: i32,
    pub flows: i32,
    pub profiles: i32,
    pub profile_queues: i32,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            associations: MAX_ASSOCIATION_PAGE_SIZE,
            functions: 50,
            flows: 100,
            profiles: 100,
            profile_queues: 100,
        }
    }
}

impl PageSizes {
    /// Set the association page size (clamped to the API maximum)
    pub fn with_associations(mut self, size: i32) -> Self {
        self.associations = size.clamp(1, MAX_ASSOCIATION_PAGE_SIZE);
        self
    }

    pub fn with_functions(mut self, size: i32) -> Self {
        self.functions = size.clamp(1, MAX_FUNCTION_PAGE_SIZE);
        self
    }

    pub fn with_flows(mut self, size: i32) -> Self {
        self.flows = size.clamp(1, MAX_ARTIFACT_PAGE_SIZE);
        self
    }

    pub fn with_profiles(mut self, size: i32) -> Self {
        self.profiles = size.clamp(1, MAX_ARTIFACT_PAGE_SIZE);
        self
    }

    pub fn with_profile_queues(mut self, size: i32) -> Self {
        self.profile_queues = size.clamp(1, MAX_PROFILE_QUEUE_PAGE_SIZE);
        self
    }
}

/// Stream every item of a paginated listing.
///
/// `fetch` receives the cursor (absent for the first page) and the page-size
/// hint. An empty cursor counts as absent. A remote that hands back any
/// cursor already requested in this listing is reported as a failure of
/// `operation`.
pub fn paginate<T, F, Fut>(
    operation: &'static str,
    page_size: i32,
    mut fetch: F,
) -> impl Stream<Item = Result<T>>
where
    F: FnMut(Option<String>, i32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    async_stream::try_stream! {
        let mut cursor: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();
        let mut pages = 0usize;

        loop {
            let page = fetch(cursor.clone(), page_size).await?;
            pages += 1;

            debug!(
                operation,
                page = pages,
                items = page.items.len(),
                more = page.next_cursor.is_some(),
                "Fetched page"
            );

            for item in page.items {
                yield item;
            }

            match page.next_cursor.filter(|next| !next.is_empty()) {
                None => break,
                Some(next) if seen.contains(&next) => {
                    Err::<(), _>(PromotionError::remote(
                        operation,
                        format!("remote repeated cursor {next:?} after page {pages}"),
                    ))?;
                }
                Some(next) => {
                    seen.insert(next.clone());
                    cursor = Some(next);
                }
            }
        }
    }
}

/// Collect every item of a paginated listing, or fail as a whole
pub async fn collect_all<T, F, Fut>(
    operation: &'static str,
    page_size: i32,
    fetch: F,
) -> Result<Vec<T>>
where
    F: FnMut(Option<String>, i32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let items: Vec<T> = paginate(operation, page_size, fetch).try_collect().await?;
    debug!(operation, total = items.len(), "Listing complete");
    Ok(items)
}
