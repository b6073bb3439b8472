//! Provider-agnostic pagination driver
//!
//! Adapters supply a `step` closure that fetches exactly one page for a given
//! [`PageState`]. [`paginate`] calls it serially, accumulating items in
//! response order, until the provider signals the last page, a page or item
//! cap is reached, or a step fails. A failed step discards everything
//! accumulated so far, so callers either get the full aggregate or an error.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Maximum number of page requests per search
pub const MAX_PAGES: usize = 10;

/// Maximum number of items in an aggregate
pub const MAX_ITEMS: usize = 1_000;

/// Addressing token for the next page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    /// 1-based page number
    Offset(u32),
    /// Opaque server cursor, `None` for the first page
    Cursor(Option<String>),
}

impl PageState {
    pub fn first_offset() -> Self {
        PageState::Offset(1)
    }

    pub fn first_cursor() -> Self {
        PageState::Cursor(None)
    }

    /// Page number for offset pagination; cursor states always read as page 1
    pub fn page_number(&self) -> u32 {
        match self {
            PageState::Offset(page) => *page,
            PageState::Cursor(_) => 1,
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        match self {
            PageState::Cursor(cursor) => cursor.as_deref(),
            PageState::Offset(_) => None,
        }
    }
}

/// Rate-limit snapshot reported alongside a successful response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderMeta {
    RateLimit {
        remaining: u32,
        limit: u32,
        reset_at: String,
    },
}

/// One page as parsed by an adapter
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// State to request the following page with
    pub next: PageState,
    /// The provider reported that this is the last page
    pub done: bool,
    pub total_count: Option<u64>,
    pub provider_meta: Option<ProviderMeta>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: PageState, done: bool) -> Self {
        Self {
            items,
            next,
            done,
            total_count: None,
            provider_meta: None,
        }
    }

    pub fn with_total_count(mut self, total_count: u64) -> Self {
        self.total_count = Some(total_count);
        self
    }

    pub fn with_provider_meta(mut self, meta: Option<ProviderMeta>) -> Self {
        self.provider_meta = meta;
        self
    }
}

/// Accumulated, capped result of a multi-page search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_meta: Option<ProviderMeta>,
}

impl<T> Aggregate<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            provider_meta: None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Aggregate<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Stop conditions independent of what the provider reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    pub max_pages: usize,
    pub max_items: usize,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            max_pages: MAX_PAGES,
            max_items: MAX_ITEMS,
        }
    }
}

/// Drive `step` until one of the stop conditions is met
///
/// The loop stops on the first of:
/// - the step reports `done`
/// - `limits.max_pages` pages have been fetched
/// - `limits.max_items` items have been accumulated (excess is dropped)
/// - the step fails, in which case the error is returned and partial results
///   are discarded
///
/// `total_count` is the last count reported by the provider, or the number of
/// accumulated items when the provider never reports one.
pub async fn paginate<T, F, Fut>(
    initial: PageState,
    limits: PaginationLimits,
    mut step: F,
) -> Result<Aggregate<T>, SearchError>
where
    F: FnMut(PageState) -> Fut,
    Fut: Future<Output = Result<Page<T>, SearchError>>,
{
    let mut items: Vec<T> = Vec::new();
    let mut reported_total: Option<u64> = None;
    let mut provider_meta: Option<ProviderMeta> = None;
    let mut state = initial;
    let mut pages_fetched = 0;

    while pages_fetched < limits.max_pages && items.len() < limits.max_items {
        let page = step(state).await?;
        pages_fetched += 1;

        let remaining = limits.max_items - items.len();
        items.extend(page.items.into_iter().take(remaining));

        if page.total_count.is_some() {
            reported_total = page.total_count;
        }
        if page.provider_meta.is_some() {
            provider_meta = page.provider_meta;
        }

        if page.done {
            break;
        }
        state = page.next;
    }

    let total_count = reported_total.unwrap_or(items.len() as u64);

    Ok(Aggregate {
        items,
        total_count,
        provider_meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn numbered(start: usize, count: usize) -> Vec<usize> {
        (start..start + count).collect()
    }

    #[tokio::test]
    async fn test_full_pages_stop_at_item_cap_after_ten_requests() {
        // Arrange: a server that always returns 100 items and claims there is more
        let requested = RefCell::new(Vec::new());

        // Act
        let aggregate = paginate(PageState::first_offset(), PaginationLimits::default(), |state| {
            requested.borrow_mut().push(state.clone());
            let page = state.page_number();
            async move {
                let start = (page as usize - 1) * 100;
                Ok::<_, SearchError>(Page::new(numbered(start, 100), PageState::Offset(page + 1), false))
            }
        })
        .await
        .unwrap();

        // Assert
        assert_eq!(aggregate.items.len(), 1_000);
        assert_eq!(requested.borrow().len(), 10);
        assert_eq!(requested.borrow()[9], PageState::Offset(10));
        assert_eq!(aggregate.items[999], 999);
    }

    #[tokio::test]
    async fn test_endless_cursor_stops_after_max_pages() {
        let calls = RefCell::new(0u32);

        let aggregate = paginate(PageState::first_cursor(), PaginationLimits::default(), |state| {
            *calls.borrow_mut() += 1;
            let n = *calls.borrow();
            async move {
                let cursor = state.cursor().map(str::to_string);
                assert_eq!(cursor.is_none(), n == 1);
                Ok::<_, SearchError>(Page::new(
                    vec![n],
                    PageState::Cursor(Some(format!("cursor-{n}"))),
                    false,
                ))
            }
        })
        .await
        .unwrap();

        assert_eq!(*calls.borrow(), 10);
        assert_eq!(aggregate.items, (1..=10).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_two_pages_accumulate_in_order() {
        let aggregate = paginate(PageState::first_offset(), PaginationLimits::default(), |state| {
            async move {
                match state.page_number() {
                    1 => Ok::<_, SearchError>(Page::new(numbered(0, 30), PageState::Offset(2), false)),
                    _ => Ok::<_, SearchError>(Page::new(numbered(30, 10), PageState::Offset(3), true)),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(aggregate.items.len(), 40);
        assert_eq!(aggregate.items, numbered(0, 40));
        assert_eq!(aggregate.total_count, 40);
    }

    #[tokio::test]
    async fn test_failure_discards_partial_results() {
        let calls = RefCell::new(0u32);

        let result: Result<Aggregate<usize>, _> =
            paginate(PageState::first_offset(), PaginationLimits::default(), |state| {
                *calls.borrow_mut() += 1;
                async move {
                    match state.page_number() {
                        1 => Ok::<_, SearchError>(Page::new(numbered(0, 100), PageState::Offset(2), false)),
                        _ => Err(SearchError::unauthorized("token revoked")),
                    }
                }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Unauthorized);
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn test_item_cap_truncates_last_page() {
        let limits = PaginationLimits {
            max_pages: 10,
            max_items: 150,
        };

        let aggregate = paginate(PageState::first_offset(), limits, |state| async move {
            let page = state.page_number();
            Ok::<_, SearchError>(Page::new(
                numbered((page as usize - 1) * 100, 100),
                PageState::Offset(page + 1),
                false,
            ))
        })
        .await
        .unwrap();

        assert_eq!(aggregate.items.len(), 150);
        assert_eq!(aggregate.items.last(), Some(&149));
    }

    #[tokio::test]
    async fn test_reported_total_and_meta_come_from_last_page() {
        let aggregate = paginate(PageState::first_cursor(), PaginationLimits::default(), |state| {
            async move {
                let first = state.cursor().is_none();
                let meta = ProviderMeta::RateLimit {
                    remaining: if first { 4999 } else { 4998 },
                    limit: 5000,
                    reset_at: "2026-10-19T12:00:00Z".to_string(),
                };
                Ok::<_, SearchError>(Page::new(
                    vec!["item"],
                    PageState::Cursor(Some("next".to_string())),
                    !first,
                )
                .with_total_count(1234)
                .with_provider_meta(Some(meta)))
            }
        })
        .await
        .unwrap();

        assert_eq!(aggregate.total_count, 1234);
        assert_eq!(
            aggregate.provider_meta,
            Some(ProviderMeta::RateLimit {
                remaining: 4998,
                limit: 5000,
                reset_at: "2026-10-19T12:00:00Z".to_string(),
            })
        );
    }

    #[test]
    fn test_page_state_accessors() {
        assert_eq!(PageState::first_offset().page_number(), 1);
        assert_eq!(PageState::Offset(7).cursor(), None);
        assert_eq!(
            PageState::Cursor(Some("abc".to_string())).cursor(),
            Some("abc")
        );
    }
}
