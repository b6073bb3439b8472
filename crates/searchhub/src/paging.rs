//! Pagination combined with retry at the configured granularity

use std::future::Future;

use log::debug;
use searchhub_core::{
    paginate, Aggregate, Page, PageState, PaginationLimits, RetryPolicy, RetryScope, SearchError,
};

use crate::retry::with_retry;

/// Knobs every adapter exposes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub retry_policy: RetryPolicy,
    pub retry_scope: RetryScope,
    pub limits: PaginationLimits,
}

impl SearchSettings {
    pub fn new(retry_scope: RetryScope) -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            retry_scope,
            limits: PaginationLimits::default(),
        }
    }
}

/// Fetch every page `fetch_page` yields, retrying per page or from the start
///
/// With [`RetryScope::PerPage`] only the failing request is repeated. With
/// [`RetryScope::WholeOperation`] a transient failure on any page discards the
/// pages fetched so far and starts over from `initial`.
pub async fn fetch_all<T, F, Fut>(
    initial: PageState,
    settings: &SearchSettings,
    fetch_page: F,
) -> Result<Aggregate<T>, SearchError>
where
    F: Fn(PageState) -> Fut,
    Fut: Future<Output = Result<Page<T>, SearchError>>,
{
    let policy = &settings.retry_policy;
    let limits = settings.limits;
    let fetch_page = &fetch_page;

    match settings.retry_scope {
        RetryScope::PerPage => {
            paginate(initial, limits, |state| async move {
                debug!("Fetching page {state:?}");
                with_retry(policy, || fetch_page(state.clone())).await
            })
            .await
        }
        RetryScope::WholeOperation => {
            with_retry(policy, || {
                let initial = initial.clone();
                async move {
                    paginate(initial, limits, |state| {
                        debug!("Fetching page {state:?}");
                        fetch_page(state)
                    })
                    .await
                }
            })
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchhub_core::ErrorKind;
    use std::sync::Mutex;

    fn settings(scope: RetryScope) -> SearchSettings {
        SearchSettings {
            retry_policy: RetryPolicy::immediate(),
            ..SearchSettings::new(scope)
        }
    }

    /// Two pages; page 2 fails once with a network error
    fn flaky_second_page(
        requested: &Mutex<Vec<u32>>,
        failed: &Mutex<bool>,
        state: PageState,
    ) -> Result<Page<u32>, SearchError> {
        let page = state.page_number();
        requested.lock().unwrap().push(page);
        let mut failed = failed.lock().unwrap();
        if page == 2 && !*failed {
            *failed = true;
            return Err(SearchError::network("reset"));
        }
        Ok(Page::new(vec![page], PageState::Offset(page + 1), page == 2))
    }

    #[tokio::test]
    async fn test_per_page_retries_only_the_failing_page() {
        let requested = Mutex::new(Vec::new());
        let failed = Mutex::new(false);

        let aggregate = fetch_all(PageState::first_offset(), &settings(RetryScope::PerPage), |state| {
            let result = flaky_second_page(&requested, &failed, state);
            async move { result }
        })
        .await
        .unwrap();

        assert_eq!(aggregate.items, vec![1, 2]);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_whole_operation_restarts_from_first_page() {
        let requested = Mutex::new(Vec::new());
        let failed = Mutex::new(false);

        let aggregate = fetch_all(
            PageState::first_offset(),
            &settings(RetryScope::WholeOperation),
            |state| {
                let result = flaky_second_page(&requested, &failed, state);
                async move { result }
            },
        )
        .await
        .unwrap();

        assert_eq!(aggregate.items, vec![1, 2]);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2, 1, 2]);
    }

    #[tokio::test]
    async fn test_non_transient_failure_is_not_retried_in_either_scope() {
        for scope in [RetryScope::PerPage, RetryScope::WholeOperation] {
            let calls = Mutex::new(0);

            let result: Result<Aggregate<u32>, _> =
                fetch_all(PageState::first_offset(), &settings(scope), |_| {
                    *calls.lock().unwrap() += 1;
                    async { Err(SearchError::validation("bad query")) }
                })
                .await;

            assert_eq!(result.unwrap_err().kind, ErrorKind::Validation);
            assert_eq!(*calls.lock().unwrap(), 1, "{scope:?}");
        }
    }
}
