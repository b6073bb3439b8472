//! Slack adapter: message search, thread expansion and lookup helpers

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;
use serde::de::DeserializeOwned;

use searchhub_core::http::HttpRequest;
use searchhub_core::slack::{
    build_message_query, map_status, parse_envelope, permalink_request, replies_request,
    search_request, thread_roots, transform_search_page, transform_thread, transform_user,
    user_info_request, MessageItem, MessageSearchParams, PermalinkResponse, RepliesResponse,
    SearchMessagesResponse, Thread, ThreadRoot, ThreadedSearch, UserInfoResponse, UserProfile,
    DEFAULT_API_URL,
};
use searchhub_core::{
    Aggregate, PageState, PaginationLimits, Provider, RetryPolicy, RetryScope, SearchError,
};

use crate::paging::{fetch_all, SearchSettings};
use crate::retry::with_retry;
use crate::transport::{fetch_json, Transport};

/// `conversations.replies` calls allowed in flight at once
pub const THREAD_CONCURRENCY: usize = 4;

pub struct SlackAdapter {
    transport: Arc<dyn Transport>,
    api_url: String,
    settings: SearchSettings,
    thread_concurrency: usize,
}

impl SlackAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            api_url: DEFAULT_API_URL.to_string(),
            settings: SearchSettings::new(RetryScope::PerPage),
            thread_concurrency: THREAD_CONCURRENCY,
        }
    }

    pub fn with_base_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.settings.retry_policy = policy;
        self
    }

    pub fn with_retry_scope(mut self, scope: RetryScope) -> Self {
        self.settings.retry_scope = scope;
        self
    }

    pub fn with_limits(mut self, limits: PaginationLimits) -> Self {
        self.settings.limits = limits;
        self
    }

    /// Cap on concurrent thread fetches; `1` expands threads one at a time
    pub fn with_thread_concurrency(mut self, limit: usize) -> Self {
        self.thread_concurrency = limit.max(1);
        self
    }

    /// One Web API call, unwrapping the `{ok, error}` envelope
    async fn call<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, SearchError> {
        let body: serde_json::Value =
            fetch_json(self.transport.as_ref(), request, Provider::Slack, map_status).await?;
        parse_envelope(body)
    }

    /// Like [`Self::call`], retried under the adapter's policy
    async fn call_with_retry<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, SearchError> {
        with_retry(&self.settings.retry_policy, || self.call(request.clone())).await
    }

    pub async fn search(
        &self,
        params: &MessageSearchParams,
    ) -> Result<Aggregate<MessageItem>, SearchError> {
        let query = build_message_query(&params.keyword, &params.filters);
        if query.is_empty() {
            debug!("Empty Slack query; skipping request");
            return Ok(Aggregate::empty());
        }

        fetch_all(PageState::first_offset(), &self.settings, |state| {
            let page = state.page_number();
            let request = search_request(&self.api_url, &params.token, &query, page);
            async move {
                let response: SearchMessagesResponse = self.call(request).await?;
                Ok(transform_search_page(response, page))
            }
        })
        .await
    }

    /// Search, then fetch every distinct thread the matches belong to
    ///
    /// `conversations.replies` is called once per `(channel, thread_ts)` root,
    /// however many matches share it, with at most `thread_concurrency` calls
    /// in flight. Threads come back in first-seen root order.
    pub async fn search_with_threads(
        &self,
        params: &MessageSearchParams,
    ) -> Result<ThreadedSearch, SearchError> {
        let aggregate = self.search(params).await?;
        let roots = thread_roots(&aggregate.items);
        debug!(
            "Expanding {} thread(s) for {} message(s)",
            roots.len(),
            aggregate.len()
        );

        let threads: Vec<Thread> = stream::iter(roots)
            .map(|root| self.thread(&params.token, root))
            .buffered(self.thread_concurrency)
            .try_collect()
            .await?;

        Ok(ThreadedSearch { aggregate, threads })
    }

    /// Every message of one thread, root first
    pub async fn thread(&self, token: &str, root: ThreadRoot) -> Result<Thread, SearchError> {
        let request = replies_request(&self.api_url, token, &root.channel_id, &root.thread_ts);
        let response: RepliesResponse = self.call_with_retry(request).await?;
        Ok(transform_thread(root, response))
    }

    pub async fn permalink(
        &self,
        token: &str,
        channel: &str,
        message_ts: &str,
    ) -> Result<String, SearchError> {
        let request = permalink_request(&self.api_url, token, channel, message_ts);
        let response: PermalinkResponse = self.call_with_retry(request).await?;
        Ok(response.permalink)
    }

    pub async fn user_info(&self, token: &str, user_id: &str) -> Result<UserProfile, SearchError> {
        let request = user_info_request(&self.api_url, token, user_id);
        let response: UserInfoResponse = self.call_with_retry(request).await?;
        Ok(transform_user(response))
    }
}
