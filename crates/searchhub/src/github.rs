//! GitHub adapter: issue/PR search over REST, discussion search over GraphQL

use std::sync::Arc;

use log::debug;
use searchhub_core::github::discussions::{
    build_discussion_query, discussions_request, transform_discussion_response,
    DiscussionItem, DiscussionSearchParams, GraphqlResponse,
};
use searchhub_core::github::issues::{
    build_issue_query, issues_request, transform_issue_page, GithubIssueSearchResponse,
    IssueItem, IssueSearchParams,
};
use searchhub_core::github::{map_status, DEFAULT_API_URL};
use searchhub_core::{
    Aggregate, PageState, PaginationLimits, Provider, RetryPolicy, RetryScope, SearchError,
};

use crate::paging::{fetch_all, SearchSettings};
use crate::transport::{fetch_json, Transport};

pub struct GithubAdapter {
    transport: Arc<dyn Transport>,
    api_url: String,
    settings: SearchSettings,
}

impl GithubAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            api_url: DEFAULT_API_URL.to_string(),
            settings: SearchSettings::new(RetryScope::PerPage),
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

    /// Search issues and pull requests
    pub async fn search_issues(
        &self,
        params: &IssueSearchParams,
    ) -> Result<Aggregate<IssueItem>, SearchError> {
        let query = build_issue_query(&params.keyword, &params.filters);
        if query.is_empty() {
            debug!("Empty GitHub issue query; skipping request");
            return Ok(Aggregate::empty());
        }

        let token = params.token.as_deref();
        fetch_all(PageState::first_offset(), &self.settings, |state| {
            let page = state.page_number();
            let request = issues_request(
                &self.api_url,
                token,
                &query,
                params.sort,
                params.order,
                page,
            );
            async move {
                let response: GithubIssueSearchResponse =
                    fetch_json(self.transport.as_ref(), request, Provider::Github, map_status)
                        .await?;
                Ok(transform_issue_page(response, page))
            }
        })
        .await
    }

    /// Search discussions through the GraphQL API
    pub async fn search_discussions(
        &self,
        params: &DiscussionSearchParams,
    ) -> Result<Aggregate<DiscussionItem>, SearchError> {
        let query = build_discussion_query(&params.keyword, &params.filters);
        if query.is_empty() {
            debug!("Empty GitHub discussion query; skipping request");
            return Ok(Aggregate::empty());
        }

        let token = params.token.as_deref();
        fetch_all(PageState::first_cursor(), &self.settings, |state| {
            let request = discussions_request(&self.api_url, token, &query, state.cursor());
            async move {
                let response: GraphqlResponse =
                    fetch_json(self.transport.as_ref(), request, Provider::Github, map_status)
                        .await?;
                transform_discussion_response(response)
            }
        })
        .await
    }
}
