//! DocBase adapter

use std::sync::Arc;

use log::debug;
use searchhub_core::docbase::{
    build_post_query, map_status, posts_request, transform_post_page, validate_params,
    DocbasePostsResponse, PostItem, PostSearchParams, DEFAULT_API_URL,
};
use searchhub_core::{
    Aggregate, PageState, PaginationLimits, Provider, RetryPolicy, RetryScope, SearchError,
};

use crate::paging::{fetch_all, SearchSettings};
use crate::transport::{fetch_json, Transport};

pub struct DocbaseAdapter {
    transport: Arc<dyn Transport>,
    api_url: String,
    settings: SearchSettings,
}

impl DocbaseAdapter {
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

    pub async fn search(
        &self,
        params: &PostSearchParams,
    ) -> Result<Aggregate<PostItem>, SearchError> {
        let query = build_post_query(&params.keyword, &params.filters);
        if query.is_empty() {
            debug!("Empty DocBase query; skipping request");
            return Ok(Aggregate::empty());
        }

        validate_params(&params.token, &params.domain)?;

        fetch_all(PageState::first_offset(), &self.settings, |state| {
            let page = state.page_number();
            let request =
                posts_request(&self.api_url, &params.token, &params.domain, &query, page);
            async move {
                let response: DocbasePostsResponse =
                    fetch_json(self.transport.as_ref(), request, Provider::Docbase, map_status)
                        .await?;
                Ok(transform_post_page(response, page))
            }
        })
        .await
    }
}
