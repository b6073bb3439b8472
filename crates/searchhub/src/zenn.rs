//! Zenn adapter
//!
//! A transient failure on any page restarts the listing from page 1 unless
//! the caller picks [`RetryScope::PerPage`].

use std::sync::Arc;

use log::debug;
use searchhub_core::zenn::{
    apply_filters, articles_request, map_status, transform_article_page, ZennArticle,
    ZennListResponse, ZennSearchParams, DEFAULT_BASE_URL,
};
use searchhub_core::{
    Aggregate, PageState, PaginationLimits, Provider, RetryPolicy, RetryScope, SearchError,
};

use crate::paging::{fetch_all, SearchSettings};
use crate::transport::{fetch_json, Transport};

pub struct ZennAdapter {
    transport: Arc<dyn Transport>,
    base_url: String,
    settings: SearchSettings,
}

impl ZennAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            settings: SearchSettings::new(RetryScope::WholeOperation),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
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

    /// List articles and apply the client-side filters
    pub async fn search(
        &self,
        params: &ZennSearchParams,
    ) -> Result<Aggregate<ZennArticle>, SearchError> {
        if params.is_empty() {
            debug!("Empty Zenn query; skipping request");
            return Ok(Aggregate::empty());
        }

        let username = params.filters.username.as_deref();
        let listing = fetch_all(PageState::first_offset(), &self.settings, |state| {
            let page = state.page_number();
            let request = articles_request(&self.base_url, username, page);
            async move {
                let response: ZennListResponse =
                    fetch_json(self.transport.as_ref(), request, Provider::Zenn, map_status)
                        .await?;
                Ok(transform_article_page(&self.base_url, response, page))
            }
        })
        .await?;

        debug!("Zenn listing returned {} published articles", listing.len());
        Ok(apply_filters(listing, &params.keyword, &params.filters))
    }
}
