//! Qiita adapter

use std::sync::Arc;

use log::debug;
use searchhub_core::qiita::{
    build_article_query, items_request, map_status, total_count, transform_article_page,
    validate_token, ArticleItem, ArticleSearchParams, QiitaItem, DEFAULT_BASE_URL,
};
use searchhub_core::{
    Aggregate, PageState, PaginationLimits, Provider, RetryPolicy, RetryScope, SearchError,
};

use crate::paging::{fetch_all, SearchSettings};
use crate::transport::{decode, fetch, Transport};

pub struct QiitaAdapter {
    transport: Arc<dyn Transport>,
    base_url: String,
    settings: SearchSettings,
}

impl QiitaAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            settings: SearchSettings::new(RetryScope::PerPage),
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

    pub async fn search(
        &self,
        params: &ArticleSearchParams,
    ) -> Result<Aggregate<ArticleItem>, SearchError> {
        let query = build_article_query(&params.keyword, &params.filters);
        if query.is_empty() {
            debug!("Empty Qiita query; skipping request");
            return Ok(Aggregate::empty());
        }

        let token = params.token.as_deref();
        validate_token(token)?;

        fetch_all(PageState::first_offset(), &self.settings, |state| {
            let page = state.page_number();
            let request = items_request(&self.base_url, token, &query, page);
            async move {
                let response =
                    fetch(self.transport.as_ref(), request, Provider::Qiita, map_status).await?;
                let items: Vec<QiitaItem> = decode(&response, Provider::Qiita)?;
                Ok(transform_article_page(items, total_count(&response), page))
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use searchhub_core::http::HttpResponse;
    use searchhub_core::qiita::ArticleFilters;
    use searchhub_core::ErrorKind;
    use serde_json::json;

    const TOKEN: &str = "0123456789abcdef0123456789ABCDEF01234567";

    fn adapter(transport: &Arc<MockTransport>) -> QiitaAdapter {
        QiitaAdapter::new(transport.clone()).with_retry_policy(RetryPolicy::immediate())
    }

    fn items(start: u32, count: u32) -> String {
        let items: Vec<serde_json::Value> = (start..start + count)
            .map(|i| {
                json!({
                    "id": format!("item{i}"),
                    "title": format!("Article {i}"),
                    "url": format!("https://qiita.com/alice/items/item{i}"),
                    "user": {"id": "alice"},
                    "tags": [{"name": "Rust"}],
                    "likes_count": i,
                    "stocks_count": 0,
                    "created_at": "2024-01-01T00:00:00+09:00"
                })
            })
            .collect();
        serde_json::Value::Array(items).to_string()
    }

    fn params(keyword: &str, token: Option<&str>) -> ArticleSearchParams {
        ArticleSearchParams {
            token: token.map(str::to_string),
            keyword: keyword.to_string(),
            filters: ArticleFilters::default(),
        }
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_requests() {
        let transport = Arc::new(MockTransport::new());

        let aggregate = adapter(&transport)
            .search(&params(" ", Some(TOKEN)))
            .await
            .unwrap();

        assert!(aggregate.is_empty());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_token_fails_before_any_request() {
        let transport = Arc::new(MockTransport::new());

        let err = adapter(&transport)
            .search(&params("rust", Some("abc123")))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.provider, Some(Provider::Qiita));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_total_count_comes_from_header() {
        // Arrange
        let transport = Arc::new(
            MockTransport::new()
                .respond_with(HttpResponse::new(200, items(0, 100)).with_header("Total-Count", "130"))
                .respond_with(HttpResponse::new(200, items(100, 30)).with_header("Total-Count", "130")),
        );

        // Act
        let aggregate = adapter(&transport)
            .search(&params("rust", Some(TOKEN)))
            .await
            .unwrap();

        // Assert
        assert_eq!(aggregate.len(), 130);
        assert_eq!(aggregate.total_count, 130);
        assert_eq!(aggregate.items[100].id, "item100");
        assert_eq!(transport.calls(), 2);
        let requests = transport.requests();
        assert_eq!(
            requests[0].header_value("authorization"),
            Some(format!("Bearer {TOKEN}").as_str())
        );
        assert!(requests[1].url.contains("page=2"));
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(
                    403,
                    r#"{"message":"Rate limit exceeded","type":"rate_limit_exceeded"}"#,
                )
                .respond(200, items(0, 5)),
        );

        let aggregate = adapter(&transport)
            .search(&params("rust", None))
            .await
            .unwrap();

        assert_eq!(aggregate.len(), 5);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_unexpected_body_is_unknown() {
        let transport = Arc::new(MockTransport::new().respond(200, r#"{"items": []}"#));

        let err = adapter(&transport)
            .search(&params("rust", None))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(transport.calls(), 1);
    }
}
