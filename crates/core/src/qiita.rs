//! Qiita article search
//!
//! `GET /api/v2/items` answers with a bare JSON array and reports the total
//! number of matches in the `Total-Count` response header.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Provider, SearchError};
use crate::http::{with_query, HttpRequest, HttpResponse};
use crate::pagination::{Page, PageState};
use crate::query::{fmt_date, QueryBuilder, QuoteStyle};

pub const DEFAULT_BASE_URL: &str = "https://qiita.com";

pub const PER_PAGE: u32 = 100;

/// Length of a Qiita personal access token
pub const TOKEN_LENGTH: usize = 40;

// ============================================================================
// Search Parameters
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleFilters {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
    #[serde(default)]
    pub min_stocks: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSearchParams {
    #[serde(default)]
    pub token: Option<String>,
    pub keyword: String,
    #[serde(default)]
    pub filters: ArticleFilters,
}

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct QiitaItem {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub user: Option<QiitaUser>,
    #[serde(default)]
    pub tags: Vec<QiitaTag>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub stocks_count: u64,
    pub created_at: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QiitaUser {
    pub id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QiitaTag {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QiitaErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

// ============================================================================
// Output Models (Domain Model)
// ============================================================================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ArticleItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub user: Option<String>,
    pub tags: Vec<String>,
    pub likes_count: u64,
    pub stocks_count: u64,
    pub created_at: String,
}

// ============================================================================
// Pure Functions
// ============================================================================

/// Reject a supplied token that cannot be a Qiita access token
///
/// A missing or blank token is allowed; unauthenticated requests work with a
/// lower rate limit.
pub fn validate_token(token: Option<&str>) -> Result<(), SearchError> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(());
    };

    if token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(SearchError::validation(format!(
            "Qiita token must be {TOKEN_LENGTH} hexadecimal characters"
        ))
        .with_provider(Provider::Qiita))
    }
}

pub fn build_article_query(keyword: &str, filters: &ArticleFilters) -> String {
    QueryBuilder::with_style(QuoteStyle::Strip)
        .words(keyword)
        .qualifiers("tag", &filters.tags)
        .qualifier_opt("user", filters.user.as_deref())
        .qualifier_opt("title", filters.title.as_deref())
        .raw_opt(filters.created_from.map(|d| format!("created:>={}", fmt_date(d))))
        .raw_opt(filters.created_to.map(|d| format!("created:<={}", fmt_date(d))))
        .raw_opt(filters.min_stocks.map(|n| format!("stocks:>={n}")))
        .build()
}

pub fn items_request(base_url: &str, token: Option<&str>, query: &str, page: u32) -> HttpRequest {
    let base_url = base_url.trim_end_matches('/');
    let url = with_query(
        &format!("{base_url}/api/v2/items"),
        &[
            ("page", page.to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("query", query.to_string()),
        ],
    );

    let request = HttpRequest::get(url).header("Accept", "application/json");
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => request.bearer(token),
        None => request,
    }
}

/// Total number of matches from the `Total-Count` header
pub fn total_count(response: &HttpResponse) -> Option<u64> {
    response
        .header("total-count")
        .and_then(|value| value.trim().parse().ok())
}

/// Map a non-success response to a canonical error
///
/// The `type` field of the error body is checked first; the status code
/// decides when the body carries none.
pub fn map_status(response: &HttpResponse) -> SearchError {
    let body = serde_json::from_str::<QiitaErrorBody>(&response.body).ok();
    let error_type = body.as_ref().and_then(|b| b.error_type.clone());
    let message = body
        .and_then(|b| b.message)
        .unwrap_or_else(|| response.body_excerpt());
    let message = format!("[{}] {}", response.status, message);

    let err = match (error_type.as_deref(), response.status) {
        (Some("rate_limit_exceeded"), _) | (_, 429) => SearchError::rate_limit(message),
        (Some("unauthorized"), _) | (_, 401) => SearchError::unauthorized(message),
        (Some("forbidden"), _) | (_, 403) => SearchError::missing_scope(message),
        (Some("not_found"), _) | (_, 404) => SearchError::not_found(message),
        (_, 400 | 422) => SearchError::validation(message),
        _ => SearchError::provider_specific(message),
    };

    err.with_provider(Provider::Qiita)
        .with_cause(response.body_json())
}

pub fn transform_article(item: QiitaItem) -> ArticleItem {
    ArticleItem {
        id: item.id,
        title: item.title,
        url: item.url,
        user: item.user.map(|u| u.id),
        tags: item.tags.into_iter().map(|t| t.name).collect(),
        likes_count: item.likes_count,
        stocks_count: item.stocks_count,
        created_at: item.created_at,
    }
}

pub fn transform_article_page(
    items: Vec<QiitaItem>,
    total: Option<u64>,
    page: u32,
) -> Page<ArticleItem> {
    let short_page = items.len() < PER_PAGE as usize;
    let exhausted = total.is_some_and(|total| u64::from(page) * u64::from(PER_PAGE) >= total);

    let page_out = Page::new(
        items.into_iter().map(transform_article).collect(),
        PageState::Offset(page + 1),
        short_page || exhausted,
    );

    match total {
        Some(total) => page_out.with_total_count(total),
        None => page_out,
    }
}
