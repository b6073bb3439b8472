//! Zenn article listing with client-side filtering
//!
//! The public articles endpoint only filters by author. Article type, liked
//! count, publication date and keyword-in-title are applied here after the
//! listing has been aggregated; unpublished articles are never returned.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Provider, SearchError};
use crate::http::{with_query, HttpRequest, HttpResponse};
use crate::pagination::{Aggregate, Page, PageState};

pub const DEFAULT_BASE_URL: &str = "https://zenn.dev";

// ============================================================================
// Search Parameters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleType {
    Tech,
    Idea,
}

impl ArticleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::Tech => "tech",
            ArticleType::Idea => "idea",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZennFilters {
    /// Sent to the server; everything else is applied locally
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub article_type: Option<ArticleType>,
    #[serde(default)]
    pub min_likes: Option<u64>,
    #[serde(default)]
    pub published_from: Option<NaiveDate>,
    #[serde(default)]
    pub published_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZennSearchParams {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub filters: ZennFilters,
}

impl ZennSearchParams {
    /// Nothing to search for: no keyword and no filter set
    pub fn is_empty(&self) -> bool {
        let f = &self.filters;
        self.keyword.trim().is_empty()
            && f.username.as_deref().map_or(true, |u| u.trim().is_empty())
            && f.article_type.is_none()
            && f.min_likes.is_none()
            && f.published_from.is_none()
            && f.published_to.is_none()
    }
}

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ZennListResponse {
    #[serde(default)]
    pub articles: Vec<ZennApiArticle>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZennApiArticle {
    pub id: u64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub article_type: Option<String>,
    #[serde(default)]
    pub liked_count: u64,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub user: Option<ZennUser>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZennUser {
    pub username: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZennErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Output Models (Domain Model)
// ============================================================================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ZennArticle {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub url: String,
    pub emoji: Option<String>,
    pub article_type: Option<String>,
    pub liked_count: u64,
    pub published_at: Option<String>,
    pub username: Option<String>,
}

// ============================================================================
// Pure Functions
// ============================================================================

pub fn articles_request(base_url: &str, username: Option<&str>, page: u32) -> HttpRequest {
    let base_url = base_url.trim_end_matches('/');
    let mut params = vec![("page", page.to_string()), ("order", "latest".to_string())];
    if let Some(username) = username.map(str::trim).filter(|u| !u.is_empty()) {
        params.push(("username", username.to_string()));
    }

    HttpRequest::get(with_query(&format!("{base_url}/api/articles"), &params))
        .header("Accept", "application/json")
}

pub fn map_status(response: &HttpResponse) -> SearchError {
    let message = serde_json::from_str::<ZennErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| response.body_excerpt());
    let message = format!("[{}] {}", response.status, message);

    let err = match response.status {
        401 => SearchError::unauthorized(message),
        403 => SearchError::missing_scope(message),
        404 => SearchError::not_found(message),
        400 | 422 => SearchError::validation(message),
        429 => SearchError::rate_limit(message),
        _ => SearchError::provider_specific(message),
    };

    err.with_provider(Provider::Zenn)
        .with_cause(response.body_json())
}

/// Convert a published article; drafts yield `None`
pub fn transform_article(base_url: &str, article: ZennApiArticle) -> Option<ZennArticle> {
    if article.published == Some(false) || article.published_at.is_none() {
        return None;
    }

    let base_url = base_url.trim_end_matches('/');
    let username = article.user.map(|u| u.username);
    let path = article.path.unwrap_or_else(|| match &username {
        Some(username) => format!("/{username}/articles/{}", article.slug),
        None => format!("/articles/{}", article.slug),
    });

    Some(ZennArticle {
        id: article.id,
        slug: article.slug,
        title: article.title,
        url: format!("{base_url}{path}"),
        emoji: article.emoji,
        article_type: article.article_type,
        liked_count: article.liked_count,
        published_at: article.published_at,
        username,
    })
}

pub fn transform_article_page(
    base_url: &str,
    response: ZennListResponse,
    page: u32,
) -> Page<ZennArticle> {
    let done = response.next_page.is_none() || response.articles.is_empty();
    let next = PageState::Offset(response.next_page.unwrap_or(page + 1));

    let items = response
        .articles
        .into_iter()
        .filter_map(|article| transform_article(base_url, article))
        .collect();

    Page::new(items, next, done)
}

/// Whether an article passes every client-side filter
pub fn matches(article: &ZennArticle, keyword: &str, filters: &ZennFilters) -> bool {
    let keyword = keyword.trim().to_lowercase();
    if !keyword.is_empty() && !article.title.to_lowercase().contains(&keyword) {
        return false;
    }

    if let Some(article_type) = filters.article_type {
        if article.article_type.as_deref() != Some(article_type.as_str()) {
            return false;
        }
    }

    if let Some(min_likes) = filters.min_likes {
        if article.liked_count < min_likes {
            return false;
        }
    }

    if filters.published_from.is_some() || filters.published_to.is_some() {
        let Some(published) = article
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.date_naive())
        else {
            return false;
        };
        if filters.published_from.is_some_and(|from| published < from) {
            return false;
        }
        if filters.published_to.is_some_and(|to| published > to) {
            return false;
        }
    }

    true
}

/// Apply the client-side filters to an aggregated listing
///
/// The total count becomes the number of surviving articles.
pub fn apply_filters(
    aggregate: Aggregate<ZennArticle>,
    keyword: &str,
    filters: &ZennFilters,
) -> Aggregate<ZennArticle> {
    let items: Vec<ZennArticle> = aggregate
        .items
        .into_iter()
        .filter(|article| matches(article, keyword, filters))
        .collect();

    Aggregate {
        total_count: items.len() as u64,
        items,
        provider_meta: aggregate.provider_meta,
    }
}
