//! DocBase post search

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Provider, SearchError};
use crate::http::{with_query, HttpRequest, HttpResponse};
use crate::pagination::{Page, PageState};
use crate::query::{fmt_date, QueryBuilder, QuoteStyle};

pub const DEFAULT_API_URL: &str = "https://api.docbase.io";

pub const PER_PAGE: u32 = 100;

// ============================================================================
// Search Parameters
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostFilters {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostSearchParams {
    pub token: String,
    /// Team sub-domain, `acme` for `acme.docbase.io`
    pub domain: String,
    pub keyword: String,
    #[serde(default)]
    pub filters: PostFilters,
}

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct DocbasePostsResponse {
    #[serde(default)]
    pub posts: Vec<DocbasePost>,
    #[serde(default)]
    pub meta: Option<DocbaseMeta>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocbaseMeta {
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocbasePost {
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub draft: bool,
    pub created_at: String,
    #[serde(default)]
    pub user: Option<DocbaseUser>,
    #[serde(default)]
    pub tags: Vec<DocbaseNamed>,
    #[serde(default)]
    pub groups: Vec<DocbaseNamed>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocbaseUser {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocbaseNamed {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocbaseErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

// ============================================================================
// Output Models (Domain Model)
// ============================================================================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PostItem {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub groups: Vec<String>,
    pub created_at: String,
    pub draft: bool,
}

// ============================================================================
// Pure Functions
// ============================================================================

/// Check the fields DocBase needs before anything is sent
pub fn validate_params(token: &str, domain: &str) -> Result<(), SearchError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(SearchError::validation("DocBase team domain is required")
            .with_provider(Provider::Docbase));
    }
    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(
            SearchError::validation(format!("invalid DocBase team domain: {domain}"))
                .with_provider(Provider::Docbase),
        );
    }
    if token.trim().is_empty() {
        return Err(SearchError::validation("DocBase token is required")
            .with_provider(Provider::Docbase));
    }
    Ok(())
}

pub fn build_post_query(keyword: &str, filters: &PostFilters) -> String {
    let created = match (filters.created_from, filters.created_to) {
        (None, None) => None,
        (from, to) => Some(format!(
            "created_at:{}~{}",
            from.map(fmt_date).unwrap_or_default(),
            to.map(fmt_date).unwrap_or_default()
        )),
    };

    QueryBuilder::with_style(QuoteStyle::Strip)
        .words(keyword)
        .qualifiers("tag", &filters.tags)
        .qualifier_opt("author", filters.author.as_deref())
        .qualifier_opt("group", filters.group.as_deref())
        .raw_opt(created)
        .build()
}

pub fn posts_request(
    api_url: &str,
    token: &str,
    domain: &str,
    query: &str,
    page: u32,
) -> HttpRequest {
    let api_url = api_url.trim_end_matches('/');
    let url = with_query(
        &format!("{api_url}/teams/{}/posts", domain.trim()),
        &[
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("per_page", PER_PAGE.to_string()),
        ],
    );

    HttpRequest::get(url)
        .header("X-DocBaseToken", token.trim())
        .header("X-Api-Version", "2")
        .header("Accept", "application/json")
}

pub fn map_status(response: &HttpResponse) -> SearchError {
    let body = serde_json::from_str::<DocbaseErrorBody>(&response.body).ok();
    let detail = body
        .map(|b| {
            let mut parts: Vec<String> = b.error.into_iter().collect();
            parts.extend(b.messages);
            parts.join(": ")
        })
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| response.body_excerpt());
    let message = format!("[{}] {}", response.status, detail);

    let err = match response.status {
        401 => SearchError::unauthorized(message),
        403 => SearchError::missing_scope(message),
        404 => SearchError::not_found(message),
        400 | 422 => SearchError::validation(message),
        429 => SearchError::rate_limit(message),
        _ => SearchError::provider_specific(message),
    };

    err.with_provider(Provider::Docbase)
        .with_cause(response.body_json())
}

pub fn transform_post(post: DocbasePost) -> PostItem {
    PostItem {
        id: post.id,
        title: post.title,
        url: post.url,
        author: post.user.map(|u| u.name),
        tags: post.tags.into_iter().map(|t| t.name).collect(),
        groups: post.groups.into_iter().map(|g| g.name).collect(),
        created_at: post.created_at,
        draft: post.draft,
    }
}

pub fn transform_post_page(response: DocbasePostsResponse, page: u32) -> Page<PostItem> {
    let next_page = response.meta.as_ref().and_then(|m| m.next_page.clone());
    let total = response.meta.as_ref().and_then(|m| m.total);
    let done = next_page.is_none() || response.posts.is_empty();

    let page_out = Page::new(
        response.posts.into_iter().map(transform_post).collect(),
        PageState::Offset(page + 1),
        done,
    );

    match total {
        Some(total) => page_out.with_total_count(total),
        None => page_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn posts_response(count: u64, next_page: Option<&str>) -> DocbasePostsResponse {
        let posts: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "id": i,
                    "title": format!("Post {i}"),
                    "body": "...",
                    "draft": false,
                    "url": format!("https://acme.docbase.io/posts/{i}"),
                    "created_at": "2024-02-01T10:00:00+09:00",
                    "user": {"id": 1, "name": "alice"},
                    "tags": [{"name": "rust"}],
                    "groups": [{"id": 2, "name": "engineering"}]
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({
            "posts": posts,
            "meta": {"previous_page": null, "next_page": next_page, "total": 250}
        }))
        .unwrap()
    }

    #[test]
    fn test_blank_domain_is_validation() {
        let err = validate_params("token", "  ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.provider, Some(Provider::Docbase));
    }

    #[test]
    fn test_domain_cannot_escape_the_path() {
        assert!(validate_params("token", "acme/../other").is_err());
        assert!(validate_params("token", "acme-dev").is_ok());
    }

    #[test]
    fn test_blank_token_is_validation() {
        assert_eq!(
            validate_params("", "acme").unwrap_err().kind,
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_build_post_query() {
        let filters = PostFilters {
            tags: vec!["rust".to_string()],
            author: Some("alice".to_string()),
            group: Some("eng team".to_string()),
            created_from: NaiveDate::from_ymd_opt(2024, 1, 1),
            created_to: None,
        };

        assert_eq!(
            build_post_query("release notes", &filters),
            r#"release notes tag:rust author:alice group:"eng team" created_at:2024-01-01~"#
        );
    }

    #[test]
    fn test_posts_request() {
        let request = posts_request("https://api.docbase.io", "secret", "acme", "rust", 2);

        assert_eq!(
            request.url,
            "https://api.docbase.io/teams/acme/posts?q=rust&page=2&per_page=100"
        );
        assert_eq!(request.header_value("x-docbasetoken"), Some("secret"));
        assert_eq!(request.header_value("authorization"), None);
    }

    #[test]
    fn test_transform_post_page() {
        let page = transform_post_page(
            posts_response(100, Some("https://api.docbase.io/teams/acme/posts?page=2")),
            1,
        );

        assert!(!page.done);
        assert_eq!(page.next, PageState::Offset(2));
        assert_eq!(page.total_count, Some(250));
        assert_eq!(page.items[0].author.as_deref(), Some("alice"));
        assert_eq!(page.items[0].groups, vec!["engineering"]);
    }

    #[test]
    fn test_last_page_has_no_next_page() {
        assert!(transform_post_page(posts_response(50, None), 3).done);
    }

    #[test]
    fn test_map_status() {
        let response = HttpResponse::new(
            403,
            r#"{"error":"forbidden","messages":["You are not allowed"]}"#,
        );
        let err = map_status(&response);
        assert_eq!(err.kind, ErrorKind::MissingScope);
        assert_eq!(err.message, "[403] forbidden: You are not allowed");

        assert_eq!(map_status(&HttpResponse::new(401, "")).kind, ErrorKind::Unauthorized);
        assert_eq!(map_status(&HttpResponse::new(429, "")).kind, ErrorKind::RateLimit);
    }
}
