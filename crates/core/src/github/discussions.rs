//! Discussion search over the GraphQL API
//!
//! The query document is a constant; the user's search string travels as the
//! `$query` variable, so nothing the user types is spliced into GraphQL
//! syntax. GraphQL reports failures in a top-level `errors[]` array while
//! answering HTTP 200, so the body is inspected for errors before the data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{github_headers, PER_PAGE};
use crate::error::{Provider, SearchError};
use crate::http::HttpRequest;
use crate::pagination::{Page, PageState, ProviderMeta};
use crate::query::{dotted_date_range, QueryBuilder};

pub const SEARCH_DISCUSSIONS_QUERY: &str = r#"query SearchDiscussions($query: String!, $first: Int!, $after: String) {
  search(query: $query, type: DISCUSSION, first: $first, after: $after) {
    discussionCount
    pageInfo {
      endCursor
      hasNextPage
    }
    edges {
      node {
        ... on Discussion {
          number
          title
          url
          createdAt
          isAnswered
          author { login }
          category { name }
          comments { totalCount }
          repository { nameWithOwner }
        }
      }
    }
  }
  rateLimit {
    remaining
    limit
    resetAt
  }
}"#;

// ============================================================================
// Search Parameters
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscussionFilters {
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// `Some(true)` for answered only, `Some(false)` for unanswered only
    #[serde(default)]
    pub answered: Option<bool>,
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscussionSearchParams {
    #[serde(default)]
    pub token: Option<String>,
    pub keyword: String,
    #[serde(default)]
    pub filters: DiscussionFilters,
}

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<DiscussionSearchData>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionSearchData {
    pub search: DiscussionConnection,
    #[serde(default)]
    pub rate_limit: Option<GraphqlRateLimit>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionConnection {
    pub discussion_count: u64,
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<DiscussionEdge>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscussionEdge {
    #[serde(default)]
    pub node: Option<DiscussionNode>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionNode {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub created_at: String,
    #[serde(default)]
    pub is_answered: Option<bool>,
    #[serde(default)]
    pub author: Option<Login>,
    #[serde(default)]
    pub category: Option<Named>,
    #[serde(default)]
    pub comments: Option<TotalCount>,
    #[serde(default)]
    pub repository: Option<NameWithOwner>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Login {
    pub login: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NameWithOwner {
    pub name_with_owner: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRateLimit {
    pub remaining: u32,
    pub limit: u32,
    pub reset_at: String,
}

// ============================================================================
// Output Models (Domain Model)
// ============================================================================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DiscussionItem {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub answered: bool,
    pub comments: u64,
    pub created_at: String,
    pub repository: Option<String>,
}

// ============================================================================
// Pure Functions
// ============================================================================

pub fn build_discussion_query(keyword: &str, filters: &DiscussionFilters) -> String {
    QueryBuilder::new()
        .phrase(keyword)
        .qualifiers("repo", &filters.repositories)
        .qualifier_opt("author", filters.author.as_deref())
        .qualifier_opt("category", filters.category.as_deref())
        .raw_opt(filters.answered.map(|answered| {
            if answered {
                "is:answered".to_string()
            } else {
                "is:unanswered".to_string()
            }
        }))
        .raw_opt(dotted_date_range(
            "created",
            filters.created_from,
            filters.created_to,
        ))
        .build()
}

/// GraphQL request for the page after `cursor` (`None` for the first page)
pub fn discussions_request(
    api_url: &str,
    token: Option<&str>,
    query: &str,
    cursor: Option<&str>,
) -> HttpRequest {
    let base_url = api_url.trim_end_matches('/');
    let body = serde_json::json!({
        "query": SEARCH_DISCUSSIONS_QUERY,
        "variables": {
            "query": query,
            "first": PER_PAGE,
            "after": cursor,
        },
    });

    github_headers(HttpRequest::post(format!("{base_url}/graphql")), token).json(body)
}

/// Map a non-empty GraphQL `errors[]` array to a validation error
///
/// The message keeps every GraphQL message behind a `GraphQL error:` marker;
/// the array itself is attached as the cause.
pub fn map_graphql_errors(errors: &[GraphqlError]) -> SearchError {
    let messages = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    SearchError::validation(format!("GraphQL error: {messages}"))
        .with_provider(Provider::Github)
        .with_cause(serde_json::to_value(errors).unwrap_or_default())
}

pub fn transform_discussion(node: DiscussionNode) -> DiscussionItem {
    DiscussionItem {
        number: node.number,
        title: node.title,
        url: node.url,
        author: node.author.map(|a| a.login),
        category: node.category.map(|c| c.name),
        answered: node.is_answered.unwrap_or(false),
        comments: node.comments.map(|c| c.total_count).unwrap_or(0),
        created_at: node.created_at,
        repository: node.repository.map(|r| r.name_with_owner),
    }
}

/// Convert one GraphQL response into a page, surfacing `errors[]` first
pub fn transform_discussion_response(
    response: GraphqlResponse,
) -> Result<Page<DiscussionItem>, SearchError> {
    if let Some(errors) = response.errors.as_deref().filter(|e| !e.is_empty()) {
        return Err(map_graphql_errors(errors));
    }

    let data = response.data.ok_or_else(|| {
        SearchError::unknown("GraphQL response contained neither data nor errors")
            .with_provider(Provider::Github)
    })?;

    let search = data.search;
    let done = !search.page_info.has_next_page || search.page_info.end_cursor.is_none();

    let items = search
        .edges
        .into_iter()
        .filter_map(|edge| edge.node)
        .map(transform_discussion)
        .collect();

    let meta = data.rate_limit.map(|rl| ProviderMeta::RateLimit {
        remaining: rl.remaining,
        limit: rl.limit,
        reset_at: rl.reset_at,
    });

    Ok(Page::new(items, PageState::Cursor(search.page_info.end_cursor), done)
        .with_total_count(search.discussion_count)
        .with_provider_meta(meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::RequestBody;

    fn parse(body: &str) -> GraphqlResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_build_discussion_query() {
        let filters = DiscussionFilters {
            repositories: vec!["octo/repo".to_string()],
            category: Some("Q&A".to_string()),
            answered: Some(false),
            ..Default::default()
        };

        assert_eq!(
            build_discussion_query("how to", &filters),
            r#""how to" repo:octo/repo category:Q&A is:unanswered"#
        );
    }

    #[test]
    fn test_request_passes_search_string_as_variable() {
        // Arrange: a keyword that would break a spliced GraphQL string literal
        let query = build_discussion_query(r#"") { viewer { login } } #"#, &Default::default());

        // Act
        let request = discussions_request("https://api.github.com", Some("t"), &query, None);

        // Assert: the document is untouched and the input is only in variables
        let RequestBody::Json(body) = &request.body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["query"], SEARCH_DISCUSSIONS_QUERY);
        assert_eq!(body["variables"]["query"], query.as_str());
        assert_eq!(body["variables"]["first"], 100);
        assert!(body["variables"]["after"].is_null());
        assert_eq!(request.url, "https://api.github.com/graphql");
    }

    #[test]
    fn test_request_carries_cursor() {
        let request = discussions_request("https://api.github.com", None, "q", Some("Y3Vyc29y"));
        let RequestBody::Json(body) = &request.body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["variables"]["after"], "Y3Vyc29y");
    }

    #[test]
    fn test_errors_array_on_http_200_is_validation() {
        let response = parse(
            r#"{
                "data": null,
                "errors": [{"type": "INVALID_CURSOR_ARGUMENTS", "message": "`bogus` does not appear to be a valid cursor."}]
            }"#,
        );

        let err = transform_discussion_response(response).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.provider, Some(Provider::Github));
        assert!(err.message.starts_with("GraphQL error:"));
        assert!(err.message.contains("does not appear to be a valid cursor"));
        assert_eq!(err.cause.unwrap()[0]["type"], "INVALID_CURSOR_ARGUMENTS");
    }

    #[test]
    fn test_errors_take_precedence_over_partial_data() {
        let response = parse(
            r#"{
                "data": {"search": {"discussionCount": 0, "pageInfo": {"endCursor": null, "hasNextPage": false}, "edges": []}},
                "errors": [{"message": "Something went wrong"}]
            }"#,
        );

        let err = transform_discussion_response(response).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_empty_errors_array_is_ignored() {
        let response = parse(
            r#"{
                "data": {"search": {"discussionCount": 0, "pageInfo": {"endCursor": null, "hasNextPage": false}, "edges": []}},
                "errors": []
            }"#,
        );
        assert!(transform_discussion_response(response).is_ok());
    }

    #[test]
    fn test_missing_data_is_unknown() {
        let err = transform_discussion_response(parse("{}")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_transform_page_maps_fields_and_cursor() {
        let response = parse(
            r#"{
                "data": {
                    "search": {
                        "discussionCount": 321,
                        "pageInfo": {"endCursor": "Y3Vyc29yOjI=", "hasNextPage": true},
                        "edges": [
                            {"node": {
                                "number": 12,
                                "title": "How do I configure X?",
                                "url": "https://github.com/octo/repo/discussions/12",
                                "createdAt": "2024-05-01T10:00:00Z",
                                "isAnswered": true,
                                "author": {"login": "alice"},
                                "category": {"name": "Q&A"},
                                "comments": {"totalCount": 4},
                                "repository": {"nameWithOwner": "octo/repo"}
                            }},
                            {"node": null}
                        ]
                    },
                    "rateLimit": {"remaining": 4990, "limit": 5000, "resetAt": "2024-05-01T11:00:00Z"}
                }
            }"#,
        );

        let page = transform_discussion_response(response).unwrap();

        assert!(!page.done);
        assert_eq!(page.next, PageState::Cursor(Some("Y3Vyc29yOjI=".to_string())));
        assert_eq!(page.total_count, Some(321));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].author.as_deref(), Some("alice"));
        assert_eq!(page.items[0].comments, 4);
        assert!(page.items[0].answered);
        assert_eq!(
            page.provider_meta,
            Some(ProviderMeta::RateLimit {
                remaining: 4990,
                limit: 5000,
                reset_at: "2024-05-01T11:00:00Z".to_string(),
            })
        );
    }

    #[test]
    fn test_last_page_when_has_next_page_false() {
        let response = parse(
            r#"{"data": {"search": {"discussionCount": 1, "pageInfo": {"endCursor": "abc", "hasNextPage": false}, "edges": []}}}"#,
        );
        let page = transform_discussion_response(response).unwrap();
        assert!(page.done);
        assert_eq!(page.provider_meta, None);
    }
}
