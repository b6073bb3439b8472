//! Issue and pull request search (`GET /search/issues`)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{github_headers, PER_PAGE};
use crate::http::{with_query, HttpRequest};
use crate::pagination::{Page, PageState};
use crate::query::{dotted_date_range, QueryBuilder};

// ============================================================================
// Search Parameters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Issue,
    Pr,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Issue => "issue",
            IssueKind::Pr => "pr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueSort {
    Comments,
    Reactions,
    Created,
    Updated,
}

impl IssueSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSort::Comments => "comments",
            IssueSort::Reactions => "reactions",
            IssueSort::Created => "created",
            IssueSort::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Structured filters appended to the keyword as search qualifiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueFilters {
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub state: Option<IssueState>,
    #[serde(default)]
    pub kind: Option<IssueKind>,
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueSearchParams {
    #[serde(default)]
    pub token: Option<String>,
    pub keyword: String,
    #[serde(default)]
    pub filters: IssueFilters,
    #[serde(default)]
    pub sort: Option<IssueSort>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct GithubIssueSearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<GithubIssue>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubIssue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: String,
    #[serde(default)]
    pub user: Option<GithubUser>,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
    #[serde(default)]
    pub comments: u64,
    pub created_at: String,
    pub updated_at: String,
    /// Present only on pull requests
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
    #[serde(default)]
    pub repository_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubUser {
    pub login: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubLabel {
    pub name: String,
}

// ============================================================================
// Output Models (Domain Model)
// ============================================================================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct IssueItem {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: String,
    pub author: Option<String>,
    pub labels: Vec<String>,
    pub comments: u64,
    pub created_at: String,
    pub updated_at: String,
    pub is_pull_request: bool,
    /// `owner/name`, derived from the repository API URL
    pub repository: Option<String>,
}

// ============================================================================
// Pure Functions
// ============================================================================

/// Build the `q` parameter: quoted keyword followed by qualifiers
pub fn build_issue_query(keyword: &str, filters: &IssueFilters) -> String {
    QueryBuilder::new()
        .phrase(keyword)
        .qualifiers("repo", &filters.repositories)
        .qualifier_opt("author", filters.author.as_deref())
        .qualifier_opt("assignee", filters.assignee.as_deref())
        .qualifiers("label", &filters.labels)
        .qualifier_opt("state", filters.state.as_ref().map(IssueState::as_str))
        .qualifier_opt("is", filters.kind.as_ref().map(IssueKind::as_str))
        .raw_opt(dotted_date_range(
            "created",
            filters.created_from,
            filters.created_to,
        ))
        .build()
}

/// Request for one page of issue search results
pub fn issues_request(
    api_url: &str,
    token: Option<&str>,
    query: &str,
    sort: Option<IssueSort>,
    order: Option<SortOrder>,
    page: u32,
) -> HttpRequest {
    let base_url = api_url.trim_end_matches('/');
    let mut params = vec![("q", query.to_string())];
    if let Some(sort) = sort {
        params.push(("sort", sort.as_str().to_string()));
    }
    if let Some(order) = order {
        params.push(("order", order.as_str().to_string()));
    }
    params.push(("per_page", PER_PAGE.to_string()));
    params.push(("page", page.to_string()));

    let url = with_query(&format!("{base_url}/search/issues"), &params);
    github_headers(HttpRequest::get(url), token)
}

/// Extract `owner/name` from `https://api.github.com/repos/owner/name`
pub fn repository_from_url(repository_url: &str) -> Option<String> {
    let (_, rest) = repository_url.split_once("/repos/")?;
    let mut parts = rest.trim_end_matches('/').splitn(3, '/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => {
            Some(format!("{owner}/{name}"))
        }
        _ => None,
    }
}

pub fn transform_issue(issue: GithubIssue) -> IssueItem {
    IssueItem {
        number: issue.number,
        title: issue.title,
        url: issue.html_url,
        state: issue.state,
        author: issue.user.map(|u| u.login),
        labels: issue.labels.into_iter().map(|l| l.name).collect(),
        comments: issue.comments,
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        is_pull_request: issue.pull_request.is_some(),
        repository: issue.repository_url.as_deref().and_then(repository_from_url),
    }
}

/// Convert one REST response into a page
///
/// The page is the last one when it is short or when the pages fetched so far
/// already cover `total_count`.
pub fn transform_issue_page(response: GithubIssueSearchResponse, page: u32) -> Page<IssueItem> {
    let received = response.items.len() as u64;
    let covered = u64::from(page) * u64::from(PER_PAGE);
    let done = received < u64::from(PER_PAGE) || covered >= response.total_count;

    let items = response.items.into_iter().map(transform_issue).collect();

    Page::new(items, PageState::Offset(page + 1), done).with_total_count(response.total_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_issue(number: u64) -> GithubIssue {
        GithubIssue {
            number,
            title: format!("Issue {number}"),
            html_url: format!("https://github.com/octo/repo/issues/{number}"),
            state: "open".to_string(),
            user: Some(GithubUser {
                login: "octocat".to_string(),
            }),
            labels: vec![GithubLabel {
                name: "bug".to_string(),
            }],
            comments: 3,
            created_at: "2024-01-02T03:04:05Z".to_string(),
            updated_at: "2024-01-03T03:04:05Z".to_string(),
            pull_request: None,
            repository_url: Some("https://api.github.com/repos/octo/repo".to_string()),
        }
    }

    #[test]
    fn test_build_issue_query_all_filters() {
        let filters = IssueFilters {
            repositories: vec!["octo/repo".to_string()],
            author: Some("alice".to_string()),
            assignee: Some("bob".to_string()),
            labels: vec!["bug".to_string(), "help wanted".to_string()],
            state: Some(IssueState::Open),
            kind: Some(IssueKind::Pr),
            created_from: Some(date("2024-01-01")),
            created_to: Some(date("2024-03-31")),
        };

        let query = build_issue_query("memory leak", &filters);

        assert_eq!(
            query,
            r#""memory leak" repo:octo/repo author:alice assignee:bob label:bug label:"help wanted" state:open is:pr created:2024-01-01..2024-03-31"#
        );
    }

    #[test]
    fn test_build_issue_query_empty_inputs() {
        assert_eq!(build_issue_query("  ", &IssueFilters::default()), "");
    }

    #[test]
    fn test_build_issue_query_filters_without_keyword() {
        let filters = IssueFilters {
            author: Some("alice".to_string()),
            ..Default::default()
        };
        assert_eq!(build_issue_query("", &filters), "author:alice");
    }

    #[test]
    fn test_issues_request_shape() {
        let request = issues_request(
            "https://api.github.com/",
            Some("ghp_token"),
            "\"bug\" repo:octo/repo",
            Some(IssueSort::Updated),
            Some(SortOrder::Desc),
            3,
        );

        assert_eq!(
            request.url,
            "https://api.github.com/search/issues?q=%22bug%22%20repo%3Aocto%2Frepo&sort=updated&order=desc&per_page=100&page=3"
        );
        assert_eq!(request.header_value("authorization"), Some("Bearer ghp_token"));
    }

    #[test]
    fn test_repository_from_url() {
        assert_eq!(
            repository_from_url("https://api.github.com/repos/rust-lang/rust"),
            Some("rust-lang/rust".to_string())
        );
        assert_eq!(repository_from_url("https://api.github.com/users/x"), None);
    }

    #[test]
    fn test_transform_issue_detects_pull_requests() {
        let mut issue = sample_issue(7);
        issue.pull_request = Some(serde_json::json!({"url": "https://api.github.com/x"}));

        let item = transform_issue(issue);

        assert!(item.is_pull_request);
        assert_eq!(item.author.as_deref(), Some("octocat"));
        assert_eq!(item.labels, vec!["bug"]);
        assert_eq!(item.repository.as_deref(), Some("octo/repo"));
    }

    #[test]
    fn test_transform_issue_page_short_page_is_last() {
        let response = GithubIssueSearchResponse {
            total_count: 250,
            incomplete_results: false,
            items: (1..=50).map(sample_issue).collect(),
        };

        let page = transform_issue_page(response, 3);

        assert!(page.done);
        assert_eq!(page.items.len(), 50);
        assert_eq!(page.total_count, Some(250));
        assert_eq!(page.next, PageState::Offset(4));
    }

    #[test]
    fn test_transform_issue_page_full_page_continues() {
        let response = GithubIssueSearchResponse {
            total_count: 5000,
            incomplete_results: false,
            items: (1..=100).map(sample_issue).collect(),
        };

        let page = transform_issue_page(response, 1);

        assert!(!page.done);
        assert_eq!(page.next, PageState::Offset(2));
    }

    #[test]
    fn test_deserialize_search_response() {
        let body = r#"{
            "total_count": 1,
            "incomplete_results": false,
            "items": [{
                "number": 42,
                "title": "Crash on start",
                "html_url": "https://github.com/octo/repo/issues/42",
                "state": "closed",
                "user": {"login": "alice"},
                "labels": [],
                "comments": 0,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-02T00:00:00Z",
                "repository_url": "https://api.github.com/repos/octo/repo"
            }]
        }"#;

        let response: GithubIssueSearchResponse = serde_json::from_str(body).unwrap();
        let page = transform_issue_page(response, 1);

        assert!(page.done);
        assert_eq!(page.items[0].number, 42);
        assert!(!page.items[0].is_pull_request);
    }
}
