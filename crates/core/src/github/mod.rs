//! GitHub search: issues and pull requests over REST, discussions over GraphQL
//!
//! Both modes share the HTTP status mapper defined here. GraphQL failures that
//! arrive inside an HTTP 200 body are mapped in [`discussions`].

pub mod discussions;
pub mod issues;

use serde::Deserialize;

use crate::error::{Provider, SearchError};
use crate::http::{HttpRequest, HttpResponse};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Results per request; GitHub's maximum for both search APIs
pub const PER_PAGE: u32 = 100;

/// Error body returned by the REST API
#[derive(Debug, Deserialize, Clone)]
pub struct GithubErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

/// Attach the headers every GitHub API call carries
pub fn github_headers(request: HttpRequest, token: Option<&str>) -> HttpRequest {
    let request = request
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", "2022-11-28");
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => request.bearer(token),
        None => request,
    }
}

/// Map a non-success REST or GraphQL HTTP response to a canonical error
///
/// A 403 is a rate limit when GitHub says so through its headers
/// (`x-ratelimit-remaining: 0` for the primary limit, `retry-after` for the
/// secondary one); otherwise the token lacks the permission it needs.
pub fn map_status(response: &HttpResponse) -> SearchError {
    let message = serde_json::from_str::<GithubErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| response.body_excerpt());
    let message = format!("[{}] {}", response.status, message);

    let rate_limited = response.header("x-ratelimit-remaining") == Some("0")
        || response.header("retry-after").is_some();

    let err = match response.status {
        401 => SearchError::unauthorized(message),
        403 if rate_limited => SearchError::rate_limit(message),
        403 => SearchError::missing_scope(message),
        404 => SearchError::not_found(message),
        400 | 422 => SearchError::validation(message),
        429 => SearchError::rate_limit(message),
        _ => SearchError::provider_specific(message),
    };

    err.with_provider(Provider::Github)
        .with_cause(response.body_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_map_status_table() {
        let cases = [
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::MissingScope),
            (404, ErrorKind::NotFound),
            (422, ErrorKind::Validation),
            (400, ErrorKind::Validation),
            (429, ErrorKind::RateLimit),
            (500, ErrorKind::ProviderSpecific),
            (418, ErrorKind::ProviderSpecific),
        ];

        for (status, expected) in cases {
            let err = map_status(&HttpResponse::new(status, r#"{"message":"nope"}"#));
            assert_eq!(err.kind, expected, "status {status}");
            assert_eq!(err.provider, Some(Provider::Github));
        }
    }

    #[test]
    fn test_map_status_primary_rate_limit_via_headers() {
        let response = HttpResponse::new(403, r#"{"message":"API rate limit exceeded"}"#)
            .with_header("X-RateLimit-Remaining", "0");

        let err = map_status(&response);

        assert_eq!(err.kind, ErrorKind::RateLimit);
        assert_eq!(err.message, "[403] API rate limit exceeded");
    }

    #[test]
    fn test_map_status_secondary_rate_limit_via_retry_after() {
        let response = HttpResponse::new(403, "{}").with_header("Retry-After", "60");
        assert_eq!(map_status(&response).kind, ErrorKind::RateLimit);
    }

    #[test]
    fn test_map_status_non_json_body_uses_excerpt() {
        let err = map_status(&HttpResponse::new(502, "<html>Bad gateway</html>"));
        assert_eq!(err.message, "[502] <html>Bad gateway</html>");
        assert_eq!(
            err.cause,
            Some(serde_json::Value::String("<html>Bad gateway</html>".to_string()))
        );
    }

    #[test]
    fn test_github_headers_skip_blank_token() {
        let request = github_headers(HttpRequest::get("https://api.github.com/x"), Some("  "));
        assert_eq!(request.header_value("authorization"), None);

        let request = github_headers(HttpRequest::get("https://api.github.com/x"), Some("ghp_abc"));
        assert_eq!(request.header_value("Authorization"), Some("Bearer ghp_abc"));
    }
}
