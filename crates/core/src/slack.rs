//! Slack message search and thread expansion
//!
//! Every Web API response is an `{ok, error?, ...}` envelope: `ok: false` is a
//! failure even when the HTTP status is 200, and the `error` string is what
//! gets classified. Message text arrives HTML-entity encoded.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Provider, SearchError};
use crate::http::{with_query, HttpRequest, HttpResponse};
use crate::pagination::{Aggregate, Page, PageState};
use crate::query::{fmt_date, QueryBuilder, QuoteStyle};

pub const DEFAULT_API_URL: &str = "https://slack.com/api";

/// Matches per `search.messages` page; Slack's maximum
pub const PER_PAGE: u32 = 100;

// ============================================================================
// Search Parameters
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageFilters {
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub after: Option<NaiveDate>,
    #[serde(default)]
    pub before: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageSearchParams {
    pub token: String,
    pub keyword: String,
    #[serde(default)]
    pub filters: MessageFilters,
}

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchMessagesResponse {
    pub messages: SearchMessages,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchMessages {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub matches: Vec<SlackMatch>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Paging {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackMatch {
    pub ts: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub channel: Option<SlackChannel>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackChannel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepliesResponse {
    #[serde(default)]
    pub messages: Vec<SlackReply>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackReply {
    pub ts: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PermalinkResponse {
    pub permalink: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserInfoResponse {
    pub user: SlackUser,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: Option<SlackProfile>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackProfile {
    #[serde(default)]
    pub display_name: Option<String>,
}

// ============================================================================
// Output Models (Domain Model)
// ============================================================================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MessageItem {
    pub ts: String,
    pub text: String,
    pub user: Option<String>,
    pub username: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub permalink: Option<String>,
    /// Root timestamp of the thread the message belongs to
    pub thread_ts: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct ThreadRoot {
    pub channel_id: String,
    pub thread_ts: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ThreadMessage {
    pub ts: String,
    pub user: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Thread {
    pub channel_id: String,
    pub thread_ts: String,
    pub messages: Vec<ThreadMessage>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ThreadedSearch {
    pub aggregate: Aggregate<MessageItem>,
    pub threads: Vec<Thread>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub real_name: Option<String>,
    pub display_name: Option<String>,
}

// ============================================================================
// Requests
// ============================================================================

fn api_url(base_url: &str, method: &str) -> String {
    format!("{}/{method}", base_url.trim_end_matches('/'))
}

pub fn build_message_query(keyword: &str, filters: &MessageFilters) -> String {
    let channels: Vec<String> = filters
        .channels
        .iter()
        .map(|c| c.trim().trim_start_matches('#').to_string())
        .filter(|c| !c.is_empty())
        .map(|c| format!("#{c}"))
        .collect();

    QueryBuilder::with_style(QuoteStyle::Strip)
        .words(keyword)
        .qualifiers("in", &channels)
        .qualifier_opt(
            "from",
            filters
                .from
                .as_deref()
                .map(|u| u.trim().trim_start_matches('@'))
                .filter(|u| !u.is_empty())
                .map(|u| format!("@{u}"))
                .as_deref(),
        )
        .raw_opt(filters.after.map(|d| format!("after:{}", fmt_date(d))))
        .raw_opt(filters.before.map(|d| format!("before:{}", fmt_date(d))))
        .build()
}

pub fn search_request(base_url: &str, token: &str, query: &str, page: u32) -> HttpRequest {
    HttpRequest::post(api_url(base_url, "search.messages")).form([
        ("token", token.to_string()),
        ("query", query.to_string()),
        ("count", PER_PAGE.to_string()),
        ("page", page.to_string()),
    ])
}

pub fn replies_request(base_url: &str, token: &str, channel: &str, thread_ts: &str) -> HttpRequest {
    HttpRequest::post(api_url(base_url, "conversations.replies")).form([
        ("token", token),
        ("channel", channel),
        ("ts", thread_ts),
    ])
}

pub fn permalink_request(base_url: &str, token: &str, channel: &str, message_ts: &str) -> HttpRequest {
    let url = with_query(
        &api_url(base_url, "chat.getPermalink"),
        &[
            ("channel", channel.to_string()),
            ("message_ts", message_ts.to_string()),
        ],
    );
    HttpRequest::get(url).bearer(token.trim())
}

pub fn user_info_request(base_url: &str, token: &str, user_id: &str) -> HttpRequest {
    HttpRequest::post(api_url(base_url, "users.info")).form([("token", token), ("user", user_id)])
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Classify a Slack `error` string
pub fn map_error_code(code: &str) -> SearchError {
    let err = match code {
        "invalid_auth" | "not_authed" | "token_revoked" | "token_expired"
        | "account_inactive" => SearchError::unauthorized(code),
        "channel_not_found" | "thread_not_found" | "message_not_found" | "user_not_found" => {
            SearchError::not_found(code)
        }
        "ratelimited" | "rate_limited" => SearchError::rate_limit(code),
        "invalid_arguments" | "no_query" | "invalid_cursor" => SearchError::validation(code),
        "missing_scope" | "not_allowed_token_type" => SearchError::missing_scope(code),
        _ => SearchError::provider_specific(code),
    };
    err.with_provider(Provider::Slack)
}

/// Map a non-success HTTP response
///
/// An `{ok: false, error}` body wins over the status code.
pub fn map_status(response: &HttpResponse) -> SearchError {
    let envelope = serde_json::from_str::<Envelope>(&response.body).ok();
    let err = match envelope.and_then(|e| e.error) {
        Some(code) => map_error_code(&code),
        None => {
            let message = format!("[{}] {}", response.status, response.body_excerpt());
            let err = match response.status {
                401 => SearchError::unauthorized(message),
                403 => SearchError::missing_scope(message),
                404 => SearchError::not_found(message),
                400 | 422 => SearchError::validation(message),
                429 => SearchError::rate_limit(message),
                _ => SearchError::provider_specific(message),
            };
            err.with_provider(Provider::Slack)
        }
    };
    err.with_cause(response.body_json())
}

/// Unwrap the `{ok, error}` envelope of a successfully transported response
pub fn parse_envelope<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, SearchError> {
    let envelope: Envelope = serde_json::from_value(body.clone())
        .map_err(|e| SearchError::malformed("Slack envelope", &e).with_provider(Provider::Slack))?;

    if !envelope.ok {
        let code = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
        return Err(map_error_code(&code).with_cause(body));
    }

    serde_json::from_value(body)
        .map_err(|e| SearchError::malformed("Slack response", &e).with_provider(Provider::Slack))
}

// ============================================================================
// Transformations
// ============================================================================

pub fn decode_text(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Thread root from the `thread_ts` query parameter of a permalink
fn thread_ts_from_permalink(permalink: &str) -> Option<String> {
    let (_, query) = permalink.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("thread_ts="))
        .map(str::to_string)
}

pub fn transform_match(m: SlackMatch) -> MessageItem {
    let thread_ts = m
        .thread_ts
        .or_else(|| m.permalink.as_deref().and_then(thread_ts_from_permalink));
    let (channel_id, channel_name) = match m.channel {
        Some(channel) => (Some(channel.id), channel.name),
        None => (None, None),
    };

    MessageItem {
        ts: m.ts,
        text: decode_text(&m.text),
        user: m.user,
        username: m.username,
        channel_id,
        channel_name,
        permalink: m.permalink,
        thread_ts,
    }
}

pub fn transform_search_page(response: SearchMessagesResponse, page: u32) -> Page<MessageItem> {
    let messages = response.messages;
    let last_page = messages
        .paging
        .as_ref()
        .map_or(true, |paging| paging.page >= paging.pages);
    let done = last_page || messages.matches.is_empty();

    Page::new(
        messages.matches.into_iter().map(transform_match).collect(),
        PageState::Offset(page + 1),
        done,
    )
    .with_total_count(messages.total)
}

/// Distinct thread roots in first-seen order
pub fn thread_roots(messages: &[MessageItem]) -> Vec<ThreadRoot> {
    let mut roots: Vec<ThreadRoot> = Vec::new();
    for message in messages {
        let (Some(channel_id), Some(thread_ts)) = (&message.channel_id, &message.thread_ts) else {
            continue;
        };
        let root = ThreadRoot {
            channel_id: channel_id.clone(),
            thread_ts: thread_ts.clone(),
        };
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

pub fn transform_thread(root: ThreadRoot, response: RepliesResponse) -> Thread {
    Thread {
        channel_id: root.channel_id,
        thread_ts: root.thread_ts,
        messages: response
            .messages
            .into_iter()
            .map(|reply| ThreadMessage {
                ts: reply.ts,
                user: reply.user,
                text: decode_text(&reply.text),
            })
            .collect(),
    }
}

pub fn transform_user(response: UserInfoResponse) -> UserProfile {
    let user = response.user;
    UserProfile {
        id: user.id,
        name: user.name,
        real_name: user.real_name,
        display_name: user
            .profile
            .and_then(|p| p.display_name)
            .filter(|d| !d.is_empty()),
    }
}
