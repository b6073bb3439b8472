//! Canonical error taxonomy shared by every provider adapter
//!
//! Each provider translates its own failure vocabulary (HTTP status codes,
//! vendor error strings, GraphQL `errors[]` arrays) into a [`SearchError`]
//! exactly once, at mapping time. Downstream code only ever inspects
//! [`SearchError::kind`] and [`SearchError::provider`]; it never parses the
//! message text.

use serde::{Deserialize, Serialize};

/// Closed set of failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Unauthorized,
    RateLimit,
    NotFound,
    Validation,
    MissingScope,
    ProviderSpecific,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::MissingScope => "missing_scope",
            ErrorKind::ProviderSpecific => "provider_specific",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Whether a failure of this kind may succeed when attempted again
    ///
    /// Only connectivity problems and rate limiting are transient. Auth,
    /// lookup and input failures will fail identically on every attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Network | ErrorKind::RateLimit)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The platform an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Github,
    Qiita,
    Zenn,
    Slack,
    Docbase,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Github => "GitHub",
            Provider::Qiita => "Qiita",
            Provider::Zenn => "Zenn",
            Provider::Slack => "Slack",
            Provider::Docbase => "DocBase",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical error returned by every search operation
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{}{kind} error: {message}", provider_prefix(.provider))]
pub struct SearchError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    /// Raw diagnostic payload (response body, GraphQL error array, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<serde_json::Value>,
}

impl SearchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider: None,
            cause: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn missing_scope(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingScope, message)
    }

    pub fn provider_specific(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderSpecific, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Tag the error with the provider whose mapper produced it
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_cause(mut self, cause: impl Into<serde_json::Value>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Wrap a payload that could not be decoded into the expected shape
    pub fn malformed(context: &str, err: &serde_json::Error) -> Self {
        Self::unknown(format!("Failed to parse {context}: {err}"))
            .with_cause(serde_json::Value::String(err.to_string()))
    }
}

fn provider_prefix(provider: &Option<Provider>) -> String {
    provider.map(|p| format!("{p} ")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, SearchError>;
