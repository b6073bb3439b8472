//! HTTP transport and the single-request JSON fetch helpers
//!
//! Adapters never touch `reqwest` directly. They build an [`HttpRequest`]
//! with the pure functions in `searchhub_core`, hand it to a [`Transport`]
//! and classify the outcome:
//!
//! - transport failure (DNS, connection reset, timeout) becomes `network`
//! - a non-success status is passed to the provider's status mapper
//! - a success body that does not decode becomes `unknown`

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;

use searchhub_core::http::{HttpRequest, HttpResponse, Method, RequestBody};
use searchhub_core::{Provider, SearchError};

pub const USER_AGENT: &str = concat!("searchhub/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a request never reached a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// DNS, connect, reset or timeout
    Network,
    /// The request could not be built from its parts (bad header, bad URL)
    InvalidRequest,
}

/// A request never reached a response
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Network,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::InvalidRequest,
            message: message.into(),
        }
    }
}

/// Sends one request and returns the raw response
///
/// Implementations must not interpret the status code; any response that
/// arrived is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

/// Production transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportFailure> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportFailure::invalid_request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportFailure> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportFailure::invalid_request(format!("Invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| {
                    TransportFailure::invalid_request(format!("Invalid header value for {name}: {e}"))
                })?;
            map.append(name, value);
        }
        Ok(map)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let headers = Self::header_map(&request.headers)?;

        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        }
        .headers(headers);

        let builder = match &request.body {
            RequestBody::None => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Form(pairs) => builder.form(pairs),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| {
                let message = format!("Request to {} failed: {e}", request.url);
                if e.is_builder() {
                    TransportFailure::invalid_request(message)
                } else {
                    TransportFailure::new(message)
                }
            })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| TransportFailure::new(format!("Failed to read response body: {e}")))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Send one request and return the response if its status is a success
pub async fn fetch(
    transport: &dyn Transport,
    request: HttpRequest,
    provider: Provider,
    map_status: fn(&HttpResponse) -> SearchError,
) -> Result<HttpResponse, SearchError> {
    debug!("{provider} {} {}", request.method.as_str(), request.url);

    let response = transport.send(request).await.map_err(|failure| {
        let err = match failure.kind {
            FailureKind::Network => SearchError::network(failure.message),
            FailureKind::InvalidRequest => SearchError::validation(failure.message),
        };
        err.with_provider(provider)
    })?;

    if !response.is_success() {
        debug!("{provider} responded with status {}", response.status);
        return Err(map_status(&response));
    }

    Ok(response)
}

/// Decode a success body, classifying a shape mismatch as `unknown`
pub fn decode<T: DeserializeOwned>(
    response: &HttpResponse,
    provider: Provider,
) -> Result<T, SearchError> {
    serde_json::from_str(&response.body).map_err(|e| {
        let err = SearchError::malformed(&format!("{provider} response"), &e).with_provider(provider);
        let parse_error = err.cause.clone().unwrap_or_default();
        err.with_cause(serde_json::json!({
            "error": parse_error,
            "body": response.body_json(),
        }))
    })
}

/// One round-trip decoded into `T`
pub async fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    request: HttpRequest,
    provider: Provider,
    map_status: fn(&HttpResponse) -> SearchError,
) -> Result<T, SearchError> {
    let response = fetch(transport, request, provider, map_status).await?;
    decode(&response, provider)
}
