//! Core library for searchhub
//!
//! This crate implements the **Functional Core** of searchhub, following the
//! Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! searchhub uses a two-crate architecture:
//!
//! - **`searchhub_core`** (this crate): request builders, response transforms,
//!   error mapping, the retry policy and the pagination driver. No I/O.
//! - **`searchhub`**: the HTTP transport, the retry executor, the provider
//!   adapters and the CLI (the Imperative Shell).
//!
//! Request builders return an [`http::HttpRequest`] value instead of sending
//! anything, and every provider's mapper turns an [`http::HttpResponse`] into
//! a canonical [`error::SearchError`]. The shell wires these together with a
//! transport; tests here work on fixture values alone.
//!
//! # Module Organization
//!
//! - [`error`]: the canonical error taxonomy shared by all providers
//! - [`http`]: transport-neutral request and response values
//! - [`pagination`]: page state and the [`pagination::paginate`] driver
//! - [`retry`]: retry policy and backoff schedule
//! - [`query`]: escaping search-string builder
//! - [`github`], [`qiita`], [`zenn`], [`slack`], [`docbase`]: one module per
//!   provider
//!
//! Each provider module contains:
//!
//! - **Search parameters**: keyword plus the provider's filters
//! - **Domain models**: API payloads and the items returned to callers
//! - **Pure functions**: query and request builders, the status mapper and
//!   page transforms
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use searchhub_core::github::issues::{build_issue_query, IssueFilters};
//!
//! let filters = IssueFilters {
//!     repositories: vec!["rust-lang/rust".to_string()],
//!     ..Default::default()
//! };
//!
//! assert_eq!(
//!     build_issue_query("borrow checker", &filters),
//!     r#""borrow checker" repo:rust-lang/rust"#
//! );
//! ```

pub mod docbase;
pub mod error;
pub mod github;
pub mod http;
pub mod pagination;
pub mod qiita;
pub mod query;
pub mod retry;
pub mod slack;
pub mod zenn;

pub use error::{ErrorKind, Provider, Result, SearchError};
pub use pagination::{paginate, Aggregate, Page, PageState, PaginationLimits, ProviderMeta};
pub use retry::{RetryPolicy, RetryScope};
