//! Imperative shell for searchhub
//!
//! Provider adapters that drive the pure request builders and transforms in
//! `searchhub_core` through an injected [`transport::Transport`]. Each adapter
//! is constructed with its transport explicitly; share one
//! `Arc<ReqwestTransport>` between adapters to reuse its connection pool.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use searchhub::github::GithubAdapter;
//! use searchhub::transport::{ReqwestTransport, DEFAULT_TIMEOUT};
//!
//! let transport = Arc::new(ReqwestTransport::new(DEFAULT_TIMEOUT)?);
//! let github = GithubAdapter::new(transport);
//! let aggregate = github.search_issues(&params).await?;
//! ```

pub mod docbase;
pub mod github;
pub mod paging;
pub mod qiita;
pub mod retry;
pub mod slack;
pub mod transport;
pub mod zenn;
