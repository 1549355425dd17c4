//! Upstream provider plumbing.
//!
//! This module provides the HTTP client abstraction every source is built on
//! and the shared [`SourceError`] taxonomy.
//!
//! ```ignore
//! use isstrack::provider::{AsyncHttpClient, ReqwestClient};
//!
//! let http = ReqwestClient::with_timeout(10)?;
//! let body = http.get("https://api.wheretheiss.at/v1/satellites/25544").await?;
//! ```

use std::future::Future;
use std::pin::Pin;

mod error;
mod http;

pub use error::SourceError;
pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};

#[cfg(test)]
pub use http::tests::MockHttpClient;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
