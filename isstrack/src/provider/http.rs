//! HTTP client abstraction for testability

use std::time::Duration;

use super::{BoxFuture, SourceError};

/// Default timeout for upstream requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Trait for asynchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes, or `UpstreamUnavailable` on network
    /// failure, timeout, or a non-2xx status.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, SourceError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, SourceError> {
        // Nominatim rejects requests without an identifying user agent.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("isstrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                SourceError::UpstreamUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, SourceError>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await.map_err(|e| {
                SourceError::UpstreamUnavailable(format!("Request failed: {}", e))
            })?;

            // Check HTTP status
            if !response.status().is_success() {
                return Err(SourceError::UpstreamUnavailable(format!(
                    "HTTP {} from {}",
                    response.status(),
                    url
                )));
            }

            response.bytes().await.map(|b| b.to_vec()).map_err(|e| {
                SourceError::UpstreamUnavailable(format!("Failed to read response: {}", e))
            })
        })
    }
}
