//! Open Notify style `iss-pass` prediction endpoint.

use std::sync::Arc;

use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use super::{PassPredictor, PassWindow};
use crate::coord::Coordinate;
use crate::provider::{AsyncHttpClient, BoxFuture, SourceError};

/// Default pass-prediction endpoint.
pub const DEFAULT_PASS_URL: &str = "https://iss-pass.herokuapp.com/json/";

#[derive(Debug, Deserialize)]
struct PassEntry {
    risetime: i64,
    duration: i64,
}

#[derive(Debug, Deserialize)]
struct PassResponse {
    response: Option<Vec<PassEntry>>,
}

/// Pass predictor backed by the `iss-pass` JSON API.
pub struct IssPassPredictor {
    http: Arc<dyn AsyncHttpClient>,
    base_url: String,
}

impl IssPassPredictor {
    pub fn new(http: Arc<dyn AsyncHttpClient>) -> Self {
        Self::with_endpoint(http, DEFAULT_PASS_URL)
    }

    pub fn with_endpoint(http: Arc<dyn AsyncHttpClient>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    /// Build the request URL for an observer.
    pub fn url_for(&self, observer: Coordinate) -> String {
        format!(
            "{}?lat={}&lon={}",
            self.base_url,
            observer.lat(),
            observer.lng()
        )
    }

    /// Decode a response body, taking the first (soonest) pass.
    pub fn parse(body: &[u8]) -> Result<PassWindow, SourceError> {
        let response: PassResponse = serde_json::from_slice(body)?;
        let entries = response
            .response
            .ok_or_else(|| SourceError::Parse("missing response array".to_string()))?;

        let first = entries.first().ok_or(SourceError::NoUpcomingPass)?;

        let rise_time = DateTime::from_timestamp(first.risetime, 0)
            .ok_or_else(|| SourceError::Parse(format!("risetime out of range: {}", first.risetime)))?;
        let duration_seconds = u32::try_from(first.duration)
            .map_err(|_| SourceError::Parse(format!("invalid duration: {}", first.duration)))?;

        Ok(PassWindow::new(rise_time, duration_seconds))
    }
}

impl PassPredictor for IssPassPredictor {
    fn next_pass(&self, observer: Coordinate) -> BoxFuture<'_, Result<PassWindow, SourceError>> {
        Box::pin(async move {
            let url = self.url_for(observer);
            let body = self.http.get(&url).await?;
            let pass = Self::parse(&body)?;
            debug!(%observer, rise = %pass.rise_time, duration = pass.duration_seconds, "Next pass predicted");
            Ok(pass)
        })
    }
}
