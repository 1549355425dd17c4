//! wheretheiss.at satellite position provider.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{PositionSample, PositionSource};
use crate::coord::Coordinate;
use crate::provider::{AsyncHttpClient, BoxFuture, SourceError};

/// Default position endpoint (without the satellite id).
pub const DEFAULT_POSITION_URL: &str = "https://api.wheretheiss.at/v1/satellites";

/// NORAD catalog number of the International Space Station.
pub const ISS_NORAD_ID: u32 = 25544;

/// The provider sends coordinates either as JSON numbers or numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    fn to_f64(&self, field: &str) -> Result<f64, SourceError> {
        match self {
            NumericField::Number(n) => Ok(*n),
            NumericField::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                SourceError::Parse(format!("{} is not numeric: {:?}", field, s))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SatellitePayload {
    latitude: Option<NumericField>,
    longitude: Option<NumericField>,
    /// Anything that is not a usable unix time falls back to receive time.
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
}

fn unix_seconds(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Polls the wheretheiss.at REST API for a satellite's position.
pub struct WhereTheIssSource {
    http: Arc<dyn AsyncHttpClient>,
    url: String,
}

impl WhereTheIssSource {
    /// Create a source for the ISS using the default endpoint.
    pub fn new(http: Arc<dyn AsyncHttpClient>) -> Self {
        Self::with_endpoint(http, DEFAULT_POSITION_URL, ISS_NORAD_ID)
    }

    /// Create a source for any satellite at a custom base URL.
    pub fn with_endpoint(http: Arc<dyn AsyncHttpClient>, base_url: &str, satellite_id: u32) -> Self {
        Self {
            http,
            url: format!("{}/{}", base_url.trim_end_matches('/'), satellite_id),
        }
    }

    /// The URL polled on every tick.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Decode a provider payload into a sample.
    ///
    /// `received_at` is used when the payload carries no timestamp.
    pub fn parse(body: &[u8], received_at: DateTime<Utc>) -> Result<PositionSample, SourceError> {
        let payload: SatellitePayload = serde_json::from_slice(body)?;

        let (lat, lng) = match (&payload.latitude, &payload.longitude) {
            (Some(lat), Some(lng)) => (lat.to_f64("latitude")?, lng.to_f64("longitude")?),
            _ => {
                return Err(SourceError::Parse(
                    "payload lacks latitude/longitude".to_string(),
                ))
            }
        };

        let coordinate =
            Coordinate::new(lat, lng).map_err(|e| SourceError::Parse(e.to_string()))?;

        let observed_at = payload
            .timestamp
            .as_ref()
            .and_then(unix_seconds)
            .filter(|ts| ts.is_finite())
            .and_then(|ts| DateTime::from_timestamp(ts as i64, 0))
            .unwrap_or(received_at);

        Ok(PositionSample::at(coordinate, observed_at))
    }
}

impl PositionSource for WhereTheIssSource {
    fn poll(&self) -> BoxFuture<'_, Result<PositionSample, SourceError>> {
        Box::pin(async move {
            let body = self.http.get(&self.url).await?;
            let sample = Self::parse(&body, Utc::now())?;
            debug!(
                lat = sample.coordinate.lat(),
                lng = sample.coordinate.lng(),
                "Position polled"
            );
            Ok(sample)
        })
    }
}
