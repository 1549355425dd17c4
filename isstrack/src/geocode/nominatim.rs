//! OpenStreetMap Nominatim reverse geocoder.

use std::sync::Arc;

use serde::Deserialize;

use super::{PlaceName, ReverseGeocoder};
use crate::coord::Coordinate;
use crate::provider::{AsyncHttpClient, BoxFuture, SourceError};

/// Default reverse-geocoding endpoint.
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Nominatim zoom level; 10 resolves to city granularity.
pub const GEOCODE_ZOOM: u8 = 10;

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

/// Reverse geocoder backed by Nominatim.
pub struct NominatimGeocoder {
    http: Arc<dyn AsyncHttpClient>,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(http: Arc<dyn AsyncHttpClient>) -> Self {
        Self::with_endpoint(http, DEFAULT_GEOCODE_URL)
    }

    pub fn with_endpoint(http: Arc<dyn AsyncHttpClient>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    /// Build the request URL for a coordinate.
    pub fn url_for(&self, coordinate: Coordinate) -> String {
        format!(
            "{}?format=json&lat={}&lon={}&zoom={}&addressdetails=1",
            self.base_url,
            coordinate.lat(),
            coordinate.lng(),
            GEOCODE_ZOOM
        )
    }

    /// Decode a response body into a place name.
    ///
    /// The name is the comma-joined non-empty city, state and country. When
    /// none are present the default name is returned.
    pub fn parse(body: &[u8]) -> Result<PlaceName, SourceError> {
        let response: ReverseResponse = serde_json::from_slice(body)?;
        let address = response.address.unwrap_or_default();

        let name = [address.city, address.state, address.country]
            .into_iter()
            .flatten()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        if name.is_empty() {
            Ok(PlaceName::default())
        } else {
            Ok(PlaceName::new(name))
        }
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    fn lookup(&self, coordinate: Coordinate) -> BoxFuture<'_, Result<PlaceName, SourceError>> {
        Box::pin(async move {
            let url = self.url_for(coordinate);
            let body = self.http.get(&url).await?;
            Self::parse(&body)
        })
    }
}
