//! Observer place-name resolution.
//!
//! Geocoding is cosmetic: [`GeocodeResolver::resolve`] never fails. Upstream
//! errors degrade to [`PlaceName::default`] and are logged, and successful
//! names are memoized per rounded coordinate for the process lifetime.

mod nominatim;

pub use nominatim::{NominatimGeocoder, DEFAULT_GEOCODE_URL, GEOCODE_ZOOM};

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::coord::{Coordinate, CoordinateKey, DEFAULT_KEY_PRECISION};
use crate::provider::{BoxFuture, SourceError};

/// Name shown until (or instead of) a resolved place name.
pub const DEFAULT_PLACE_NAME: &str = "Your Location";

/// Human-readable name for the observer's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceName {
    pub text: String,
}

impl PlaceName {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// True if this is the placeholder rather than a resolved name.
    pub fn is_default(&self) -> bool {
        self.text == DEFAULT_PLACE_NAME
    }
}

impl Default for PlaceName {
    fn default() -> Self {
        Self::new(DEFAULT_PLACE_NAME)
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Upstream reverse-geocoding capability.
pub trait ReverseGeocoder: Send + Sync {
    /// Look up the place name for a coordinate.
    fn lookup(&self, coordinate: Coordinate) -> BoxFuture<'_, Result<PlaceName, SourceError>>;
}

/// Memoizing, failure-absorbing place-name resolver.
pub struct GeocodeResolver {
    geocoder: Arc<dyn ReverseGeocoder>,
    cache: DashMap<CoordinateKey, PlaceName>,
    precision: u32,
}

impl GeocodeResolver {
    /// Create a resolver keyed at the default precision.
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self::with_precision(geocoder, DEFAULT_KEY_PRECISION)
    }

    /// Create a resolver that memoizes at `precision` decimal places.
    pub fn with_precision(geocoder: Arc<dyn ReverseGeocoder>, precision: u32) -> Self {
        Self {
            geocoder,
            cache: DashMap::new(),
            precision,
        }
    }

    /// Resolve a coordinate to a place name, falling back to the default.
    pub async fn resolve(&self, coordinate: Coordinate) -> PlaceName {
        self.try_resolve(coordinate).await.unwrap_or_default()
    }

    /// Resolve a coordinate, reporting the upstream failure.
    ///
    /// Failures are not cached so a later call can still succeed.
    pub async fn try_resolve(&self, coordinate: Coordinate) -> Result<PlaceName, SourceError> {
        let key = coordinate.key(self.precision);
        if let Some(cached) = self.cache.get(&key) {
            debug!(%coordinate, place = %cached.value(), "Place name cache hit");
            return Ok(cached.value().clone());
        }

        match self.geocoder.lookup(coordinate).await {
            Ok(place) => {
                debug!(%coordinate, place = %place, "Place name resolved");
                self.cache.insert(key, place.clone());
                Ok(place)
            }
            Err(e) => {
                warn!(%coordinate, error = %e, "Reverse geocoding failed, using default name");
                Err(e)
            }
        }
    }

    /// Number of memoized coordinates.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
