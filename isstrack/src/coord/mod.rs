//! Geographic coordinate value type.
//!
//! [`Coordinate`] is validated on construction so every coordinate that
//! flows through the aggregator is known to be in range.

use std::fmt;

use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LNG: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LNG: f64 = 180.0;

/// Decimal places used when memoizing lookups by coordinate (~11m).
pub const DEFAULT_KEY_PRECISION: u32 = 4;

/// Errors raised when constructing a [`Coordinate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Invalid latitude: {0} (must be within -90..=90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be within -180..=180)")]
    InvalidLongitude(f64),
}

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

/// Hashable key for a coordinate rounded to a fixed number of decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    lat_scaled: i64,
    lng_scaled: i64,
    precision: u32,
}

impl Coordinate {
    /// Creates a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordinateError::InvalidLatitude(lat));
        }
        if !lng.is_finite() || !(MIN_LNG..=MAX_LNG).contains(&lng) {
            return Err(CoordinateError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[inline]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Returns the memoization key for this coordinate at `precision` decimals.
    pub fn key(&self, precision: u32) -> CoordinateKey {
        let scale = 10f64.powi(precision as i32);
        CoordinateKey {
            lat_scaled: (self.lat * scale).round() as i64,
            lng_scaled: (self.lng * scale).round() as i64,
            precision,
        }
    }

    /// Linearly interpolates towards `target` by `fraction` (0.0..=1.0).
    ///
    /// Longitude follows the shortest path, wrapping across the antimeridian.
    pub fn lerp(&self, target: &Coordinate, fraction: f64) -> Coordinate {
        let t = fraction.clamp(0.0, 1.0);
        let lat = (self.lat + (target.lat - self.lat) * t).clamp(MIN_LAT, MAX_LAT);

        let mut delta_lng = target.lng - self.lng;
        if delta_lng > 180.0 {
            delta_lng -= 360.0;
        } else if delta_lng < -180.0 {
            delta_lng += 360.0;
        }
        let lng = normalize_lng(self.lng + delta_lng * t);

        Coordinate { lat, lng }
    }
}

/// Wraps a longitude back into -180..=180.
fn normalize_lng(lng: f64) -> f64 {
    if (MIN_LNG..=MAX_LNG).contains(&lng) {
        return lng;
    }
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == MIN_LNG && lng > 0.0 {
        MAX_LNG
    } else {
        wrapped
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_is_valid() {
        let coord = Coordinate::new(40.7128, -74.0060).unwrap();
        assert_eq!(coord.lat(), 40.7128);
        assert_eq!(coord.lng(), -74.0060);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        assert_eq!(
            Coordinate::new(90.5, 0.0),
            Err(CoordinateError::InvalidLatitude(90.5))
        );
    }

    #[test]
    fn test_invalid_longitude() {
        assert_eq!(
            Coordinate::new(0.0, -180.01),
            Err(CoordinateError::InvalidLongitude(-180.01))
        );
    }

    #[test]
    fn test_nan_rejected() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_key_rounds_nearby_points_together() {
        let a = Coordinate::new(40.71281, -74.00601).unwrap();
        let b = Coordinate::new(40.71279, -74.00599).unwrap();
        assert_eq!(a.key(4), b.key(4));
        assert_ne!(a.key(5), b.key(5));
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(10.0, 20.0).unwrap();
        let mid = a.lerp(&b, 0.5);
        assert!((mid.lat() - 5.0).abs() < 1e-9);
        assert!((mid.lng() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_lerp_crosses_antimeridian() {
        let a = Coordinate::new(0.0, 170.0).unwrap();
        let b = Coordinate::new(0.0, -170.0).unwrap();
        let mid = a.lerp(&b, 0.5);
        assert!((mid.lng().abs() - 180.0).abs() < 1e-9);

        let quarter = a.lerp(&b, 0.75);
        assert!((quarter.lng() - (-175.0)).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        let coord = Coordinate::new(51.5, -0.1278).unwrap();
        assert_eq!(coord.to_string(), "(51.5000, -0.1278)");
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_lerp_stays_in_range(
                lat_a in -90.0..=90.0_f64,
                lng_a in -180.0..=180.0_f64,
                lat_b in -90.0..=90.0_f64,
                lng_b in -180.0..=180.0_f64,
                t in 0.0..=1.0_f64
            ) {
                let a = Coordinate::new(lat_a, lng_a)?;
                let b = Coordinate::new(lat_b, lng_b)?;
                let p = a.lerp(&b, t);

                prop_assert!(Coordinate::new(p.lat(), p.lng()).is_ok(),
                    "Interpolated point {:?} out of range", p);
            }

            #[test]
            fn test_lerp_endpoints(
                lat_a in -90.0..=90.0_f64,
                lng_a in -179.0..=179.0_f64,
                lat_b in -90.0..=90.0_f64,
                lng_b in -179.0..=179.0_f64
            ) {
                let a = Coordinate::new(lat_a, lng_a)?;
                let b = Coordinate::new(lat_b, lng_b)?;

                let start = a.lerp(&b, 0.0);
                let end = a.lerp(&b, 1.0);
                prop_assert!((start.lat() - lat_a).abs() < 1e-9);
                prop_assert!((start.lng() - lng_a).abs() < 1e-9);
                prop_assert!((end.lat() - lat_b).abs() < 1e-9);
                prop_assert!((end.lng() - lng_b).abs() < 1e-9);
            }
        }
    }
}
