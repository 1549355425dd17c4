//! INI configuration file.
//!
//! The configuration lives at `~/.isstrack/config.ini` by default. A missing
//! file yields [`ConfigFile::default`]; keys absent from a present file keep
//! their defaults.
//!
//! ```ini
//! [endpoints]
//! position_url = https://api.wheretheiss.at/v1/satellites
//! satellite_id = 25544
//! geocode_url = https://nominatim.openstreetmap.org/reverse
//! pass_url = https://iss-pass.herokuapp.com/json/
//!
//! [tracking]
//! poll_interval_ms = 5000
//! request_timeout_secs = 10
//! persistent_failure_threshold = 3
//!
//! [observer]
//! latitude = 40.7128
//! longitude = -74.0060
//!
//! [camera]
//! fly_duration_ms = 2000
//! zoom = 3
//!
//! [logging]
//! level = info
//! file = /tmp/isstrack.log
//! ```

mod error;

pub use error::ConfigError;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use crate::coord::Coordinate;
use crate::geocode::DEFAULT_GEOCODE_URL;
use crate::pass::DEFAULT_PASS_URL;
use crate::position::{DEFAULT_POSITION_URL, ISS_NORAD_ID};
use crate::provider::DEFAULT_TIMEOUT_SECS;
use crate::snapshot::DEFAULT_PERSISTENT_FAILURE_THRESHOLD;

/// Default position poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// Default camera fly-to duration in milliseconds.
pub const DEFAULT_FLY_DURATION_MS: u64 = 2000;

/// Default map zoom for camera moves.
pub const DEFAULT_CAMERA_ZOOM: u8 = 3;

/// Default observer: New York City, used when no location is configured.
pub const DEFAULT_OBSERVER: (f64, f64) = (40.7128, -74.0060);

/// Upstream endpoint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    pub position_url: String,
    pub satellite_id: u32,
    pub geocode_url: String,
    pub pass_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            position_url: DEFAULT_POSITION_URL.to_string(),
            satellite_id: ISS_NORAD_ID,
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            pass_url: DEFAULT_PASS_URL.to_string(),
        }
    }
}

/// Poll cadence and failure handling.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    pub poll_interval: Duration,
    pub request_timeout_secs: u64,
    pub persistent_failure_threshold: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            persistent_failure_threshold: DEFAULT_PERSISTENT_FAILURE_THRESHOLD,
        }
    }
}

/// Observer location.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_OBSERVER.0,
            longitude: DEFAULT_OBSERVER.1,
        }
    }
}

impl ObserverConfig {
    /// The observer as a validated coordinate.
    pub fn coordinate(&self) -> Result<Coordinate, ConfigError> {
        Coordinate::new(self.latitude, self.longitude).map_err(ConfigError::InvalidObserver)
    }
}

/// Camera instruction settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub fly_duration: Duration,
    pub zoom: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fly_duration: Duration::from_millis(DEFAULT_FLY_DURATION_MS),
            zoom: DEFAULT_CAMERA_ZOOM,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Optional log file; stderr only when absent.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// The complete configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub endpoints: EndpointConfig,
    pub tracking: TrackingConfig,
    pub observer: ObserverConfig,
    pub camera: CameraConfig,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Default configuration path (`~/.isstrack/config.ini`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".isstrack").join("config.ini"))
    }

    /// Load from the default path, falling back to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Load {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("endpoints")) {
            let endpoints = &mut config.endpoints;
            if let Some(v) = section.get("position_url") {
                endpoints.position_url = v.to_string();
            }
            if let Some(v) = parse_key(section, "endpoints", "satellite_id")? {
                endpoints.satellite_id = v;
            }
            if let Some(v) = section.get("geocode_url") {
                endpoints.geocode_url = v.to_string();
            }
            if let Some(v) = section.get("pass_url") {
                endpoints.pass_url = v.to_string();
            }
        }

        if let Some(section) = ini.section(Some("tracking")) {
            let tracking = &mut config.tracking;
            if let Some(ms) = parse_key::<u64>(section, "tracking", "poll_interval_ms")? {
                if ms == 0 {
                    return Err(ConfigError::InvalidValue {
                        section: "tracking".to_string(),
                        key: "poll_interval_ms".to_string(),
                        value: ms.to_string(),
                    });
                }
                tracking.poll_interval = Duration::from_millis(ms);
            }
            if let Some(v) = parse_key(section, "tracking", "request_timeout_secs")? {
                tracking.request_timeout_secs = v;
            }
            if let Some(v) = parse_key(section, "tracking", "persistent_failure_threshold")? {
                tracking.persistent_failure_threshold = v;
            }
        }

        if let Some(section) = ini.section(Some("observer")) {
            if let Some(v) = parse_key(section, "observer", "latitude")? {
                config.observer.latitude = v;
            }
            if let Some(v) = parse_key(section, "observer", "longitude")? {
                config.observer.longitude = v;
            }
            config.observer.coordinate()?;
        }

        if let Some(section) = ini.section(Some("camera")) {
            if let Some(ms) = parse_key::<u64>(section, "camera", "fly_duration_ms")? {
                config.camera.fly_duration = Duration::from_millis(ms);
            }
            if let Some(v) = parse_key(section, "camera", "zoom")? {
                config.camera.zoom = v;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(v) = section.get("level") {
                config.logging.level = v.to_string();
            }
            if let Some(v) = section.get("file").filter(|v| !v.trim().is_empty()) {
                config.logging.file = Some(PathBuf::from(v));
            }
        }

        Ok(config)
    }

    /// Render as INI.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("endpoints"))
            .set("position_url", self.endpoints.position_url.as_str())
            .set("satellite_id", self.endpoints.satellite_id.to_string())
            .set("geocode_url", self.endpoints.geocode_url.as_str())
            .set("pass_url", self.endpoints.pass_url.as_str());
        ini.with_section(Some("tracking"))
            .set(
                "poll_interval_ms",
                self.tracking.poll_interval.as_millis().to_string(),
            )
            .set(
                "request_timeout_secs",
                self.tracking.request_timeout_secs.to_string(),
            )
            .set(
                "persistent_failure_threshold",
                self.tracking.persistent_failure_threshold.to_string(),
            );
        ini.with_section(Some("observer"))
            .set("latitude", self.observer.latitude.to_string())
            .set("longitude", self.observer.longitude.to_string());
        ini.with_section(Some("camera"))
            .set(
                "fly_duration_ms",
                self.camera.fly_duration.as_millis().to_string(),
            )
            .set("zoom", self.camera.zoom.to_string());
        let mut logging = ini.with_section(Some("logging"));
        logging.set("level", self.logging.level.as_str());
        if let Some(file) = &self.logging.file {
            logging.set("file", file.to_string_lossy().to_string());
        }
        ini
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        Ok(())
    }
}

fn parse_key<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                section: section_name.to_string(),
                key: key.to_string(),
                value: raw.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.tracking.poll_interval, Duration::from_secs(5));
        assert_eq!(config.tracking.persistent_failure_threshold, 3);
        assert_eq!(config.camera.fly_duration, Duration::from_secs(2));
        assert_eq!(config.camera.zoom, 3);
        assert_eq!(config.endpoints.satellite_id, 25544);
        let observer = config.observer.coordinate().unwrap();
        assert_eq!(observer.lat(), 40.7128);
        assert_eq!(observer.lng(), -74.0060);
    }

    #[test]
    fn test_parse_overrides() {
        let config = ConfigFile::parse(
            "[tracking]\npoll_interval_ms = 1000\n\n[observer]\nlatitude = 51.5\nlongitude = -0.12\n\n[logging]\nlevel = debug\n",
        )
        .unwrap();

        assert_eq!(config.tracking.poll_interval, Duration::from_secs(1));
        assert_eq!(config.tracking.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.observer.latitude, 51.5);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_invalid_number() {
        let result = ConfigFile::parse("[tracking]\npoll_interval_ms = soon\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = ConfigFile::parse("[tracking]\npoll_interval_ms = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_invalid_observer() {
        let result = ConfigFile::parse("[observer]\nlatitude = 123\n");
        assert!(matches!(result, Err(ConfigError::InvalidObserver(_))));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::load(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.camera.zoom = 5;
        config.logging.file = Some(PathBuf::from("/tmp/isstrack.log"));
        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
