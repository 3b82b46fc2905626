//! Viewer configuration.
//!
//! # Responsibility
//! - Describe data sources, map defaults, marker options and keywords.
//! - Load configuration from TOML with per-section defaults.
//!
//! # Invariants
//! - A validated config always has a non-empty locations source and a
//!   finite non-negative grouping tolerance.

use crate::source::TextSource;
use crate::timeline::grouping::{check_tolerance, DEFAULT_TOLERANCE};
use crate::timeline::keywords::LifecycleKeywords;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const MAX_ZOOM: u8 = 20;
pub const DEFAULT_PHOTO: &str = "images/default.jpg";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Data sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub locations: TextSource,
    #[serde(default)]
    pub photos: Option<TextSource>,
    #[serde(default)]
    pub groups: Option<TextSource>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            locations: TextSource::File(PathBuf::from("data/famille.csv")),
            photos: None,
            groups: None,
        }
    }
}

/// Initial map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 46.8,
            center_lon: 2.5,
            zoom: 6,
        }
    }
}

/// Marker placement and photo options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkersConfig {
    /// Coordinate tolerance in degrees for co-location grouping.
    pub tolerance: f64,
    /// Photo used when a person has no photo or the photo is missing.
    pub default_photo: String,
    /// Base directory for relative photo references; `None` skips probing.
    pub photo_base_dir: Option<PathBuf>,
    /// Spread radius for grouped markers.
    pub spread_radius_px: f64,
    /// Re-fit the map view to the markers after every render pass.
    pub fit_bounds: bool,
}

impl Default for MarkersConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            default_photo: DEFAULT_PHOTO.to_string(),
            photo_base_dir: None,
            spread_radius_px: 30.0,
            fit_bounds: false,
        }
    }
}

/// Logging settings; `dir = None` disables file logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Complete viewer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub sources: SourcesConfig,
    pub map: MapConfig,
    pub markers: MarkersConfig,
    pub keywords: LifecycleKeywords,
    pub logging: LoggingConfig,
}

impl ViewerConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(
            "event=config_load module=config status=ok path={}",
            path.display()
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.sources.locations.to_string().trim().is_empty() {
            return Err(ConfigError::Invalid(
                "sources.locations must not be empty".to_string(),
            ));
        }
        check_tolerance(self.markers.tolerance)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        if self.map.zoom > MAX_ZOOM {
            return Err(ConfigError::Invalid(format!(
                "map.zoom must be <= {MAX_ZOOM}, got {}",
                self.map.zoom
            )));
        }
        if !(-90.0..=90.0).contains(&self.map.center_lat)
            || !(-180.0..=180.0).contains(&self.map.center_lon)
        {
            return Err(ConfigError::Invalid(format!(
                "map center ({}, {}) is out of range",
                self.map.center_lat, self.map.center_lon
            )));
        }
        if !self.markers.spread_radius_px.is_finite() || self.markers.spread_radius_px < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "markers.spread_radius_px must be non-negative, got {}",
                self.markers.spread_radius_px
            )));
        }
        if self.markers.default_photo.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "markers.default_photo must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ViewerConfig, DEFAULT_PHOTO};
    use crate::source::TextSource;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [sources]
            locations = "https://docs.example.org/pub?output=csv"
            "#,
        )
        .unwrap();
        assert!(matches!(config.sources.locations, TextSource::Url(_)));
        assert_eq!(config.sources.photos, None);
        assert_eq!(config.map.zoom, 6);
        assert_eq!(config.markers.tolerance, 0.0005);
        assert_eq!(config.markers.default_photo, DEFAULT_PHOTO);
        assert!(config.keywords.stop.contains(&"stop".to_string()));
    }

    #[test]
    fn keyword_lists_override_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [sources]
            locations = "data/famille.csv"

            [keywords]
            stop = ["fin de suivi"]
            "#,
        )
        .unwrap();
        assert_eq!(config.keywords.stop, vec!["fin de suivi".to_string()]);
        assert!(!config.keywords.deceased.is_empty());
    }

    #[test]
    fn negative_tolerance_is_invalid() {
        let err = ViewerConfig::from_toml_str(
            r#"
            [sources]
            locations = "data/famille.csv"

            [markers]
            tolerance = -1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn excessive_zoom_is_invalid() {
        let err = ViewerConfig::from_toml_str(
            r#"
            [sources]
            locations = "data/famille.csv"

            [map]
            zoom = 25
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("map.zoom"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = ViewerConfig::from_toml_str("[sources").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
