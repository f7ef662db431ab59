//! Index configuration.
//!
//! Loadable from JSON (and TOML with the `toml` feature) so deployments can
//! tune the grid without recompiling.

use crate::error::{GeoGridError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings for a [`PointIndex`](crate::PointIndex).
///
/// # Example
///
/// ```rust
/// use geogrid::IndexConfig;
/// use std::time::Duration;
///
/// let config = IndexConfig::default();
/// assert_eq!(config.resolution, 1000.0);
/// assert!(config.ttl().is_none());
///
/// let json = r#"{ "resolution": 500, "ttl_seconds": 30 }"#;
/// let config = IndexConfig::from_json(json).unwrap();
/// assert_eq!(config.ttl(), Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Grid cell edge length in meters
    #[serde(default = "IndexConfig::default_resolution")]
    pub resolution: f64,

    /// Seconds a point stays visible after its last update (None means forever)
    #[serde(default)]
    pub ttl_seconds: Option<f64>,
}

impl IndexConfig {
    const fn default_resolution() -> f64 {
        1000.0
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_seconds = Some(ttl.as_secs_f64());
        self
    }

    /// TTL as a Duration, if set to a usable value.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds
            .filter(|ttl| *ttl > 0.0)
            .and_then(|ttl| Duration::try_from_secs_f64(ttl).ok())
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.resolution.is_finite() {
            return Err("Resolution must be finite (not NaN or infinity)".to_string());
        }
        if self.resolution <= 0.0 {
            return Err("Resolution must be positive".to_string());
        }

        if let Some(ttl) = self.ttl_seconds {
            if !ttl.is_finite() {
                return Err("TTL must be finite (not NaN or infinity)".to_string());
            }
            if ttl <= 0.0 {
                return Err("TTL must be positive".to_string());
            }
            if Duration::try_from_secs_f64(ttl).is_err() {
                return Err("TTL is too large to represent as a duration".to_string());
            }
        }

        if self.resolution < 1.0 {
            log::warn!(
                "Resolution of {} m creates very many cells; queries will visit many empty buckets",
                self.resolution
            );
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Read a configuration file, picking the format from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config = match extension.as_str() {
            "json" => Self::from_json(&contents)?,
            #[cfg(feature = "toml")]
            "toml" => Self::from_toml(&contents)?,
            other => return Err(GeoGridError::UnsupportedFormat(other.to_string())),
        };

        config.validate().map_err(GeoGridError::InvalidConfig)?;
        Ok(config)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            resolution: Self::default_resolution(),
            ttl_seconds: None,
        }
    }
}
