//! Index builder for flexible configuration
//!
//! This module provides a builder pattern for creating indexes from a
//! configuration file or piecemeal settings, with an optional custom clock.

use crate::clock::{Clock, SystemClock};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::PointIndex;
use geogrid_types::Locatable;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`PointIndex`] with validated settings.
///
/// # Examples
///
/// ```
/// use geogrid::{IndexBuilder, LabeledPoint, PointIndex};
/// use std::time::Duration;
///
/// let index: PointIndex<LabeledPoint> = IndexBuilder::new()
///     .resolution(250.0)
///     .ttl(Duration::from_secs(60))
///     .build()?;
/// assert_eq!(index.ttl(), Some(Duration::from_secs(60)));
/// # Ok::<(), geogrid::GeoGridError>(())
/// ```
#[derive(Debug)]
pub struct IndexBuilder {
    config: IndexConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl IndexBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: IndexConfig::default(),
            clock: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the cell edge length in meters.
    pub fn resolution(mut self, resolution: f64) -> Self {
        self.config = self.config.with_resolution(resolution);
        self
    }

    /// Expire points `ttl` after their last update.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config = self.config.with_ttl(ttl);
        self
    }

    /// Measure point age with a custom clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and build the index.
    pub fn build<P>(self) -> Result<PointIndex<P>>
    where
        P: Locatable + Clone + 'static,
    {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        PointIndex::from_config_with_clock(&self.config, clock)
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}
