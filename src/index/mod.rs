//! Point tracking on top of the grid.
//!
//! [`PointIndex`] keeps every point in the bucket of its current cell plus a
//! direct identity-to-point table for O(1) lookups. Moving a point is a
//! remove followed by an add; buckets are never updated in place.
//!
//! With a TTL configured, buckets are [`TtlStore`](crate::TtlStore)s. Their
//! evictions are recorded in a shared log which the index drains after each
//! operation, keeping the lookup table in step with the buckets.

mod bucket;
mod knn;

use crate::clock::{Clock, SystemClock};
use crate::config::IndexConfig;
use crate::distance::LonDegreeCache;
use crate::error::{GeoGridError, Result};
use crate::grid::Grid;
use bucket::{Expiry, PointBucket};
use geo::Rect;
use geogrid_types::{LabeledPoint, Locatable};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// In-memory index of labelled points on a uniform grid.
///
/// # Examples
///
/// ```
/// use geogrid::{LabeledPoint, PointIndex};
///
/// let mut index = PointIndex::new(500.0);
/// index.add(LabeledPoint::new("Waterloo", 51.502973, -0.114723));
/// index.add(LabeledPoint::new("Oxford Circus", 51.51511, -0.1417));
/// index.add(LabeledPoint::new("Charing Cross", 51.508359, -0.124803));
///
/// let charing_cross = LabeledPoint::new("Charing Cross", 51.508359, -0.124803);
/// let nearest = index.k_nearest(&charing_cross, 2, 2000.0, |_| true);
/// let names: Vec<_> = nearest.iter().map(|p| p.to_string()).collect();
/// assert_eq!(names, ["Charing Cross", "Waterloo"]);
/// ```
pub struct PointIndex<P> {
    grid: Grid<PointBucket<P>>,
    current_position: FxHashMap<String, P>,
    lon_degree_lengths: LonDegreeCache,
    expiry: Option<Expiry>,
}

impl<P> PointIndex<P>
where
    P: Locatable + Clone + 'static,
{
    /// Create an index whose points never expire.
    pub fn new(resolution: f64) -> Self {
        Self {
            grid: Grid::with_factory(resolution, PointBucket::plain_factory()),
            current_position: FxHashMap::default(),
            lon_degree_lengths: LonDegreeCache::new(),
            expiry: None,
        }
    }

    /// Create an index whose points disappear `ttl` after their last `add`.
    pub fn with_expiration(resolution: f64, ttl: Duration) -> Self {
        Self::with_expiration_and_clock(resolution, ttl, Arc::new(SystemClock))
    }

    /// Like [`PointIndex::with_expiration`], measuring age with `clock`.
    pub fn with_expiration_and_clock(resolution: f64, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let expiry = Expiry::new(ttl, clock);
        Self {
            grid: Grid::with_factory(resolution, expiry.bucket_factory()),
            current_position: FxHashMap::default(),
            lon_degree_lengths: LonDegreeCache::new(),
            expiry: Some(expiry),
        }
    }

    /// Create an index from a validated configuration.
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    pub(crate) fn from_config_with_clock(config: &IndexConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate().map_err(GeoGridError::InvalidConfig)?;

        Ok(match config.ttl() {
            Some(ttl) => Self::with_expiration_and_clock(config.resolution, ttl, clock),
            None => Self::new(config.resolution),
        })
    }

    /// Insert `point`, replacing any earlier placement of the same identity.
    pub fn add(&mut self, point: P) {
        let id = point.id().to_string();
        self.remove(&id);

        self.grid.add_entry_at(&point).insert(id.clone(), point.clone());
        self.apply_evictions();
        self.current_position.insert(id, point);
    }

    /// Remove the point with identity `id`, returning its last known placement.
    pub fn remove(&mut self, id: &str) -> Option<P> {
        let previous = self.current_position.get(id)?.clone();

        // The cell was created by `add`, so the probe always finds it.
        self.grid.get_entry_at(&previous).remove(id);
        self.current_position.remove(id);
        self.apply_evictions();

        Some(previous)
    }

    /// Current point for `id`, or `None` if unknown or expired.
    pub fn get(&mut self, id: &str) -> Option<P> {
        let known = self.current_position.get(id)?.clone();

        // A TTL bucket may have evicted the point since the table was updated.
        let found = self.grid.get_entry_at(&known).get(id).cloned();
        self.apply_evictions();
        found
    }

    /// Snapshot of the identity-to-point table.
    ///
    /// # Expiry
    ///
    /// On an expiring index this still holds points whose buckets have not
    /// been touched since they went stale. Call [`PointIndex::expire_all`]
    /// first for a table of live points only.
    pub fn all(&self) -> FxHashMap<String, P> {
        self.current_position.clone()
    }

    pub fn contains(&mut self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of tracked identities, as of the last applied eviction.
    ///
    /// # Expiry
    ///
    /// Stale points are only counted out once their bucket is touched. Call
    /// [`PointIndex::expire_all`] first for an exact live count:
    ///
    /// ```
    /// use geogrid::{LabeledPoint, ManualClock, PointIndex};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let clock = Arc::new(ManualClock::new());
    /// let mut index = PointIndex::with_expiration_and_clock(500.0, Duration::from_secs(5), clock.clone());
    /// index.add(LabeledPoint::new("bus-12", 51.508359, -0.124803));
    /// clock.advance(Duration::from_secs(6));
    ///
    /// assert_eq!(index.len(), 1);
    /// index.expire_all();
    /// assert_eq!(index.len(), 0);
    /// ```
    pub fn len(&self) -> usize {
        self.current_position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current_position.is_empty()
    }

    /// Points inside the rectangle with `top_left` as its north-west corner and
    /// `bottom_right` as its south-east corner, bounds inclusive.
    pub fn range<A, B>(&mut self, top_left: &A, bottom_right: &B) -> Vec<P>
    where
        A: Locatable + ?Sized,
        B: Locatable + ?Sized,
    {
        let (max_lat, min_lon) = (top_left.lat(), top_left.lon());
        let (min_lat, max_lon) = (bottom_right.lat(), bottom_right.lon());
        let mut accept = |p: &P| {
            between(p.lat(), min_lat, max_lat) && between(p.lon(), min_lon, max_lon)
        };

        let mut within = Vec::new();
        self.grid.range_mut(top_left, bottom_right, |bucket| {
            bucket.collect_into(&mut within, &mut accept);
        });
        self.apply_evictions();

        within
    }

    /// Points inside a `geo` rectangle (x = longitude, y = latitude).
    pub fn range_rect(&mut self, rect: &Rect<f64>) -> Vec<P> {
        let top_left = LabeledPoint::at(rect.max().y, rect.min().x);
        let bottom_right = LabeledPoint::at(rect.min().y, rect.max().x);
        self.range(&top_left, &bottom_right)
    }

    /// Apply every pending TTL eviction now, returning how many points went.
    ///
    /// Useful before [`PointIndex::all`] or [`PointIndex::len`] when no query
    /// has touched the stale buckets.
    pub fn expire_all(&mut self) -> usize {
        if self.expiry.is_none() {
            return 0;
        }

        let evicted: usize = self.grid.buckets_mut().map(PointBucket::purge).sum();
        self.apply_evictions();
        if evicted > 0 {
            log::debug!("Expired {} points across {} cells", evicted, self.grid.cell_count());
        }
        evicted
    }

    pub fn resolution(&self) -> f64 {
        self.grid.resolution()
    }

    /// Configured time-to-live, if the index expires points.
    pub fn ttl(&self) -> Option<Duration> {
        self.expiry.as_ref().map(|expiry| expiry.ttl)
    }

    /// Cells ever touched. Never shrinks.
    pub fn cell_count(&self) -> usize {
        self.grid.cell_count()
    }

    /// Drop identities evicted by TTL buckets from the lookup table.
    fn apply_evictions(&mut self) {
        let Some(expiry) = &self.expiry else {
            return;
        };

        for id in expiry.log.drain() {
            if self.current_position.remove(&id).is_some() {
                log::debug!("Point {} expired", id);
            }
        }
    }
}

#[inline]
fn between(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

impl<P> Clone for PointIndex<P>
where
    P: Clone + 'static,
{
    /// Deep copy: buckets and their contents are duplicated, and a copy of an
    /// expiring index reports evictions to its own lookup table.
    fn clone(&self) -> Self {
        let mut grid = self.grid.clone();
        let expiry = self.expiry.as_ref().map(Expiry::fork);

        if let Some(expiry) = &expiry {
            grid.set_factory(expiry.bucket_factory());
            for bucket in grid.buckets_mut() {
                bucket.rewire(&expiry.log);
            }
        }

        Self {
            grid,
            current_position: self.current_position.clone(),
            lon_degree_lengths: self.lon_degree_lengths.clone(),
            expiry,
        }
    }
}

impl<P> fmt::Debug for PointIndex<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointIndex")
            .field("grid", &self.grid)
            .field("points", &self.current_position.len())
            .field("ttl", &self.expiry.as_ref().map(|expiry| expiry.ttl))
            .finish_non_exhaustive()
    }
}
