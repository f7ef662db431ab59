//! Thread-safe wrapper for concurrent index access.
//!
//! `PointIndex` is single-threaded: even queries mutate it, because TTL
//! buckets expire on read. `SyncPointIndex` puts the whole index behind one
//! `parking_lot::Mutex`, so every operation holds exclusive access for its
//! duration. Shard across several handles for parallelism.
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! geogrid = { version = "0.1", features = ["sync"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use geogrid::{LabeledPoint, SyncPointIndex};
//! use std::thread;
//!
//! let index = SyncPointIndex::new(500.0);
//! let writer = index.clone();
//!
//! thread::spawn(move || {
//!     writer.add(LabeledPoint::new("bus-7", 51.5081, -0.1248));
//! })
//! .join()
//! .unwrap();
//!
//! assert!(index.get("bus-7").is_some());
//! ```

use crate::clock::Clock;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::PointIndex;
use geogrid_types::Locatable;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;

/// Cloneable, thread-safe handle to a shared [`PointIndex`].
pub struct SyncPointIndex<P> {
    inner: Arc<Mutex<PointIndex<P>>>,
}

impl<P> Clone for SyncPointIndex<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P> SyncPointIndex<P>
where
    P: Locatable + Clone + Send + 'static,
{
    /// Wraps an existing index.
    pub fn from_index(index: PointIndex<P>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(index)),
        }
    }

    /// Creates an index whose points never expire.
    pub fn new(resolution: f64) -> Self {
        Self::from_index(PointIndex::new(resolution))
    }

    /// Creates an index whose points expire `ttl` after their last update.
    pub fn with_expiration(resolution: f64, ttl: Duration) -> Self {
        Self::from_index(PointIndex::with_expiration(resolution, ttl))
    }

    /// Creates an expiring index reading time from `clock`.
    pub fn with_expiration_and_clock(resolution: f64, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::from_index(PointIndex::with_expiration_and_clock(resolution, ttl, clock))
    }

    /// Creates an index from a validated configuration.
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        Ok(Self::from_index(PointIndex::from_config(config)?))
    }

    /// Inserts or moves a point.
    pub fn add(&self, point: P) {
        self.inner.lock().add(point);
    }

    /// Removes a point by identity.
    pub fn remove(&self, id: &str) -> Option<P> {
        self.inner.lock().remove(id)
    }

    /// Retrieves the current point for an identity.
    pub fn get(&self, id: &str) -> Option<P> {
        self.inner.lock().get(id)
    }

    /// Snapshot of all tracked points.
    pub fn all(&self) -> FxHashMap<String, P> {
        self.inner.lock().all()
    }

    /// Number of tracked identities.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Points inside the rectangle spanned by two corners.
    pub fn range<A, B>(&self, top_left: &A, bottom_right: &B) -> Vec<P>
    where
        A: Locatable + ?Sized,
        B: Locatable + ?Sized,
    {
        self.inner.lock().range(top_left, bottom_right)
    }

    /// Finds up to `k` accepted points within `max_distance` meters.
    pub fn k_nearest<Q, F>(&self, point: &Q, k: usize, max_distance: f64, accept: F) -> Vec<P>
    where
        Q: Locatable + ?Sized,
        F: FnMut(&P) -> bool,
    {
        self.inner.lock().k_nearest(point, k, max_distance, accept)
    }

    /// Applies pending TTL evictions across every cell.
    pub fn expire_all(&self) -> usize {
        self.inner.lock().expire_all()
    }

    /// Runs `f` with exclusive access, for compound operations.
    pub fn with<R>(&self, f: impl FnOnce(&mut PointIndex<P>) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    /// Independent deep copy of the current index state.
    pub fn snapshot(&self) -> PointIndex<P> {
        self.inner.lock().clone()
    }
}
