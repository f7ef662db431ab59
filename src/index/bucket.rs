//! Per-cell point storage for [`PointIndex`](super::PointIndex).

use crate::clock::Clock;
use crate::grid::BucketFactory;
use crate::ttl::{ExpiryListener, TtlStore};
use geogrid_types::Locatable;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;

/// Identities evicted by TTL buckets and not yet removed from the index's
/// lookup table.
#[derive(Debug, Clone, Default)]
pub(crate) struct EvictionLog {
    evicted: Arc<Mutex<Vec<String>>>,
}

impl EvictionLog {
    /// A new log pre-filled with this log's pending identities.
    pub(crate) fn fork(&self) -> Self {
        Self {
            evicted: Arc::new(Mutex::new(self.evicted.lock().clone())),
        }
    }

    pub(crate) fn listener<P: 'static>(&self) -> ExpiryListener<String, P> {
        let evicted = self.evicted.clone();
        Arc::new(move |id: &String, _point: &P| evicted.lock().push(id.clone()))
    }

    pub(crate) fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.evicted.lock())
    }
}

/// TTL settings shared by every bucket of an expiring index.
#[derive(Debug, Clone)]
pub(crate) struct Expiry {
    pub(crate) ttl: Duration,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) log: EvictionLog,
}

impl Expiry {
    pub(crate) fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            log: EvictionLog::default(),
        }
    }

    /// Same settings with a separate eviction log, for an index copy.
    pub(crate) fn fork(&self) -> Self {
        Self {
            ttl: self.ttl,
            clock: self.clock.clone(),
            log: self.log.fork(),
        }
    }

    pub(crate) fn bucket_factory<P: 'static>(&self) -> BucketFactory<PointBucket<P>> {
        let ttl = self.ttl;
        let clock = self.clock.clone();
        let log = self.log.clone();
        Arc::new(move || {
            PointBucket::Expiring(
                TtlStore::with_clock(ttl, clock.clone()).with_on_expire(log.listener()),
            )
        })
    }
}

/// Identity-to-point map stored in each grid cell.
#[derive(Debug, Clone)]
pub(crate) enum PointBucket<P> {
    Plain(FxHashMap<String, P>),
    Expiring(TtlStore<String, P>),
}

impl<P> PointBucket<P> {
    pub(crate) fn plain_factory() -> BucketFactory<Self>
    where
        P: 'static,
    {
        Arc::new(|| PointBucket::Plain(FxHashMap::default()))
    }

    pub(crate) fn insert(&mut self, id: String, point: P) {
        match self {
            PointBucket::Plain(points) => {
                points.insert(id, point);
            }
            PointBucket::Expiring(points) => {
                points.put(id, point);
            }
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<P> {
        match self {
            PointBucket::Plain(points) => points.remove(id),
            PointBucket::Expiring(points) => points.remove(id),
        }
    }

    pub(crate) fn get(&mut self, id: &str) -> Option<&P> {
        match self {
            PointBucket::Plain(points) => points.get(id),
            PointBucket::Expiring(points) => points.get(id),
        }
    }

    pub(crate) fn len(&mut self) -> usize {
        match self {
            PointBucket::Plain(points) => points.len(),
            PointBucket::Expiring(points) => points.len(),
        }
    }

    /// Apply pending expiry, returning how many points were evicted.
    pub(crate) fn purge(&mut self) -> usize {
        match self {
            PointBucket::Plain(_) => 0,
            PointBucket::Expiring(points) => points.purge(),
        }
    }

    /// Point the bucket's expiry notifications at `log`.
    pub(crate) fn rewire(&mut self, log: &EvictionLog)
    where
        P: 'static,
    {
        if let PointBucket::Expiring(points) = self {
            points.set_on_expire(log.listener());
        }
    }

    /// Append clones of accepted points to `out`, returning how many were added.
    pub(crate) fn collect_into<F>(&mut self, out: &mut Vec<P>, accept: &mut F) -> usize
    where
        P: Locatable + Clone,
        F: FnMut(&P) -> bool,
    {
        let before = out.len();
        match self {
            PointBucket::Plain(points) => {
                out.extend(points.values().filter(|p| accept(*p)).cloned());
            }
            PointBucket::Expiring(points) => {
                out.extend(points.values().filter(|p| accept(*p)).cloned());
            }
        }
        out.len() - before
    }
}
