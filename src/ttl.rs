//! Key-value store with passive time-to-live expiry.
//!
//! Entries are never evicted by a timer. Every public operation first drains
//! the insertion queue of entries older than the TTL, and only then does its
//! own work. A key that was re-inserted after an old queue entry was enqueued
//! survives that entry: eviction is decided by the key's latest insertion.
//!
//! Refreshing a hot key leaves its older queue entries behind; they are
//! discarded one at a time as they reach the head of the queue.

use crate::clock::{Clock, SystemClock};
use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Observer called once for each key evicted by expiry, with its live value.
pub type ExpiryListener<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

#[derive(Debug, Clone)]
struct Stamped<K> {
    key: K,
    inserted_at: Instant,
}

#[inline]
fn has_expired(inserted_at: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(inserted_at) > ttl
}

/// A map whose entries disappear once older than the configured TTL.
///
/// # Examples
///
/// ```
/// use geogrid::{ManualClock, TtlStore};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = Arc::new(ManualClock::new());
/// let mut store = TtlStore::with_clock(Duration::from_secs(10), clock.clone());
///
/// store.put("bus-42", (51.5, -0.12));
/// clock.advance(Duration::from_secs(5));
/// assert!(store.get("bus-42").is_some());
///
/// clock.advance(Duration::from_secs(6));
/// assert!(store.get("bus-42").is_none());
/// ```
#[derive(Clone)]
pub struct TtlStore<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    insertion_order: VecDeque<Stamped<K>>,
    last_inserted: FxHashMap<K, Instant>,
    data: FxHashMap<K, V>,
    on_expire: Option<ExpiryListener<K, V>>,
}

impl<K, V> TtlStore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Create a store measuring age with the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a store reading time from `clock`.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            insertion_order: VecDeque::new(),
            last_inserted: FxHashMap::default(),
            data: FxHashMap::default(),
            on_expire: None,
        }
    }

    /// Builder-style variant of [`TtlStore::set_on_expire`].
    pub fn with_on_expire(mut self, listener: ExpiryListener<K, V>) -> Self {
        self.on_expire = Some(listener);
        self
    }

    /// Install (or replace) the eviction observer.
    pub fn set_on_expire(&mut self, listener: ExpiryListener<K, V>) {
        self.on_expire = Some(listener);
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or overwrite `key`, restarting its clock.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.expire();

        let inserted_at = self.clock.now();
        self.last_inserted.insert(key.clone(), inserted_at);
        self.insertion_order.push_back(Stamped {
            key: key.clone(),
            inserted_at,
        });
        self.data.insert(key, value)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.expire();
        self.last_inserted.remove(key);
        self.data.remove(key)
    }

    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.expire();
        self.data.get(key)
    }

    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.expire();
        self.data.contains_key(key)
    }

    pub fn len(&mut self) -> usize {
        self.expire();
        self.data.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Live values, after applying pending expiry.
    pub fn values(&mut self) -> impl Iterator<Item = &V> {
        self.expire();
        self.data.values()
    }

    /// Live entries, after applying pending expiry.
    pub fn iter(&mut self) -> impl Iterator<Item = (&K, &V)> {
        self.expire();
        self.data.iter()
    }

    /// Queue entries not yet drained, including stale ones for refreshed keys.
    pub fn queued(&self) -> usize {
        self.insertion_order.len()
    }

    /// Apply pending expiry now and report how many keys were evicted.
    pub fn purge(&mut self) -> usize {
        let before = self.data.len();
        self.expire();
        before - self.data.len()
    }

    fn expire(&mut self) {
        let now = self.clock.now();

        while let Some(head) = self.insertion_order.front() {
            if !has_expired(head.inserted_at, now, self.ttl) {
                break;
            }
            let Some(stamped) = self.insertion_order.pop_front() else {
                break;
            };

            // Keys removed explicitly have no timestamp and are skipped; keys
            // refreshed after this entry was queued are still fresh.
            let latest_expired = self
                .last_inserted
                .get(&stamped.key)
                .is_some_and(|latest| has_expired(*latest, now, self.ttl));
            if !latest_expired {
                continue;
            }

            self.last_inserted.remove(&stamped.key);
            if let Some(value) = self.data.remove(&stamped.key)
                && let Some(listener) = &self.on_expire
            {
                listener(&stamped.key, &value);
            }
        }
    }
}

impl<K, V> fmt::Debug for TtlStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlStore")
            .field("ttl", &self.ttl)
            .field("live", &self.data.len())
            .field("queued", &self.insertion_order.len())
            .field("on_expire", &self.on_expire.is_some())
            .finish_non_exhaustive()
    }
}
