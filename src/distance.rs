//! Great-circle and approximate planar distances in meters.

use crate::cell::LAT_DEGREE_LENGTH;
use geogrid_types::Locatable;
use rustc_hash::FxHashMap;

/// Earth radius in meters for haversine distance calculations
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two latitude/longitude pairs.
///
/// # Returns
///
/// Distance in meters.
#[inline]
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Haversine distance between two points, in meters.
#[inline]
pub fn distance_between<A, B>(a: &A, b: &B) -> f64
where
    A: Locatable + ?Sized,
    B: Locatable + ?Sized,
{
    haversine(a.lat(), a.lon(), b.lat(), b.lon())
}

/// Memoized length of one degree of longitude, per 0.1 degree of latitude.
///
/// Owned by each index so instances never share mutable state.
#[derive(Debug, Clone, Default)]
pub struct LonDegreeCache {
    lengths: FxHashMap<i64, f64>,
}

impl LonDegreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meters spanned by one degree of longitude at `lat`.
    pub fn length_at(&mut self, lat: f64) -> f64 {
        let bucket = (lat * 10.0) as i64;
        *self.lengths.entry(bucket).or_insert_with(|| {
            let bucket_lat = bucket as f64 / 10.0;
            haversine(bucket_lat, 0.0, bucket_lat, 1.0)
        })
    }

    /// Cheap squared distance used to order kNN candidates.
    pub fn approximate_square_distance<A, B>(&mut self, a: &A, b: &B) -> f64
    where
        A: Locatable + ?Sized,
        B: Locatable + ?Sized,
    {
        let avg_lat = (a.lat() + b.lat()) / 2.0;
        let lat_len = (a.lat() - b.lat()).abs() * LAT_DEGREE_LENGTH;
        let lon_len = (a.lon() - b.lon()).abs() * self.length_at(avg_lat);

        lat_len * lat_len + lon_len * lon_len
    }

    /// Number of latitude buckets computed so far.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogrid_types::LabeledPoint;

    #[test]
    fn test_haversine_known_distance() {
        let charing = LabeledPoint::new("Charing Cross", 51.508359, -0.124803);
        let embankment = LabeledPoint::new("Embankment", 51.507312, -0.122367);
        let d = distance_between(&charing, &embankment);
        assert!((d - 204.9).abs() < 0.5, "got {d}");
    }

    #[test]
    fn test_haversine_zero() {
        assert_eq!(haversine(10.0, 20.0, 10.0, 20.0), 0.0);
    }

    #[test]
    fn test_equator_degree_length() {
        let mut cache = LonDegreeCache::new();
        let expected = EARTH_RADIUS_METERS * 1f64.to_radians();
        assert!((cache.length_at(0.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_cache_buckets_by_tenth_degree() {
        let mut cache = LonDegreeCache::new();
        let a = cache.length_at(51.51);
        let b = cache.length_at(51.58);
        let c = cache.length_at(51.61);

        assert_eq!(a, b);
        assert!(c < a);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_caches_are_independent() {
        let mut first = LonDegreeCache::new();
        first.length_at(45.0);
        let second = LonDegreeCache::new();
        assert!(second.is_empty());
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_approximate_distance_orders_like_haversine() {
        let mut cache = LonDegreeCache::new();
        let charing = LabeledPoint::new("Charing Cross", 51.508359, -0.124803);
        let embankment = LabeledPoint::new("Embankment", 51.507312, -0.122367);
        let leicester = LabeledPoint::new("Leicester Square", 51.511291, -0.128242);

        let near = cache.approximate_square_distance(&embankment, &charing);
        let far = cache.approximate_square_distance(&leicester, &charing);
        assert!(near < far);
        assert!((near.sqrt() - distance_between(&embankment, &charing)).abs() < 5.0);
    }
}
