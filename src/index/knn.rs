//! Expanding-ring k-nearest-neighbour search.
//!
//! Candidates are gathered from the query's own cell, then from square rings
//! of cells at growing Chebyshev distance. Expansion stops once the rings have
//! contributed more than `k` candidates, the ring radius passes twice the
//! search distance (capped at the Earth's circumference) or no stored cell
//! lies farther out. Candidates are ordered by an approximate planar distance
//! and cut at `k` or at the first one whose haversine distance exceeds the
//! limit.
//!
//! The search is not exhaustive: a predicate rejecting most nearby points can
//! hide true neighbours beyond the coarse radius.

use super::PointIndex;
use crate::cell::Cell;
use crate::distance::{EARTH_RADIUS_METERS, distance_between};
use geogrid_types::Locatable;
use std::f64::consts::PI;

/// Largest useful ring radius in meters: twice the farthest possible
/// distance between two points on the sphere.
const MAX_COARSE_DISTANCE: f64 = 2.0 * PI * EARTH_RADIUS_METERS;

/// Inclusive cell strips `(min_x, max_x, min_y, max_y)` forming the square
/// ring at Chebyshev distance `d` from `center`. The horizontal strips carry
/// the corners. Strips past the ends of the `i64` coordinate range are
/// dropped and spans are clamped to it.
fn ring_strips(center: Cell, d: i64) -> impl Iterator<Item = (i64, i64, i64, i64)> {
    let (x, y) = (center.x(), center.y());
    let (west, east) = (x.saturating_sub(d), x.saturating_add(d));
    let (south, north) = (y.saturating_sub(d - 1), y.saturating_add(d - 1));
    [
        y.checked_add(d).map(|row| (west, east, row, row)),
        y.checked_sub(d).map(|row| (west, east, row, row)),
        x.checked_sub(d).map(|column| (column, column, south, north)),
        x.checked_add(d).map(|column| (column, column, south, north)),
    ]
    .into_iter()
    .flatten()
}

impl<P> PointIndex<P>
where
    P: Locatable + Clone + 'static,
{
    /// Up to `k` accepted points within `max_distance` meters of `point`,
    /// nearest first.
    ///
    /// # Examples
    ///
    /// ```
    /// use geogrid::{LabeledPoint, Locatable, PointIndex};
    ///
    /// let mut index = PointIndex::new(500.0);
    /// index.add(LabeledPoint::new("Embankment", 51.507312, -0.122367));
    /// index.add(LabeledPoint::new("Leicester Square", 51.511291, -0.128242));
    /// index.add(LabeledPoint::new("Westminster", 51.501402, -0.125002));
    ///
    /// let charing_cross = LabeledPoint::at(51.508359, -0.124803);
    /// let found = index.k_nearest(&charing_cross, 2, 1000.0, |p| p.id() != "Embankment");
    /// let names: Vec<_> = found.iter().map(|p| p.id()).collect();
    /// assert_eq!(names, ["Leicester Square", "Westminster"]);
    /// ```
    pub fn k_nearest<Q, F>(&mut self, point: &Q, k: usize, max_distance: f64, mut accept: F) -> Vec<P>
    where
        Q: Locatable + ?Sized,
        F: FnMut(&P) -> bool,
    {
        let resolution = self.grid.resolution();
        if resolution.is_nan() || resolution <= 0.0 {
            log::warn!(
                "Rejecting nearest-neighbour query on a grid with resolution {}",
                resolution
            );
            return Vec::new();
        }

        let center = self.grid.cell_of(point);
        let mut nearby = Vec::new();
        self.grid
            .get_entry_at(point)
            .collect_into(&mut nearby, &mut accept);

        let coarse_max_distance = (max_distance * 2.0)
            .max(resolution * 2.0 + 0.01)
            .min(MAX_COARSE_DISTANCE);
        // Rings past the stored extent are empty.
        let reach = self.grid.reach_from(center).unwrap_or(0);
        let mut ring_total = 0;
        let mut d: i64 = 1;

        while d.unsigned_abs() <= reach && d as f64 * resolution <= coarse_max_distance {
            let before = nearby.len();
            for (min_x, max_x, min_y, max_y) in ring_strips(center, d) {
                self.grid.get_mut(min_x, max_x, min_y, max_y, |bucket| {
                    bucket.collect_into(&mut nearby, &mut accept);
                });
            }
            ring_total += nearby.len() - before;

            // Checked per completed ring, never mid-ring.
            if ring_total > k {
                break;
            }
            d += 1;
        }
        self.apply_evictions();

        let lengths = &mut self.lon_degree_lengths;
        let mut ranked: Vec<(f64, P)> = nearby
            .into_iter()
            .map(|p| (lengths.approximate_square_distance(&p, point), p))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        ranked
            .into_iter()
            .map(|(_, p)| p)
            .take(k)
            .take_while(|p| distance_between(point, p) <= max_distance)
            .collect()
    }
}
