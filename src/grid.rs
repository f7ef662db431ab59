//! Sparse uniform grid mapping cells to caller-defined buckets.
//!
//! The grid knows nothing about what a bucket holds. Buckets are created on
//! first write through the factory and are never removed, so memory grows
//! with the number of distinct cells ever touched.

use crate::cell::Cell;
use geogrid_types::Locatable;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Produces a fresh, empty bucket for a newly touched cell.
pub type BucketFactory<B> = Arc<dyn Fn() -> B + Send + Sync>;

/// Result of a read-only bucket lookup.
///
/// A `Detached` bucket was built by the factory for a missing cell and is not
/// stored; anything written to it is dropped with the probe.
pub enum Probe<'a, B> {
    Stored(&'a mut B),
    Detached(B),
}

impl<B> Probe<'_, B> {
    pub fn is_stored(&self) -> bool {
        matches!(self, Probe::Stored(_))
    }
}

impl<B> Deref for Probe<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        match self {
            Probe::Stored(bucket) => bucket,
            Probe::Detached(bucket) => bucket,
        }
    }
}

impl<B> DerefMut for Probe<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        match self {
            Probe::Stored(bucket) => bucket,
            Probe::Detached(bucket) => bucket,
        }
    }
}

/// Inclusive rectangle of cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRect {
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
}

impl CellRect {
    fn spanning(a: Cell, b: Cell) -> Self {
        Self {
            min_x: a.x().min(b.x()),
            max_x: a.x().max(b.x()),
            min_y: a.y().min(b.y()),
            max_y: a.y().max(b.y()),
        }
    }

    fn including(self, cell: Cell) -> Self {
        Self {
            min_x: self.min_x.min(cell.x()),
            max_x: self.max_x.max(cell.x()),
            min_y: self.min_y.min(cell.y()),
            max_y: self.max_y.max(cell.y()),
        }
    }

    /// Chebyshev distance from `cell` to the farthest cell of the rectangle.
    fn reach_from(&self, cell: Cell) -> u64 {
        cell.x()
            .abs_diff(self.min_x)
            .max(cell.x().abs_diff(self.max_x))
            .max(cell.y().abs_diff(self.min_y))
            .max(cell.y().abs_diff(self.max_y))
    }

    fn contains(&self, cell: &Cell) -> bool {
        (self.min_x..=self.max_x).contains(&cell.x()) && (self.min_y..=self.max_y).contains(&cell.y())
    }

    /// Number of cells covered, saturating.
    fn area(&self) -> u128 {
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return 0;
        }
        let w = (self.max_x as i128 - self.min_x as i128 + 1) as u128;
        let h = (self.max_y as i128 - self.min_y as i128 + 1) as u128;
        w.saturating_mul(h)
    }

    fn cells(self) -> impl Iterator<Item = Cell> {
        (self.min_x..=self.max_x)
            .flat_map(move |x| (self.min_y..=self.max_y).map(move |y| Cell::new(x, y)))
    }
}

/// Spatial hash from [`Cell`] to bucket `B`.
///
/// # Examples
///
/// ```
/// use geogrid::{Grid, LabeledPoint};
///
/// let mut grid: Grid<Vec<String>> = Grid::new(500.0, Vec::new);
/// let waterloo = LabeledPoint::new("Waterloo", 51.502973, -0.114723);
///
/// grid.add_entry_at(&waterloo).push("Waterloo".to_string());
/// assert_eq!(grid.get_entry_at(&waterloo).len(), 1);
/// assert_eq!(grid.cell_count(), 1);
/// ```
#[derive(Clone)]
pub struct Grid<B> {
    resolution: f64,
    cells: FxHashMap<Cell, B>,
    extent: Option<CellRect>,
    factory: BucketFactory<B>,
}

impl<B> Grid<B> {
    /// Create an empty grid with `resolution` meters per cell edge.
    pub fn new<F>(resolution: f64, factory: F) -> Self
    where
        F: Fn() -> B + Send + Sync + 'static,
    {
        Self::with_factory(resolution, Arc::new(factory))
    }

    /// Create an empty grid sharing an existing factory.
    pub fn with_factory(resolution: f64, factory: BucketFactory<B>) -> Self {
        if !resolution.is_finite() || resolution <= 0.0 {
            log::warn!(
                "Grid resolution {} is not a positive finite number; cells will be meaningless",
                resolution
            );
        }

        Self {
            resolution,
            cells: FxHashMap::default(),
            extent: None,
            factory,
        }
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Cell of `point` at this grid's resolution.
    pub fn cell_of<P: Locatable + ?Sized>(&self, point: &P) -> Cell {
        Cell::of(point, self.resolution)
    }

    /// Number of cells that have ever been written to.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn contains_cell(&self, cell: &Cell) -> bool {
        self.cells.contains_key(cell)
    }

    /// Chebyshev distance in cells from `cell` to the farthest corner of the
    /// box bounding every stored cell, or `None` while the grid is empty.
    ///
    /// No stored cell lies beyond this many rings around `cell`.
    pub fn reach_from(&self, cell: Cell) -> Option<u64> {
        self.extent.map(|extent| extent.reach_from(cell))
    }

    /// Replace the factory used for cells created from now on.
    pub fn set_factory(&mut self, factory: BucketFactory<B>) {
        self.factory = factory;
    }

    /// Bucket for the cell of `point`, created through the factory if absent.
    pub fn add_entry_at<P: Locatable + ?Sized>(&mut self, point: &P) -> &mut B {
        let cell = self.cell_of(point);
        match self.cells.entry(cell) {
            Entry::Occupied(stored) => stored.into_mut(),
            Entry::Vacant(slot) => {
                log::trace!("Creating bucket for cell {}", cell);
                self.extent = Some(match self.extent {
                    Some(extent) => extent.including(cell),
                    None => CellRect::spanning(cell, cell),
                });
                slot.insert((self.factory)())
            }
        }
    }

    /// Bucket for the cell of `point` without storing anything.
    ///
    /// A missing cell yields a detached fresh bucket; the grid is left untouched.
    pub fn get_entry_at<P: Locatable + ?Sized>(&mut self, point: &P) -> Probe<'_, B> {
        let cell = self.cell_of(point);
        match self.cells.get_mut(&cell) {
            Some(bucket) => Probe::Stored(bucket),
            None => Probe::Detached((self.factory)()),
        }
    }

    /// Stored bucket for the cell of `point`, if any.
    pub fn entry_at<P: Locatable + ?Sized>(&self, point: &P) -> Option<&B> {
        self.cells.get(&self.cell_of(point))
    }

    /// Present buckets in the cell rectangle spanned by two corner points.
    pub fn range<A, C>(&self, top_left: &A, bottom_right: &C) -> Vec<&B>
    where
        A: Locatable + ?Sized,
        C: Locatable + ?Sized,
    {
        let rect = CellRect::spanning(self.cell_of(top_left), self.cell_of(bottom_right));
        self.collect_in(rect)
    }

    /// Present buckets with `min_x <= x <= max_x` and `min_y <= y <= max_y`.
    pub fn get(&self, min_x: i64, max_x: i64, min_y: i64, max_y: i64) -> Vec<&B> {
        self.collect_in(CellRect {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Visit every present bucket in the rectangle spanned by two corner points.
    pub fn range_mut<A, C, F>(&mut self, top_left: &A, bottom_right: &C, visit: F)
    where
        A: Locatable + ?Sized,
        C: Locatable + ?Sized,
        F: FnMut(&mut B),
    {
        let rect = CellRect::spanning(self.cell_of(top_left), self.cell_of(bottom_right));
        self.visit_in(rect, visit);
    }

    /// Visit every present bucket with `min_x <= x <= max_x` and `min_y <= y <= max_y`.
    pub fn get_mut<F>(&mut self, min_x: i64, max_x: i64, min_y: i64, max_y: i64, visit: F)
    where
        F: FnMut(&mut B),
    {
        self.visit_in(
            CellRect {
                min_x,
                max_x,
                min_y,
                max_y,
            },
            visit,
        );
    }

    /// Every stored bucket, in no particular order.
    pub fn buckets_mut(&mut self) -> impl Iterator<Item = &mut B> {
        self.cells.values_mut()
    }

    /// Whether scanning the stored cells is cheaper than walking the rectangle.
    fn prefers_scan(&self, rect: &CellRect) -> bool {
        rect.area() > self.cells.len() as u128
    }

    fn collect_in(&self, rect: CellRect) -> Vec<&B> {
        if self.prefers_scan(&rect) {
            return self
                .cells
                .iter()
                .filter(|(cell, _)| rect.contains(cell))
                .map(|(_, bucket)| bucket)
                .collect();
        }

        rect.cells().filter_map(|cell| self.cells.get(&cell)).collect()
    }

    fn visit_in<F>(&mut self, rect: CellRect, mut visit: F)
    where
        F: FnMut(&mut B),
    {
        if self.prefers_scan(&rect) {
            self.cells
                .iter_mut()
                .filter(|(cell, _)| rect.contains(cell))
                .for_each(|(_, bucket)| visit(bucket));
            return;
        }

        for cell in rect.cells() {
            if let Some(bucket) = self.cells.get_mut(&cell) {
                visit(bucket);
            }
        }
    }
}

impl<B> fmt::Debug for Grid<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("resolution", &self.resolution)
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}
