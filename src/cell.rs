//! Grid cell derivation.
//!
//! A cell is the integer coordinate of the square (in meters) a point falls
//! into. The conversion uses fixed meters-per-degree constants rather than a
//! projection, so cells are only roughly square near mid-latitudes.

use geogrid_types::Locatable;
use serde::{Deserialize, Serialize};
use std::fmt;

const MIN_LAT: f64 = -90.0;
const MIN_LON: f64 = -180.0;

/// Meters per degree of latitude.
pub const LAT_DEGREE_LENGTH: f64 = 111_000.0;

/// Meters per degree of longitude used for cell derivation.
pub const LON_DEGREE_LENGTH: f64 = 85_000.0;

/// Discrete grid coordinate. `x` follows latitude, `y` follows longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    x: i64,
    y: i64,
}

impl Cell {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Cell containing `point` for a grid of `resolution` meters per cell edge.
    ///
    /// The offsets are truncated toward zero, so two points a hair apart on
    /// either side of a boundary land in different cells.
    ///
    /// # Examples
    ///
    /// ```
    /// use geogrid::{Cell, LabeledPoint};
    ///
    /// let charing_cross = LabeledPoint::new("Charing Cross", 51.508359, -0.124803);
    /// assert_eq!(Cell::of(&charing_cross, 500.0), Cell::new(31414, 30578));
    /// ```
    pub fn of<P: Locatable + ?Sized>(point: &P, resolution: f64) -> Self {
        let x = ((point.lat() - MIN_LAT) * LAT_DEGREE_LENGTH / resolution) as i64;
        let y = ((point.lon() - MIN_LON) * LON_DEGREE_LENGTH / resolution) as i64;
        Self { x, y }
    }

    pub fn x(&self) -> i64 {
        self.x
    }

    pub fn y(&self) -> i64 {
        self.y
    }
}

/// Shorthand for [`Cell::of`].
#[inline]
pub fn cell_of<P: Locatable + ?Sized>(point: &P, resolution: f64) -> Cell {
    Cell::of(point, resolution)
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}
