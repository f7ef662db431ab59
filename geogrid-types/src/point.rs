use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Anything the index can place on the grid.
///
/// Implementors expose a stable string identity and a position in degrees.
/// The index never inspects anything else, so application types (vehicles,
/// devices, sensors) can implement this directly instead of being converted.
///
/// # Examples
///
/// ```
/// use geogrid_types::point::Locatable;
///
/// struct Bus {
///     plate: String,
///     position: (f64, f64),
/// }
///
/// impl Locatable for Bus {
///     fn id(&self) -> &str {
///         &self.plate
///     }
///     fn lat(&self) -> f64 {
///         self.position.0
///     }
///     fn lon(&self) -> f64 {
///         self.position.1
///     }
/// }
/// ```
pub trait Locatable {
    /// Unique identity of the point.
    fn id(&self) -> &str;

    /// Latitude in degrees.
    fn lat(&self) -> f64;

    /// Longitude in degrees.
    fn lon(&self) -> f64;
}

impl<T: Locatable + ?Sized> Locatable for &T {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn lat(&self) -> f64 {
        (**self).lat()
    }

    fn lon(&self) -> f64 {
        (**self).lon()
    }
}

/// A point with a string label.
///
/// Equality and hashing compare the identity and the exact bit patterns of
/// both coordinates, so `Eq` and `Hash` stay consistent (`NaN == NaN`,
/// `0.0 != -0.0`).
///
/// # Examples
///
/// ```
/// use geogrid_types::point::{LabeledPoint, Locatable};
///
/// let charing_cross = LabeledPoint::new("Charing Cross", 51.508359, -0.124803);
/// assert_eq!(charing_cross.to_string(), "Charing Cross");
/// assert_eq!(charing_cross.lat(), 51.508359);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledPoint {
    id: String,
    lat: f64,
    lon: f64,
}

impl LabeledPoint {
    /// Create a new point from an identity, a latitude and a longitude.
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
        }
    }

    /// Create an anonymous point, useful as a query corner or search center.
    pub fn at(lat: f64, lon: f64) -> Self {
        Self::new(String::new(), lat, lon)
    }

    /// Copy of this point at another position, keeping the identity.
    pub fn moved_to(&self, lat: f64, lon: f64) -> Self {
        Self::new(self.id.clone(), lat, lon)
    }
}

impl Locatable for LabeledPoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

impl PartialEq for LabeledPoint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.lat.to_bits() == other.lat.to_bits()
            && self.lon.to_bits() == other.lon.to_bits()
    }
}

impl Eq for LabeledPoint {}

impl Hash for LabeledPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.lat.to_bits().hash(state);
        self.lon.to_bits().hash(state);
    }
}

impl fmt::Display for LabeledPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl From<LabeledPoint> for Point<f64> {
    fn from(point: LabeledPoint) -> Self {
        Point::new(point.lon, point.lat)
    }
}

impl From<&LabeledPoint> for Point<f64> {
    fn from(point: &LabeledPoint) -> Self {
        Point::new(point.lon, point.lat)
    }
}
