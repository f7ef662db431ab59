//! # geogrid-types
//!
//! Point types for the geogrid spatial index.
//!
//! - **`Locatable`**: the capability the index needs from a point (identity, latitude, longitude)
//! - **`LabeledPoint`**: a ready-made implementation, serializable with Serde
//!
//! ## Examples
//!
//! ```rust
//! use geogrid_types::point::{LabeledPoint, Locatable};
//!
//! let waterloo = LabeledPoint::new("Waterloo", 51.502973, -0.114723);
//! assert_eq!(waterloo.id(), "Waterloo");
//!
//! let point: geo::Point = waterloo.into();
//! assert_eq!(point.y(), 51.502973);
//! ```

pub mod point;

pub use point::{LabeledPoint, Locatable};
