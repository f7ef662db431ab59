//! In-memory geospatial index for moving points, built on a uniform grid.
//!
//! ## Features
//! - **Grid indexing**: points are hashed into square cells of a configurable size in meters
//! - **Moving points**: re-adding an identity moves it; the old placement is removed first
//! - **Range queries**: exact rectangle filtering over the covering cells
//! - **Nearest neighbours**: expanding-ring search with a caller predicate and distance cap
//! - **Lazy TTL**: points expire as a side effect of later access, never via a timer
//!
//! ## TTL Behavior
//! TTL is **passive/lazy**:
//! - Expired points return `None` on `get()` and are skipped in queries
//! - A bucket only notices expiry when it is touched; `expire_all()` sweeps every cell
//! - Re-adding a point restarts its clock
//!
//! ```rust
//! use geogrid::{LabeledPoint, PointIndex};
//! use std::time::Duration;
//!
//! let mut index = PointIndex::with_expiration(500.0, Duration::from_secs(300));
//! index.add(LabeledPoint::new("bus-12", 51.508359, -0.124803));
//! index.add(LabeledPoint::new("bus-40", 51.507312, -0.122367));
//!
//! let nearby = index.k_nearest(&LabeledPoint::at(51.5083, -0.1248), 5, 1000.0, |_| true);
//! assert_eq!(nearby.len(), 2);
//! ```

pub mod builder;
pub mod cell;
pub mod clock;
pub mod config;
pub mod distance;
pub mod error;
pub mod grid;
pub mod index;
pub mod ttl;

#[cfg(feature = "sync")]
pub mod sync;

pub use builder::IndexBuilder;
pub use cell::{Cell, LAT_DEGREE_LENGTH, LON_DEGREE_LENGTH, cell_of};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::IndexConfig;
pub use distance::{EARTH_RADIUS_METERS, LonDegreeCache, distance_between, haversine};
pub use error::{GeoGridError, Result};
pub use grid::{BucketFactory, Grid, Probe};
pub use index::PointIndex;
pub use ttl::{ExpiryListener, TtlStore};

#[cfg(feature = "sync")]
pub use sync::SyncPointIndex;

pub use geo::Rect;
pub use geogrid_types::point::{LabeledPoint, Locatable};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoGridError, IndexBuilder, IndexConfig, PointIndex, Result};

    #[cfg(feature = "sync")]
    pub use crate::SyncPointIndex;

    pub use crate::{LabeledPoint, Locatable};
    pub use geo::Rect;

    pub use crate::{Clock, ManualClock, SystemClock};

    pub use std::time::Duration;
}
