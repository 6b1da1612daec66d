//! Proximity clustering by coordinate rounding
//!
//! Photos whose coordinates round to the same cell share a folder in auto
//! mode. The cell size follows the requested radius only roughly: two points
//! within the radius can still fall on opposite sides of a rounding boundary
//! and land in neighbouring cells.

use super::{Coordinate, round_to};

/// Radius used when the caller passes a non-positive value
pub const DEFAULT_CLUSTER_RADIUS_KM: f64 = 10.0;

/// Decimal places to keep for a given clustering radius
///
/// | radius (km) | decimals | cell size |
/// |-------------|----------|-----------|
/// | >= 50       | 0        | ~111 km   |
/// | >= 10       | 1        | ~11 km    |
/// | >= 2        | 2        | ~1.1 km   |
/// | < 2         | 3        | ~110 m    |
pub fn cluster_precision(radius_km: f64) -> u32 {
    let radius_km = if radius_km <= 0.0 {
        DEFAULT_CLUSTER_RADIUS_KM
    } else {
        radius_km
    };

    if radius_km >= 50.0 {
        0
    } else if radius_km >= 10.0 {
        1
    } else if radius_km >= 2.0 {
        2
    } else {
        3
    }
}

/// Grouping key for auto mode: a coordinate snapped to a decimal grid
///
/// Stored as integer grid units so the key can be hashed and compared exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterKey {
    lat_units: i64,
    lon_units: i64,
    precision: u32,
}

impl ClusterKey {
    fn scale(&self) -> f64 {
        10f64.powi(self.precision as i32)
    }

    /// Latitude of the cell center
    pub fn latitude(&self) -> f64 {
        self.lat_units as f64 / self.scale()
    }

    /// Longitude of the cell center
    pub fn longitude(&self) -> f64 {
        self.lon_units as f64 / self.scale()
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude(), self.longitude())
    }
}

/// Compute the cluster key of a coordinate for the given radius
pub fn cluster_key(coord: Coordinate, radius_km: f64) -> ClusterKey {
    let precision = cluster_precision(radius_km);
    let scale = 10f64.powi(precision as i32);
    ClusterKey {
        lat_units: (round_to(coord.latitude, precision) * scale).round() as i64,
        lon_units: (round_to(coord.longitude, precision) * scale).round() as i64,
        precision,
    }
}
