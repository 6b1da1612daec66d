//! Geographic primitives
//!
//! This module provides the geometry used by location matching and
//! proximity clustering:
//! - Great-circle distance via the haversine formula
//! - Inclusive bounding-box containment
//! - Decimal rounding of coordinates for cache keys and folder names

pub mod cluster;
pub mod matcher;

use std::fmt;

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in [-90, 90]
    pub latitude: f64,
    /// Longitude in [-180, 180]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and inside the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Rectangular area, inclusive on every edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Great-circle distance between two positions in kilometers
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// True if the point lies inside the box (edges included)
pub fn in_bounds(point: Coordinate, bounds: &BoundingBox) -> bool {
    (bounds.min_lat..=bounds.max_lat).contains(&point.latitude)
        && (bounds.min_lon..=bounds.max_lon).contains(&point.longitude)
}

/// Round a value to `precision` decimal places (half away from zero)
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Render a rounded value as text, always keeping a fractional part
///
/// `25.0` renders as `"25.0"` rather than `"25"`, so keys written by
/// earlier runs stay stable across precisions.
pub fn format_rounded(value: f64, precision: u32) -> String {
    let text = round_to(value, precision).to_string();
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{}.0", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAIPEI_101: Coordinate = Coordinate {
        latitude: 25.0339,
        longitude: 121.5645,
    };

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(distance_km(TAIPEI_101, TAIPEI_101), 0.0);
        let origin = Coordinate::new(0.0, 0.0);
        assert_eq!(distance_km(origin, origin), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let jiufen = Coordinate::new(25.110, 121.845);
        let ab = distance_km(TAIPEI_101, jiufen);
        let ba = distance_km(jiufen, TAIPEI_101);
        assert!((ab - ba).abs() < 1e-9);
        assert!(ab > 25.0 && ab < 35.0, "Taipei 101 to Jiufen was {}", ab);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_distance_grows_with_separation() {
        let near = distance_km(TAIPEI_101, Coordinate::new(25.04, 121.5645));
        let far = distance_km(TAIPEI_101, Coordinate::new(25.10, 121.5645));
        assert!(near < far);
    }

    #[test]
    fn test_in_bounds_is_inclusive() {
        let bounds = BoundingBox {
            min_lat: 25.108,
            max_lat: 25.112,
            min_lon: 121.843,
            max_lon: 121.848,
        };
        assert!(in_bounds(Coordinate::new(25.110, 121.845), &bounds));
        assert!(in_bounds(Coordinate::new(25.108, 121.843), &bounds));
        assert!(in_bounds(Coordinate::new(25.112, 121.848), &bounds));
        assert!(!in_bounds(Coordinate::new(25.1121, 121.845), &bounds));
        assert!(!in_bounds(Coordinate::new(25.110, 121.8429), &bounds));
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(TAIPEI_101.is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_format_rounded() {
        assert_eq!(format_rounded(25.0339, 3), "25.034");
        assert_eq!(format_rounded(25.03, 1), "25.0");
        assert_eq!(format_rounded(121.56, 0), "122.0");
        assert_eq!(format_rounded(0.0, 3), "0.0");
        assert_eq!(format_rounded(-33.8688, 2), "-33.87");
    }
}
