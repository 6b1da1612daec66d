//! Matching coordinates against configured named locations

use super::{Coordinate, distance_km, in_bounds};
use crate::config::{LocationDef, SorterConfig};

/// Find the configured location a coordinate belongs to
///
/// Bounding boxes are checked first, in declaration order, and the first box
/// containing the point wins regardless of any point location being closer.
/// Otherwise the nearest point location whose radius covers the coordinate
/// is chosen; on equal distances the earliest declaration is kept.
///
/// Returns `None` when nothing matches.
pub fn match_location(point: Coordinate, config: &SorterConfig) -> Option<&str> {
    if let Some(name) = config.locations.iter().find_map(|loc| match loc {
        LocationDef::Bounds { name, bounds } if in_bounds(point, bounds) => Some(name.as_str()),
        _ => None,
    }) {
        return Some(name);
    }

    let mut best: Option<(&str, f64)> = None;
    for loc in &config.locations {
        let LocationDef::Point {
            name,
            center,
            radius_km,
        } = loc
        else {
            continue;
        };

        let distance = distance_km(point, *center);
        if distance > *radius_km {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((name.as_str(), distance)),
        }
    }

    best.map(|(name, _)| name)
}
