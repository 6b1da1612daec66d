//! GPS Sorter - Sort photos into folders by where they were taken
//!
//! This library provides:
//! - GPS extraction from EXIF metadata
//! - Matching against named locations (bounding boxes or points with a radius)
//! - Proximity clustering when no locations are configured
//! - Place-name lookup via reverse geocoding, with an on-disk cache
//! - Folder-name normalization (single ASCII words or sanitized readable names)
//! - Copy/move into the output tree without overwriting existing files

pub mod cli;
pub mod config;
pub mod error;
pub mod exif;
pub mod file_ops;
pub mod geo;
pub mod geocode;
pub mod naming;
pub mod sorter;

pub use cli::Cli;
pub use config::{
    ConfigError, FileOperation, LocationDef, SortOptions, SorterConfig, UncategorizedBehavior,
};
pub use error::{Error, Result};
pub use geo::{BoundingBox, Coordinate};
pub use geocode::{NameSource, PlaceNameResolver, ResolvedName};
pub use sorter::{RunSummary, Sorter};
