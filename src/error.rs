//! Error types for the GPS sorter

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for GPS sorter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the GPS sorter
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read EXIF data from {}: {message}", path.display())]
    ExifRead { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Geocode cache error: {0}")]
    CacheFile(String),

    #[error("Reverse geocoding failed: {0}")]
    Geocode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
