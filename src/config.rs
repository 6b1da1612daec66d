//! Configuration types for the GPS sorter
//!
//! Two layers of configuration exist:
//! - `SorterConfig`: the named locations (and what to do with unmatched
//!   photos), loaded from a JSON, TOML or YAML file. No locations means auto mode.
//! - `SortOptions`: per-run settings coming from the command line.

use crate::geo::{BoundingBox, Coordinate};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Radius used for point locations that don't declare one
pub const DEFAULT_MATCH_RADIUS_KM: f64 = 0.5;

/// Default folder for photos that match no configured location
pub const DEFAULT_UNCATEGORIZED_FOLDER: &str = "Uncategorized";

/// File name of the geocode cache inside the output directory
pub const DEFAULT_CACHE_FILE_NAME: &str = "gps_sorter_geocode_cache.json";

/// Public Nominatim reverse-geocoding endpoint
pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";

/// A named place photos can be sorted into
#[derive(Debug, Clone, PartialEq)]
pub enum LocationDef {
    /// Everything within `radius_km` of `center`
    Point {
        name: String,
        center: Coordinate,
        radius_km: f64,
    },
    /// Everything inside a latitude/longitude rectangle
    Bounds { name: String, bounds: BoundingBox },
}

impl LocationDef {
    /// Create a point location; the name must be non-empty and the radius positive
    pub fn point(
        name: impl Into<String>,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Self, ConfigError> {
        let name = validated_name(name.into())?;
        if !(radius_km.is_finite() && radius_km > 0.0) {
            return Err(ConfigError::InvalidLocation {
                name,
                reason: format!("radius_km must be positive, got {}", radius_km),
            });
        }
        Ok(LocationDef::Point {
            name,
            center,
            radius_km,
        })
    }

    /// Create a bounding-box location; min values must not exceed max values
    pub fn bounds(name: impl Into<String>, bounds: BoundingBox) -> Result<Self, ConfigError> {
        let name = validated_name(name.into())?;
        if bounds.min_lat > bounds.max_lat || bounds.min_lon > bounds.max_lon {
            return Err(ConfigError::InvalidLocation {
                name,
                reason: "bounds min values must not exceed max values".to_string(),
            });
        }
        Ok(LocationDef::Bounds { name, bounds })
    }

    pub fn name(&self) -> &str {
        match self {
            LocationDef::Point { name, .. } | LocationDef::Bounds { name, .. } => name,
        }
    }
}

fn validated_name(name: String) -> Result<String, ConfigError> {
    if name.trim().is_empty() {
        Err(ConfigError::InvalidLocation {
            name,
            reason: "each location must have a non-empty name".to_string(),
        })
    } else {
        Ok(name)
    }
}

/// What happens to a photo with GPS data that matches no location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UncategorizedBehavior {
    /// Copy/move it into the uncategorized folder
    #[default]
    Folder,
    /// Don't touch it
    LeaveInPlace,
}

impl UncategorizedBehavior {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "folder" => Some(Self::Folder),
            "leave_in_place" => Some(Self::LeaveInPlace),
            _ => None,
        }
    }
}

/// Named locations and the policy for unmatched photos
#[derive(Debug, Clone, PartialEq)]
pub struct SorterConfig {
    /// Declared locations; order matters for overlapping bounds
    pub locations: Vec<LocationDef>,
    pub uncategorized_behavior: UncategorizedBehavior,
    pub uncategorized_folder_name: String,
    /// Radius applied to point locations without an explicit one
    pub match_radius_km: f64,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            uncategorized_behavior: UncategorizedBehavior::default(),
            uncategorized_folder_name: DEFAULT_UNCATEGORIZED_FOLDER.to_string(),
            match_radius_km: DEFAULT_MATCH_RADIUS_KM,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    locations: Vec<RawLocation>,
    uncategorized_behavior: Option<String>,
    uncategorized_folder_name: Option<String>,
    match_radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    #[serde(default)]
    name: String,
    bounds: Option<RawBounds>,
    center: Option<RawPoint>,
    point: Option<RawPoint>,
    lat: Option<f64>,
    lon: Option<f64>,
    radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawBounds {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
}

impl RawLocation {
    fn into_location(self, default_radius_km: f64) -> Result<LocationDef, ConfigError> {
        let radius_km = self.radius_km.unwrap_or(default_radius_km);

        if let Some(b) = self.bounds {
            return LocationDef::bounds(
                self.name,
                BoundingBox {
                    min_lat: b.min_lat,
                    max_lat: b.max_lat,
                    min_lon: b.min_lon,
                    max_lon: b.max_lon,
                },
            );
        }

        let center = match (self.center.or(self.point), self.lat, self.lon) {
            (Some(p), _, _) => Coordinate::new(p.lat, p.lon),
            (None, Some(lat), Some(lon)) => Coordinate::new(lat, lon),
            _ => {
                validated_name(self.name.clone())?;
                return Err(ConfigError::InvalidLocation {
                    name: self.name,
                    reason: "must define one of: point, center (+ radius_km), lat/lon, or bounds"
                        .to_string(),
                });
            }
        };

        LocationDef::point(self.name, center, radius_km)
    }
}

impl SorterConfig {
    /// True when no locations are configured and photos get clustered instead
    pub fn is_auto_mode(&self) -> bool {
        self.locations.is_empty()
    }

    /// Load configuration from a `.json`, `.toml` or `.yaml`/`.yml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Self::from_json_str(&content).map_err(|e| e.with_path(path)),
            "toml" => Self::from_toml_str(&content).map_err(|e| e.with_path(path)),
            "yaml" | "yml" => Self::from_yaml_str(&content).map_err(|e| e.with_path(path)),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse configuration from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        Self::from_raw(raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        Self::from_raw(raw)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // an empty document means "no settings", same as `{}`
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let match_radius_km = raw.match_radius_km.unwrap_or(DEFAULT_MATCH_RADIUS_KM);

        let locations = raw
            .locations
            .into_iter()
            .map(|loc| loc.into_location(match_radius_km))
            .collect::<Result<Vec<_>, _>>()?;

        let uncategorized_behavior = match raw.uncategorized_behavior.as_deref() {
            None => UncategorizedBehavior::default(),
            Some(value) => UncategorizedBehavior::parse(value).unwrap_or_else(|| {
                warn!(value, "Unknown uncategorized_behavior, using \"folder\"");
                UncategorizedBehavior::Folder
            }),
        };

        Ok(Self {
            locations,
            uncategorized_behavior,
            uncategorized_folder_name: raw
                .uncategorized_folder_name
                .unwrap_or_else(|| DEFAULT_UNCATEGORIZED_FOLDER.to_string()),
            match_radius_km,
        })
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# GPS Sorter locations file (TOML)
# Leave out all [[locations]] entries to group photos automatically by proximity.

# What to do with photos that have GPS data but match no location:
# - "folder": put them into uncategorized_folder_name (default)
# - "leave_in_place": don't touch them
uncategorized_behavior = "folder"
uncategorized_folder_name = "Uncategorized"

# Radius (km) for point locations that don't set radius_km
match_radius_km = 0.5

# Point + radius: nearest matching point wins
[[locations]]
name = "Taipei 101"
center = { lat = 25.0339, lon = 121.5645 }
radius_km = 0.5

# Bounding box: checked before points, first matching box wins
[[locations]]
name = "Jiufen"
bounds = { min_lat = 25.108, max_lat = 25.112, min_lon = 121.843, max_lon = 121.848 }
"#
        .to_string()
    }
}

/// How sorted files reach their destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileOperation {
    /// Copy files to destination
    #[default]
    Copy,
    /// Move files to destination
    Move,
}

/// Settings for a single sorting run
#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Directory scanned (recursively) for photos
    pub input_dir: PathBuf,

    /// Base directory that receives the location folders
    pub output_dir: PathBuf,

    pub operation: FileOperation,

    /// Resolve auto-mode folder names via reverse geocoding
    pub geocode: bool,

    /// Geocode cache path; defaults to a file inside the output directory
    pub geocode_cache: Option<PathBuf>,

    /// Reverse-geocoding endpoint URL
    pub geocode_endpoint: String,

    /// Photos closer than roughly this share a folder in auto mode
    pub cluster_radius_km: f64,

    /// Produce single-word ASCII folder names (e.g. `YehliuGeopark`)
    pub single_word: bool,

    /// Show what would be done without touching any file
    pub dry_run: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("sorted"),
            operation: FileOperation::default(),
            geocode: true,
            geocode_cache: None,
            geocode_endpoint: DEFAULT_GEOCODE_ENDPOINT.to_string(),
            cluster_radius_km: crate::geo::cluster::DEFAULT_CLUSTER_RADIUS_KM,
            single_word: true,
            dry_run: false,
        }
    }
}

impl SortOptions {
    /// Get the geocode cache path, using the default if not specified
    pub fn cache_path(&self) -> PathBuf {
        self.geocode_cache
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_CACHE_FILE_NAME))
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config{}: {message}", path.as_ref().map(|p| format!(" file '{}'", p.display())).unwrap_or_default())]
    Parse {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("Unsupported config format '{}'. Use .json, .toml or .yaml", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid location '{name}': {reason}")]
    InvalidLocation { name: String, reason: String },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        match self {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_location_requires_name() {
        let center = Coordinate::new(25.0, 121.0);
        assert!(LocationDef::point("", center, 0.5).is_err());
        assert!(LocationDef::point("   ", center, 0.5).is_err());
        assert!(LocationDef::point("Taipei", center, 0.5).is_ok());
    }

    #[test]
    fn test_location_rejects_bad_geometry() {
        let center = Coordinate::new(25.0, 121.0);
        assert!(LocationDef::point("A", center, 0.0).is_err());
        assert!(LocationDef::point("A", center, -1.0).is_err());

        let inverted = BoundingBox {
            min_lat: 26.0,
            max_lat: 25.0,
            min_lon: 121.0,
            max_lon: 122.0,
        };
        assert!(LocationDef::bounds("B", inverted).is_err());
    }

    #[test]
    fn test_parse_json_config() {
        let json = r#"{
            "locations": [
                {"name": "Jiufen", "bounds": {"min_lat": 25.108, "max_lat": 25.112, "min_lon": 121.843, "max_lon": 121.848}},
                {"name": "Taipei 101", "center": {"lat": 25.0339, "lon": 121.5645}, "radius_km": 1.0},
                {"name": "Yehliu", "point": {"lat": 25.2058, "lon": 121.6903}},
                {"name": "Legacy", "lat": 24.0, "lon": 120.0, "radius_km": 2.5}
            ],
            "uncategorized_behavior": "leave_in_place",
            "match_radius_km": 0.8
        }"#;

        let config = SorterConfig::from_json_str(json).unwrap();
        assert_eq!(config.locations.len(), 4);
        assert!(!config.is_auto_mode());
        assert_eq!(config.locations[0].name(), "Jiufen");
        assert!(matches!(config.locations[0], LocationDef::Bounds { .. }));
        assert_eq!(
            config.locations[1],
            LocationDef::Point {
                name: "Taipei 101".to_string(),
                center: Coordinate::new(25.0339, 121.5645),
                radius_km: 1.0,
            }
        );
        // falls back to match_radius_km
        assert!(
            matches!(config.locations[2], LocationDef::Point { radius_km, .. } if radius_km == 0.8)
        );
        assert!(
            matches!(config.locations[3], LocationDef::Point { radius_km, .. } if radius_km == 2.5)
        );
        assert_eq!(
            config.uncategorized_behavior,
            UncategorizedBehavior::LeaveInPlace
        );
        assert_eq!(config.uncategorized_folder_name, "Uncategorized");
    }

    #[test]
    fn test_parse_empty_config_is_auto_mode() {
        let config = SorterConfig::from_json_str("{}").unwrap();
        assert!(config.is_auto_mode());
        assert_eq!(config, SorterConfig::default());
    }

    #[test]
    fn test_unknown_behavior_falls_back_to_folder() {
        let config =
            SorterConfig::from_json_str(r#"{"uncategorized_behavior": "explode"}"#).unwrap();
        assert_eq!(config.uncategorized_behavior, UncategorizedBehavior::Folder);
    }

    #[test]
    fn test_location_without_geometry_is_rejected() {
        let err = SorterConfig::from_json_str(r#"{"locations": [{"name": "Nowhere"}]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLocation { ref name, .. } if name == "Nowhere"));

        let err = SorterConfig::from_json_str(r#"{"locations": [{"lat": 1.0, "lon": 2.0}]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLocation { .. }));
    }

    #[test]
    fn test_sample_config_parses() {
        let config = SorterConfig::from_toml_str(&SorterConfig::sample_config()).unwrap();
        assert_eq!(config.locations.len(), 2);
        assert_eq!(config.locations[0].name(), "Taipei 101");
        assert_eq!(config.locations[1].name(), "Jiufen");
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
uncategorized_behavior: leave_in_place
match_radius_km: 1.5
locations:
  - name: Jiufen
    bounds: {min_lat: 25.108, max_lat: 25.112, min_lon: 121.843, max_lon: 121.848}
  - name: Taipei 101
    lat: 25.0339
    lon: 121.5645
"#;
        let config = SorterConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.locations.len(), 2);
        assert_eq!(config.locations[0].name(), "Jiufen");
        assert_eq!(
            config.uncategorized_behavior,
            UncategorizedBehavior::LeaveInPlace
        );
        match &config.locations[1] {
            LocationDef::Point { radius_km, .. } => assert_eq!(*radius_km, 1.5),
            other => panic!("expected a point, got {:?}", other),
        }

        assert!(SorterConfig::from_yaml_str("").unwrap().is_auto_mode());
        assert!(matches!(
            SorterConfig::from_yaml_str("locations: [unclosed"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_config_error_converts_to_crate_error() {
        let err: crate::error::Error = SorterConfig::load_from_file("places.ini")
            .unwrap_err()
            .into();
        assert!(matches!(err, crate::error::Error::Config(_)));
        assert!(err.to_string().starts_with("Configuration error: "));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();

        let toml_path = dir.path().join("places.toml");
        fs::write(&toml_path, SorterConfig::sample_config()).unwrap();
        assert_eq!(
            SorterConfig::load_from_file(&toml_path).unwrap().locations.len(),
            2
        );

        let json_path = dir.path().join("places.JSON");
        let mut file = fs::File::create(&json_path).unwrap();
        write!(file, r#"{{"locations": []}}"#).unwrap();
        assert!(SorterConfig::load_from_file(&json_path).unwrap().is_auto_mode());

        let yaml_path = dir.path().join("places.yaml");
        fs::write(&yaml_path, "locations: []").unwrap();
        assert!(SorterConfig::load_from_file(&yaml_path).unwrap().is_auto_mode());

        let ini_path = dir.path().join("places.ini");
        fs::write(&ini_path, "[locations]").unwrap();
        assert!(matches!(
            SorterConfig::load_from_file(&ini_path),
            Err(ConfigError::UnsupportedFormat { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            SorterConfig::load_from_file(&broken),
            Err(ConfigError::Parse { path: Some(_), .. })
        ));

        assert!(matches!(
            SorterConfig::load_from_file(dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_default_cache_path() {
        let options = SortOptions {
            output_dir: PathBuf::from("/photos/sorted"),
            ..SortOptions::default()
        };
        assert_eq!(
            options.cache_path(),
            PathBuf::from("/photos/sorted").join(DEFAULT_CACHE_FILE_NAME)
        );
    }
}
