//! On-disk cache of resolved place names
//!
//! The cache is one flat JSON object mapping `"lat,lon"` keys to the raw
//! place names returned by the geocoder. Every access reads the whole file
//! and every change rewrites it, so the file always holds the full latest
//! state. There is no locking: concurrent runs sharing a cache file race.

use crate::error::{Error, Result};
use crate::geo::{Coordinate, format_rounded};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default key precision: 3 decimals is roughly 100 m
pub const DEFAULT_KEY_PRECISION: u32 = 3;

/// Build the cache key for a coordinate, e.g. `"25.034,121.565"`
pub fn cache_key(coord: Coordinate, precision: u32) -> String {
    format!(
        "{},{}",
        format_rounded(coord.latitude, precision),
        format_rounded(coord.longitude, precision)
    )
}

/// Handle to a place-name cache file
#[derive(Debug, Clone)]
pub struct PlaceNameCache {
    path: PathBuf,
    read_only: bool,
}

impl PlaceNameCache {
    /// The file is created lazily on the first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
        }
    }

    /// Serve existing entries but never touch the file (dry runs)
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry; a missing or unreadable file counts as empty
    pub fn load(&self) -> BTreeMap<String, String> {
        if !self.path.exists() {
            return BTreeMap::new();
        }

        let entries = File::open(&self.path)
            .map_err(Error::from)
            .and_then(|file| {
                serde_json::from_reader::<_, BTreeMap<String, String>>(BufReader::new(file))
                    .map_err(Error::from)
            });

        match entries {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable geocode cache");
                BTreeMap::new()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    /// Store a value and rewrite the file
    pub fn insert(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load();
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    /// Drop an entry and rewrite the file
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            debug!(key, "Evicted geocode cache entry");
        }
        self.save(&entries)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if self.read_only {
            debug!(path = %self.path.display(), "Read-only geocode cache, not saving");
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Write to a temporary file first, then rename over the cache
        let temp_path = self.path.with_extension("tmp");
        let file = File::create(&temp_path).map_err(|e| {
            Error::CacheFile(format!("Failed to create temp cache file: {}", e))
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, entries)?;
        writer.flush()?;
        drop(writer);

        fs::rename(&temp_path, &self.path)
            .map_err(|e| Error::CacheFile(format!("Failed to rename temp cache file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_key() {
        assert_eq!(
            cache_key(Coordinate::new(25.0339, 121.5641), DEFAULT_KEY_PRECISION),
            "25.034,121.564"
        );
        assert_eq!(cache_key(Coordinate::new(0.0, 0.0), 3), "0.0,0.0");
        assert_eq!(cache_key(Coordinate::new(25.03, 121.56), 1), "25.0,121.6");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = PlaceNameCache::new(dir.path().join("cache.json"));
        assert!(cache.load().is_empty());
        assert_eq!(cache.get("1.0,2.0"), None);
    }

    #[test]
    fn test_insert_get_remove() {
        let dir = TempDir::new().unwrap();
        let cache = PlaceNameCache::new(dir.path().join("nested").join("cache.json"));

        cache.insert("25.034,121.564", "台北101").unwrap();
        cache.insert("25.11,121.845", "Jiufen").unwrap();
        assert!(cache.path().exists());
        assert_eq!(cache.get("25.034,121.564").as_deref(), Some("台北101"));

        cache.remove("25.034,121.564").unwrap();
        assert_eq!(cache.get("25.034,121.564"), None);
        assert_eq!(cache.get("25.11,121.845").as_deref(), Some("Jiufen"));
    }

    #[test]
    fn test_file_is_one_flat_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let cache = PlaceNameCache::new(&path);
        cache.insert("1.0,2.0", "Somewhere").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({"1.0,2.0": "Somewhere"}));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_read_only_cache_never_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("cache.json");

        let cache = PlaceNameCache::read_only(&path);
        cache.insert("1.0,2.0", "Somewhere").unwrap();
        assert!(!path.exists());
        assert!(!dir.path().join("out").exists());

        PlaceNameCache::new(&path).insert("1.0,2.0", "Somewhere").unwrap();
        cache.remove("1.0,2.0").unwrap();
        assert_eq!(cache.get("1.0,2.0").as_deref(), Some("Somewhere"));
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let cache = PlaceNameCache::new(&path);
        assert!(cache.load().is_empty());

        cache.insert("1.0,2.0", "Recovered").unwrap();
        assert_eq!(cache.get("1.0,2.0").as_deref(), Some("Recovered"));
    }
}
