//! Sorting run orchestration
//!
//! Handles the core logic of:
//! - Scanning the input directory for photos
//! - Reading GPS coordinates
//! - Choosing a destination folder (configured locations or auto clustering)
//! - Copying/moving photos into the output directory
//!
//! Per-photo failures are recorded in the summary and never abort the run.

use crate::config::{SortOptions, SorterConfig, UncategorizedBehavior};
use crate::error::{Error, Result};
use crate::exif::{ExifGpsReader, GpsReader, is_image_file};
use crate::file_ops::place_file;
use crate::geo::Coordinate;
use crate::geo::cluster::{ClusterKey, cluster_key, cluster_precision};
use crate::geo::matcher::match_location;
use crate::geocode::{LookupOptions, NominatimClient, PlaceNameCache, PlaceNameResolver};
use crate::naming::{coordinate_folder_name, sanitize_folder_name, to_single_word};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};
use walkdir::WalkDir;

/// Folder receiving photos without GPS data
pub const SKIPPED_FOLDER: &str = "Skipped";

/// Outcome of a sorting run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Photos found in the input directory
    pub total: usize,
    /// Photos copied/moved, including those sent to the Skipped folder
    pub sorted: usize,
    /// Photos without GPS data (sent to the Skipped folder)
    pub skipped_no_gps: usize,
    /// Unmatched photos left where they were
    pub skipped_no_match_left: usize,
    /// Photos not accounted for by any other counter
    pub skipped_other: usize,
    /// Auto-mode clusters that fell back to a coordinate name
    pub geocode_failures: usize,
    /// Per-photo failures as (path, message)
    pub errors: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Sorted: {}, No GPS: {}, Left in place: {}, Other: {}, Errors: {}",
            self.total,
            self.sorted,
            self.skipped_no_gps,
            self.skipped_no_match_left,
            self.skipped_other,
            self.errors.len()
        )
    }

    fn record_error(&mut self, path: &Path, error: &Error) {
        debug!(?path, error = %error, "Failed to sort photo");
        self.errors.push((path.to_path_buf(), error.to_string()));
    }

    fn finish(&mut self) {
        self.skipped_other = self
            .total
            .saturating_sub(self.sorted + self.skipped_no_match_left + self.errors.len());
    }
}

/// Photos of one auto-mode cluster, in scan order
struct Cluster {
    key: ClusterKey,
    photos: Vec<(PathBuf, Coordinate)>,
}

/// Main sorter for organizing photos by location
pub struct Sorter {
    options: SortOptions,
    config: SorterConfig,
    gps: Box<dyn GpsReader>,
    resolver: PlaceNameResolver,
}

impl Sorter {
    /// Create a sorter reading EXIF data and querying the configured geocoder
    pub fn new(options: SortOptions, config: SorterConfig) -> Self {
        let resolver =
            PlaceNameResolver::new(Box::new(NominatimClient::new(&options.geocode_endpoint)));
        Self::with_collaborators(options, config, Box::new(ExifGpsReader), resolver)
    }

    /// Create a sorter with explicit GPS and place-name sources
    pub fn with_collaborators(
        options: SortOptions,
        config: SorterConfig,
        gps: Box<dyn GpsReader>,
        resolver: PlaceNameResolver,
    ) -> Self {
        Self {
            options,
            config,
            gps,
            resolver,
        }
    }

    pub fn options(&self) -> &SortOptions {
        &self.options
    }

    /// Run the sorting pipeline
    ///
    /// Fails only when the input path is not a directory or the output
    /// directory can't be created.
    pub fn run(&mut self) -> Result<RunSummary> {
        let _span = span!(Level::INFO, "sorter_run").entered();

        let input_dir = self.options.input_dir.clone();
        if !input_dir.is_dir() {
            return Err(Error::NotADirectory(input_dir));
        }

        if !self.options.dry_run {
            fs::create_dir_all(&self.options.output_dir)?;
        }

        let photos = self.collect_photos()?;
        let mut summary = RunSummary {
            total: photos.len(),
            ..RunSummary::default()
        };

        if photos.is_empty() {
            info!(input = %input_dir.display(), "No image files found");
            return Ok(summary);
        }

        info!(count = photos.len(), input = %input_dir.display(), "Processing images");

        if self.config.is_auto_mode() {
            self.sort_by_clusters(&photos, &mut summary);
        } else {
            self.sort_by_locations(&photos, &mut summary);
        }

        summary.finish();
        info!("{}", summary.summary());
        for (path, message) in &summary.errors {
            warn!(?path, error = %message, "Photo not sorted");
        }

        Ok(summary)
    }

    /// Collect image files under the input directory, sorted by path
    ///
    /// The output directory is skipped when it lives inside the input.
    fn collect_photos(&self) -> Result<Vec<PathBuf>> {
        let output_dir = fs::canonicalize(&self.options.output_dir)
            .unwrap_or_else(|_| self.options.output_dir.clone());

        let mut photos = Vec::new();
        for entry in WalkDir::new(&self.options.input_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && is_same_dir(e.path(), &output_dir)))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && is_image_file(entry.path()) {
                photos.push(entry.into_path());
            }
        }

        photos.sort();
        Ok(photos)
    }

    /// Copy/move one photo into a folder under the output directory
    fn place(&self, path: &Path, folder: &str) -> Result<PathBuf> {
        let dest_dir = self.options.output_dir.join(folder);
        let dest = place_file(path, &dest_dir, self.options.operation, self.options.dry_run)?;
        if self.options.dry_run {
            info!(source = ?path, destination = ?dest, "Would sort photo");
        } else {
            debug!(source = ?path, destination = ?dest, "Sorted photo");
        }
        Ok(dest)
    }

    fn place_without_gps(&self, path: &Path, summary: &mut RunSummary) {
        debug!(?path, "No GPS data");
        match self.place(path, SKIPPED_FOLDER) {
            Ok(_) => {
                summary.skipped_no_gps += 1;
                summary.sorted += 1;
            }
            Err(e) => summary.record_error(path, &e),
        }
    }

    /// Config mode: match every photo against the named locations
    fn sort_by_locations(&self, photos: &[PathBuf], summary: &mut RunSummary) {
        for path in photos {
            let coord = match self.gps.read_coordinate(path) {
                Ok(Some(coord)) => coord,
                Ok(None) => {
                    self.place_without_gps(path, summary);
                    continue;
                }
                Err(e) => {
                    summary.record_error(path, &e);
                    continue;
                }
            };

            let folder = match match_location(coord, &self.config) {
                Some(name) if self.options.single_word => to_single_word(name),
                Some(name) => sanitize_folder_name(name),
                None => match self.config.uncategorized_behavior {
                    UncategorizedBehavior::LeaveInPlace => {
                        debug!(?path, %coord, "No matching location, left in place");
                        summary.skipped_no_match_left += 1;
                        continue;
                    }
                    UncategorizedBehavior::Folder => {
                        sanitize_folder_name(&self.config.uncategorized_folder_name)
                    }
                },
            };

            match self.place(path, &folder) {
                Ok(_) => summary.sorted += 1,
                Err(e) => summary.record_error(path, &e),
            }
        }
    }

    /// Auto mode: group photos by proximity and name each group once
    fn sort_by_clusters(&mut self, photos: &[PathBuf], summary: &mut RunSummary) {
        let radius_km = self.options.cluster_radius_km;
        let single_word = self.options.single_word;

        if self.options.geocode {
            info!(
                cache = %self.options.cache_path().display(),
                "Geocoding ON: folder names are place names (delete the cache file if you keep getting coordinate names)"
            );
        } else {
            warn!("Geocoding OFF: folders are named by coordinates (e.g. Lat25_03Lon121_56)");
        }
        info!(radius_km, single_word, "Auto mode: grouping photos by location");

        let mut clusters: Vec<Cluster> = Vec::new();
        let mut index: HashMap<ClusterKey, usize> = HashMap::new();
        let mut without_gps = Vec::new();

        for path in photos {
            match self.gps.read_coordinate(path) {
                Ok(Some(coord)) => {
                    debug!(?path, %coord, "GPS extracted");
                    let key = cluster_key(coord, radius_km);
                    let slot = *index.entry(key).or_insert_with(|| {
                        clusters.push(Cluster {
                            key,
                            photos: Vec::new(),
                        });
                        clusters.len() - 1
                    });
                    clusters[slot].photos.push((path.clone(), coord));
                }
                Ok(None) => without_gps.push(path),
                Err(e) => summary.record_error(path, &e),
            }
        }

        for path in without_gps {
            self.place_without_gps(path, summary);
        }

        if self.options.geocode && !clusters.is_empty() {
            info!(
                locations = clusters.len(),
                "Resolving place names (this may take a moment)"
            );
        }

        let cache = if self.options.dry_run {
            PlaceNameCache::read_only(self.options.cache_path())
        } else {
            PlaceNameCache::new(self.options.cache_path())
        };
        let lookup = LookupOptions {
            use_network: true,
            single_word,
            cache_precision: Some(cluster_precision(radius_km)),
        };

        for cluster in &clusters {
            let folder = if self.options.geocode {
                // Real photo coordinates give real place names; the cache key
                // still uses cluster precision so a cluster costs one request
                let (_, first) = &cluster.photos[0];
                let resolved = self.resolver.resolve(*first, Some(&cache), lookup);
                if resolved.is_fallback() {
                    summary.geocode_failures += 1;
                }
                debug!(coord = %first, folder = resolved.name, "Resolved cluster folder");
                resolved.name
            } else {
                coordinate_folder_name(cluster.key.center(), single_word)
            };
            let folder = sanitize_folder_name(&folder);

            for (path, _) in &cluster.photos {
                match self.place(path, &folder) {
                    Ok(_) => summary.sorted += 1,
                    Err(e) => summary.record_error(path, &e),
                }
            }
        }

        if summary.geocode_failures > 0 {
            error!(
                failures = summary.geocode_failures,
                cache = %self.options.cache_path().display(),
                "Geocoding failed for some locations, using coordinate folder names. \
                 Check your internet connection, delete the cache file and run again"
            );
        }
    }
}

fn is_same_dir(path: &Path, dir: &Path) -> bool {
    path == dir || fs::canonicalize(path).is_ok_and(|p| p == dir)
}
