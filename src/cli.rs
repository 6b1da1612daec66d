//! CLI argument parsing with clap

use crate::config::{DEFAULT_GEOCODE_ENDPOINT, FileOperation, SortOptions};
use crate::geo::cluster::DEFAULT_CLUSTER_RADIUS_KM;
use clap::Parser;
use std::path::PathBuf;

/// GPS Sorter - Sort photos into folders by where they were taken
///
/// Reads the GPS position from each photo's EXIF data and copies (or moves)
/// it into a folder named after a configured location, or, without a
/// locations file, after the place the photo was taken.
#[derive(Parser, Debug)]
#[command(name = "gps-sorter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Source directory containing images (scanned recursively)
    #[arg(short, long, required_unless_present = "print_sample_config")]
    pub input: Option<PathBuf>,

    /// Base output directory for sorted folders
    #[arg(short, long, required_unless_present = "print_sample_config")]
    pub output: Option<PathBuf>,

    /// Locations file (JSON, TOML or YAML)
    ///
    /// If omitted, photos are grouped by proximity and folders are named
    /// by place name (or by coordinates with --no-geocode).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Resolve folder names via reverse geocoding (default: on)
    #[arg(long, overrides_with = "no_geocode")]
    pub geocode: bool,

    /// Disable geocoding; use coordinate folder names (e.g. Lat25_03Lon121_56)
    #[arg(long, overrides_with = "geocode")]
    pub no_geocode: bool,

    /// Geocode cache file (default: gps_sorter_geocode_cache.json in the output dir)
    #[arg(long, value_name = "PATH")]
    pub geocode_cache: Option<PathBuf>,

    /// Reverse-geocoding endpoint (Nominatim compatible)
    #[arg(long, value_name = "URL", env = "GPS_SORTER_GEOCODE_ENDPOINT", default_value = DEFAULT_GEOCODE_ENDPOINT)]
    pub geocode_endpoint: String,

    /// In auto mode, photos within roughly this distance share a folder
    #[arg(long, value_name = "KM", default_value_t = DEFAULT_CLUSTER_RADIUS_KM)]
    pub cluster_radius_km: f64,

    /// Keep original folder names (spaces allowed) instead of single ASCII words
    #[arg(long)]
    pub no_single_word: bool,

    /// Move files instead of copying them
    #[arg(long = "move")]
    pub move_files: bool,

    /// Dry run mode - show what would be done without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,

    /// Print a sample locations file and exit
    #[arg(long)]
    pub print_sample_config: bool,
}

impl Cli {
    /// Whether place names should be looked up
    ///
    /// The two flags override each other, so the last one given wins and
    /// at most one of them is set.
    pub fn geocode_enabled(&self) -> bool {
        self.geocode || !self.no_geocode
    }

    /// Convert CLI arguments into run options
    ///
    /// Returns `None` when input or output is missing (only possible together
    /// with `--print-sample-config`).
    pub fn to_options(&self) -> Option<SortOptions> {
        let input_dir = self.input.clone()?;
        let output_dir = self.output.clone()?;

        Some(SortOptions {
            input_dir,
            output_dir,
            operation: if self.move_files {
                FileOperation::Move
            } else {
                FileOperation::Copy
            },
            geocode: self.geocode_enabled(),
            geocode_cache: self.geocode_cache.clone(),
            geocode_endpoint: self.geocode_endpoint.clone(),
            cluster_radius_km: self.cluster_radius_km,
            single_word: !self.no_single_word,
            dry_run: self.dry_run,
        })
    }
}
