//! GPS coordinate extraction from image EXIF metadata

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;
use tracing::trace;

/// Image extensions scanned for GPS data (lowercase)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "heif", "tiff", "tif"];

/// Check if a path has a supported image extension
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Source of photo coordinates
pub trait GpsReader {
    /// Read the coordinate a photo was taken at
    ///
    /// Missing or corrupt metadata yields `Ok(None)`; a file that can't be
    /// opened or read is an error.
    fn read_coordinate(&self, path: &Path) -> Result<Option<Coordinate>>;
}

/// Reads GPS tags with `kamadak-exif`
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifGpsReader;

impl GpsReader for ExifGpsReader {
    fn read_coordinate(&self, path: &Path) -> Result<Option<Coordinate>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let exif = match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            // truncated files count as corrupt metadata, not read failures
            Err(exif::Error::Io(e)) if e.kind() != ErrorKind::UnexpectedEof => {
                return Err(Error::ExifRead {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                trace!(?path, error = %e, "No readable EXIF data");
                return Ok(None);
            }
        };

        let coord = gps_coordinate(&exif);
        trace!(?path, ?coord, "Read GPS tags");
        Ok(coord)
    }
}

/// Combine the GPS latitude/longitude tags into a coordinate
fn gps_coordinate(exif: &Exif) -> Option<Coordinate> {
    let latitude = signed_degrees(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = signed_degrees(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;

    // (0, 0) is what broken writers leave behind
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }

    let coord = Coordinate::new(latitude, longitude);
    coord.is_valid().then_some(coord)
}

fn signed_degrees(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let value = exif.get_field(value_tag, In::PRIMARY)?;
    let reference = exif.get_field(ref_tag, In::PRIMARY)?;

    let degrees = match &value.value {
        Value::Rational(parts) => {
            let parts: Vec<f64> = parts.iter().map(|r| r.to_f64()).collect();
            dms_to_degrees(&parts)?
        }
        _ => return None,
    };

    let negative = match &reference.value {
        Value::Ascii(strings) => strings
            .first()
            .and_then(|s| s.first())
            .is_some_and(|c| c.eq_ignore_ascii_case(&negative_ref)),
        _ => return None,
    };

    Some(if negative { -degrees } else { degrees })
}

/// Convert degrees/minutes/seconds to decimal degrees
fn dms_to_degrees(parts: &[f64]) -> Option<f64> {
    match parts {
        [d, m, s, ..] => {
            let degrees = d + m / 60.0 + s / 3600.0;
            degrees.is_finite().then_some(degrees)
        }
        _ => None,
    }
}
