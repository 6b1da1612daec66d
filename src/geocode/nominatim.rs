//! Reverse geocoding through Nominatim (OpenStreetMap)
//!
//! The client performs a single blocking request per call. Non-200 statuses,
//! transport failures and malformed bodies all surface as `Error::Geocode`,
//! which the resolver treats as "no result".

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::naming::{contains_cjk, is_short_numeric};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::trace;

/// Overall deadline of one lookup
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Identifies this tool to the geocoding service as its usage policy requires
pub const USER_AGENT: &str = concat!(
    "GpsSorter/",
    env!("CARGO_PKG_VERSION"),
    " (local photo organizer)"
);

/// Address components that name a specific point of interest
const LANDMARK_KEYS: &[&str] = &["tourism", "landmark", "building", "attraction", "amenity"];

/// Containing-place components paired with a landmark name
const CONTAINING_CITY_KEYS: &[&str] = &["city", "town", "village", "county"];

/// Broad components tried after the more specific ones, in priority order
const BROAD_KEYS: &[&str] = &["neighbourhood", "city", "county", "municipality", "state"];

/// Parsed reverse-geocoding answer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeResponse {
    /// Full comma-separated description of the location
    pub display_name: Option<String>,
    /// Structured address components (`village`, `suburb`, `city`, ...)
    pub address: BTreeMap<String, String>,
}

impl GeocodeResponse {
    /// A trimmed address component, unless empty or a bare postal code
    pub fn component(&self, key: &str) -> Option<&str> {
        self.address
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && !is_short_numeric(v))
    }

    /// Village or else suburb, the most useful fine-grained fallback
    pub fn village_or_suburb(&self) -> Option<&str> {
        self.component("village").or_else(|| self.component("suburb"))
    }

    /// Use the village name instead of `candidate` when only the village is
    /// written without CJK ideographs
    fn prefer_latin_village<'a>(&'a self, candidate: &'a str) -> &'a str {
        match self.component("village") {
            Some(village) if contains_cjk(candidate) && !contains_cjk(village) => village,
            _ => candidate,
        }
    }

    /// Pick the best folder-worthy place name from this response
    ///
    /// Priority: landmark (with its city when different) > suburb > village >
    /// town or city district > neighbourhood, city, county, municipality,
    /// state > the full display name. Candidates that are bare numbers of up
    /// to five digits are skipped as postal codes.
    pub fn place_name(&self) -> Option<String> {
        for key in LANDMARK_KEYS {
            if let Some(name) = self.component(key) {
                let city = CONTAINING_CITY_KEYS.iter().find_map(|k| self.component(k));
                return Some(match city {
                    Some(city) if city != name => format!("{}, {}", name, city),
                    _ => name.to_string(),
                });
            }
        }

        if let Some(suburb) = self.component("suburb") {
            return Some(self.prefer_latin_village(suburb).to_string());
        }

        if let Some(village) = self.component("village") {
            return Some(village.to_string());
        }

        for key in ["town", "city_district"] {
            if let Some(town) = self.component(key) {
                return Some(self.prefer_latin_village(town).to_string());
            }
        }

        if let Some(name) = BROAD_KEYS.iter().find_map(|k| self.component(k)) {
            return Some(name.to_string());
        }

        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|d| {
                d.split(',')
                    .map(str::trim)
                    .any(|part| !part.is_empty() && !is_short_numeric(part))
            })
            .map(str::to_string)
    }
}

/// Parse a Nominatim JSON body
///
/// A body that isn't an object, or that carries an `error` key, is rejected.
/// Non-string address values are ignored.
pub fn parse_response(body: &str) -> Result<GeocodeResponse> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::Geocode(format!("Invalid JSON response: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| Error::Geocode("Response is not a JSON object".to_string()))?;

    if let Some(error) = object.get("error") {
        return Err(Error::Geocode(format!("Service error: {}", error)));
    }

    let address = object
        .get("address")
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(GeocodeResponse {
        display_name: object
            .get("display_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        address,
    })
}

/// Anything that can turn a coordinate into address information
pub trait ReverseGeocoder {
    fn reverse(&self, coord: Coordinate) -> Result<GeocodeResponse>;
}

/// Blocking Nominatim client
pub struct NominatimClient {
    agent: ureq::Agent,
    endpoint: String,
}

impl NominatimClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse(&self, coord: Coordinate) -> Result<GeocodeResponse> {
        trace!(%coord, endpoint = %self.endpoint, "Querying reverse geocoder");

        let response = self
            .agent
            .get(&self.endpoint)
            .query("lat", &coord.latitude.to_string())
            .query("lon", &coord.longitude.to_string())
            .query("format", "json")
            .query("addressdetails", "1")
            .set("Accept", "application/json")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => Error::Geocode(format!("HTTP {}", code)),
                ureq::Error::Transport(transport) => {
                    Error::Geocode(format!("Request failed: {}", transport))
                }
            })?;

        if response.status() != 200 {
            return Err(Error::Geocode(format!("HTTP {}", response.status())));
        }

        let body = response
            .into_string()
            .map_err(|e| Error::Geocode(format!("Failed to read response: {}", e)))?;

        parse_response(&body)
    }
}
