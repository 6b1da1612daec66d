//! Place-name resolution for auto mode
//!
//! Turns a coordinate into a folder name using, in order:
//! 1. The on-disk place-name cache (entries are validated before use)
//! 2. A throttled reverse-geocoding request
//! 3. A name derived from the coordinates themselves
//!
//! Resolution never fails; every failure degrades to the coordinate name.

pub mod cache;
pub mod nominatim;
pub mod throttle;

pub use cache::PlaceNameCache;
pub use nominatim::{GeocodeResponse, NominatimClient, ReverseGeocoder};
pub use throttle::{Clock, SystemClock, Throttle};

use crate::geo::Coordinate;
use crate::naming::{
    UNKNOWN, contains_cjk, coordinate_folder_name, looks_like_coordinate_name,
    looks_like_postal_code, sanitize_folder_name, to_lenient_word, to_single_word,
};
use cache::{DEFAULT_KEY_PRECISION, cache_key};
use tracing::{debug, warn};

/// Where a resolved name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    /// A validated cache entry
    Cache,
    /// A fresh reverse-geocoding answer
    Network,
    /// The village/suburb of an answer whose primary name was unusable
    AddressFallback,
    /// Built from the coordinates (offline, or every other source failed)
    Coordinates,
}

/// Result of place-name resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Folder-ready name
    pub name: String,
    pub source: NameSource,
}

impl ResolvedName {
    fn new(name: String, source: NameSource) -> Self {
        Self { name, source }
    }

    /// True when no place name could be found
    pub fn is_fallback(&self) -> bool {
        self.source == NameSource::Coordinates
    }
}

/// Per-call resolution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupOptions {
    /// Allow reverse-geocoding requests on cache misses
    pub use_network: bool,
    /// Normalize names into single ASCII words
    pub single_word: bool,
    /// Decimal places of the cache key; defaults to 3 (~100 m)
    pub cache_precision: Option<u32>,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            use_network: true,
            single_word: false,
            cache_precision: None,
        }
    }
}

/// Resolves coordinates to place names, owning the request throttle
pub struct PlaceNameResolver {
    geocoder: Box<dyn ReverseGeocoder>,
    throttle: Throttle,
}

impl PlaceNameResolver {
    pub fn new(geocoder: Box<dyn ReverseGeocoder>) -> Self {
        Self::with_throttle(geocoder, Throttle::default())
    }

    pub fn with_throttle(geocoder: Box<dyn ReverseGeocoder>, throttle: Throttle) -> Self {
        Self { geocoder, throttle }
    }

    /// Normalize a stored or fetched name for use as a folder
    fn normalize(name: &str, single_word: bool) -> String {
        if !single_word {
            return sanitize_folder_name(name);
        }
        let word = to_single_word(name);
        if word != UNKNOWN {
            return word;
        }
        to_lenient_word(name)
    }

    /// Look up a usable cache entry, evicting it if it fails validation
    fn from_cache(&self, cache: &PlaceNameCache, key: &str, single_word: bool) -> Option<String> {
        let raw = cache.get(key)?;
        let trimmed = raw.trim();

        let usable = if trimmed.is_empty() || looks_like_coordinate_name(trimmed) {
            debug!(key, value = trimmed, "Cached value is a coordinate fallback");
            None
        } else if looks_like_postal_code(trimmed) {
            debug!(key, value = trimmed, "Cached value is a postal code");
            None
        } else {
            let name = Self::normalize(trimmed, single_word);
            if single_word && name == UNKNOWN {
                debug!(key, value = trimmed, "Cached value has no usable single-word form");
                None
            } else {
                Some(name)
            }
        };

        if usable.is_none()
            && let Err(e) = cache.remove(key)
        {
            warn!(key, error = %e, "Failed to evict geocode cache entry");
        }
        usable
    }

    fn store(cache: Option<&PlaceNameCache>, key: &str, raw: &str) {
        if let Some(cache) = cache
            && let Err(e) = cache.insert(key, raw)
        {
            warn!(key, error = %e, "Failed to write geocode cache");
        }
    }

    /// Resolve a folder name for `coord`
    ///
    /// The raw service answer (not its normalized form) is what gets cached,
    /// so later runs can re-normalize it.
    pub fn resolve(
        &mut self,
        coord: Coordinate,
        cache: Option<&PlaceNameCache>,
        options: LookupOptions,
    ) -> ResolvedName {
        let single_word = options.single_word;
        let fallback = ResolvedName::new(
            coordinate_folder_name(coord, single_word),
            NameSource::Coordinates,
        );
        let key = cache_key(coord, options.cache_precision.unwrap_or(DEFAULT_KEY_PRECISION));

        if let Some(cache) = cache
            && let Some(name) = self.from_cache(cache, &key, single_word)
        {
            debug!(%coord, %key, name, "Place name from cache");
            return ResolvedName::new(name, NameSource::Cache);
        }

        if !options.use_network {
            return fallback;
        }

        self.throttle.wait();
        debug!(%coord, "Fetching place name from reverse geocoder");

        let response = match self.geocoder.reverse(coord) {
            Ok(response) => response,
            Err(e) => {
                warn!(%coord, error = %e, "Could not get place name, using coordinate name");
                return fallback;
            }
        };

        let Some(raw) = response.place_name() else {
            return match response.village_or_suburb() {
                Some(area) => {
                    let name = Self::normalize(area, single_word);
                    if single_word && name == UNKNOWN {
                        fallback
                    } else {
                        ResolvedName::new(name, NameSource::AddressFallback)
                    }
                }
                None => {
                    warn!(%coord, "Reverse geocoder returned no usable name, using coordinate name");
                    fallback
                }
            };
        };

        Self::store(cache, &key, &raw);

        if !single_word {
            debug!(%coord, name = raw, "Resolved place name");
            return ResolvedName::new(sanitize_folder_name(&raw), NameSource::Network);
        }

        let word = Self::normalize(&raw, true);
        if word != UNKNOWN {
            debug!(%coord, raw, word, "Resolved place name");
            return ResolvedName::new(word, NameSource::Network);
        }

        if contains_cjk(&raw)
            && let Some(area) = response.village_or_suburb()
        {
            let word = Self::normalize(area, true);
            if word != UNKNOWN {
                debug!(%coord, raw, area, word, "Resolved place name from village/suburb");
                return ResolvedName::new(word, NameSource::AddressFallback);
            }
        }

        let preview: String = raw.chars().take(80).collect();
        warn!(
            %coord,
            name = preview,
            "Reverse geocoder returned a name that can't be used as a folder, using coordinate name"
        );
        fallback
    }
}
