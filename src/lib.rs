//! # World Metros
//!
//! Reduces a large catalog of populated places (the GeoNames city dumps) to a
//! minimal set of representative metro points.
//!
//! This library provides:
//! - GeoNames row normalization with region abbreviation
//! - A spatial index for repeated great-circle radius queries
//! - Greedy metro resolution with operator-forced metros
//! - A file-backed metro table, exporters and a nearest-metro lookup
//!
//! ## Features
//!
//! - **`parallel`** - Match forced metros in parallel with rayon
//! - **`http`** - Download the GeoNames feeds
//! - **`cli`** - Build the `world-metros` binary
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use world_metros::{resolve_metros, MetroConfig, PlaceRecord, SpatialIndex};
//!
//! let mut index = SpatialIndex::new();
//! index.insert(PlaceRecord::new(1, "Los Angeles", Some("CA"), "US", 4_000_000, 34.05, -118.24)).unwrap();
//! index.insert(PlaceRecord::new(2, "Long Beach", Some("CA"), "US", 466_000, 33.77, -118.19)).unwrap();
//! index.insert(PlaceRecord::new(3, "Fresno", Some("CA"), "US", 530_000, 36.75, -119.77)).unwrap();
//!
//! let config = MetroConfig { minimum_distance_meters: 100_000.0, ..MetroConfig::default() };
//! resolve_metros(&mut index, &config);
//!
//! let names: Vec<&str> = index.metros().map(|m| m.name.as_str()).collect();
//! assert_eq!(names, vec!["Los Angeles", "Fresno"]);
//! ```

use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub use error::{MetroError, RowError};

pub mod geo_utils;

pub mod provinces;

pub mod regions;
pub use regions::RegionMap;

pub mod normalize;
pub use normalize::{normalize_row, Normalized};

pub mod spatial;
pub use spatial::SpatialIndex;

pub mod resolver;
pub use resolver::{resolve_metros, MetroResolver, Resolution};

pub mod pipeline;
pub use pipeline::{generate_metros, import_places, Diagnostics, ImportStats, MetroRun};

pub mod store;
pub use store::MetroTable;

pub mod export;
pub use export::{export_metros, ExportFormat, ExportRecord};

pub mod lookup;
pub use lookup::MetroLookup;

// HTTP module for feed retrieval
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::FeedFetcher;

// ============================================================================
// Core Types
// ============================================================================

/// Lifecycle state of a place during a resolution run.
///
/// Every record starts `Active` and ends in exactly one of the terminal
/// states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceState {
    #[default]
    Active,
    /// Promoted to a metro
    Metro,
    /// Excluded by a nearby metro
    Cleared,
}

/// A populated place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// GeoNames id, unique across a run
    pub id: u64,
    /// ASCII name
    pub name: String,
    /// Short region code (e.g. "CA", "ON"), if one could be resolved
    pub region: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
    pub population: u64,
    /// Capital of a country or first-level admin area
    pub capital: bool,
    pub latitude: f64,
    pub longitude: f64,
    /// GeoNames feature code (PPL, PPLA, PPLC, ...)
    pub feature_code: String,
    #[serde(default)]
    pub state: PlaceState,
}

impl PlaceRecord {
    /// Create an active `PPL` record. Mostly useful for tests and demos;
    /// ingestion builds records through [`normalize_row`].
    pub fn new(
        id: u64,
        name: &str,
        region: Option<&str>,
        country: &str,
        population: u64,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            region: region.map(str::to_string),
            country: country.to_string(),
            population,
            capital: false,
            latitude,
            longitude,
            feature_code: "PPL".to_string(),
            state: PlaceState::Active,
        }
    }

    /// Location as a `geo::Point` (x = longitude, y = latitude).
    pub fn point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    pub fn is_active(&self) -> bool {
        self.state == PlaceState::Active
    }

    pub fn is_metro(&self) -> bool {
        self.state == PlaceState::Metro
    }
}

/// An operator-specified place that must become a metro.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForcedMetro {
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub country: String,
}

impl ForcedMetro {
    pub fn new(city: &str, region: Option<&str>, country: &str) -> Self {
        Self {
            city: city.to_string(),
            region: region.map(str::to_string),
            country: country.to_string(),
        }
    }
}

impl fmt::Display for ForcedMetro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [Some(self.city.as_str()), self.region.as_deref(), Some(self.country.as_str())]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Configuration for metro resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetroConfig {
    /// Minimum great-circle distance between discovered metros.
    /// Default: 100,000 meters
    pub minimum_distance_meters: f64,

    /// Places below this population never enter the working set.
    /// Default: 15,000
    pub minimum_population: u64,

    /// Places promoted to metros regardless of distance.
    /// Default: empty
    pub forced_metros: Vec<ForcedMetro>,

    /// Row errors tolerated before the import aborts.
    /// Default: 20
    pub max_import_errors: usize,
}

impl Default for MetroConfig {
    fn default() -> Self {
        Self {
            minimum_distance_meters: 100_000.0,
            minimum_population: 15_000,
            forced_metros: Vec::new(),
            max_import_errors: 20,
        }
    }
}

impl MetroConfig {
    /// Check that the configuration describes a valid run.
    pub fn validate(&self) -> Result<(), MetroError> {
        if !self.minimum_distance_meters.is_finite() || self.minimum_distance_meters < 0.0 {
            return Err(MetroError::InvalidConfig(format!(
                "minimum_distance_meters must be a non-negative number, got {}",
                self.minimum_distance_meters
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_point_axis_order() {
        let place = PlaceRecord::new(1, "Los Angeles", Some("CA"), "US", 4_000_000, 34.05, -118.24);
        assert_eq!(place.point().x(), -118.24);
        assert_eq!(place.point().y(), 34.05);
        assert!(place.is_active());
    }

    #[test]
    fn test_forced_metro_display() {
        assert_eq!(ForcedMetro::new("San Diego", Some("CA"), "US").to_string(), "San Diego, CA, US");
        assert_eq!(ForcedMetro::new("Singapore", None, "SG").to_string(), "Singapore, SG");
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: MetroConfig = serde_json::from_str(
            r#"{"minimum_distance_meters": 50000, "forced_metros": [{"city": "San Diego", "region": "CA", "country": "US"}]}"#,
        )
        .unwrap();
        assert_eq!(config.minimum_distance_meters, 50_000.0);
        assert_eq!(config.minimum_population, 15_000);
        assert_eq!(config.max_import_errors, 20);
        assert_eq!(config.forced_metros[0], ForcedMetro::new("San Diego", Some("CA"), "US"));
    }

    #[test]
    fn test_config_validation() {
        assert!(MetroConfig::default().validate().is_ok());
        let zero = MetroConfig { minimum_distance_meters: 0.0, ..MetroConfig::default() };
        assert!(zero.validate().is_ok());
        let negative = MetroConfig { minimum_distance_meters: -1.0, ..MetroConfig::default() };
        assert!(matches!(negative.validate(), Err(MetroError::InvalidConfig(_))));
        let nan = MetroConfig { minimum_distance_meters: f64::NAN, ..MetroConfig::default() };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PlaceState::Metro).unwrap(), "\"metro\"");
    }
}
