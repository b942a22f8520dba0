//! GeoNames row normalization.
//!
//! Converts tab-separated rows of the GeoNames `citiesNNNN.txt` dumps into
//! [`PlaceRecord`]s. Column layout:
//!
//! | # | Field | # | Field |
//! |---|-------|---|-------|
//! | 0 | geonameid | 10 | admin1 code |
//! | 1 | name | 11 | admin2 code |
//! | 2 | asciiname | 12 | admin3 code |
//! | 3 | alternatenames | 13 | admin4 code |
//! | 4 | latitude | 14 | population |
//! | 5 | longitude | 15 | elevation |
//! | 6 | feature class | 16 | dem |
//! | 7 | feature code | 17 | timezone |
//! | 8 | country code | 18 | modification date |
//! | 9 | cc2 | | |

use crate::{PlaceRecord, PlaceState, RegionMap, RowError};

/// Feature class of populated places (cities, towns, villages).
pub const POPULATED_PLACE_CLASS: &str = "P";

/// Feature codes marking a capital (country, historical or first-level admin seat).
pub const CAPITAL_FEATURE_CODES: [&str; 3] = ["PPLC", "PPLCH", "PPLA"];

/// Fields up to and including population are required.
const REQUIRED_FIELDS: usize = 15;

/// Outcome of normalizing one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Place(PlaceRecord),
    /// Not a populated place (mountains, rivers, ...)
    Skip,
}

/// Normalize a raw GeoNames row.
///
/// Numeric fields are validated before the feature class is checked, so a
/// malformed row is always reported as an error.
///
/// # Example
/// ```
/// use world_metros::{normalize_row, Normalized, RegionMap};
///
/// let row = "5368361\tLos Angeles\tLos Angeles\t\t34.05223\t-118.24368\tP\tPPLA2\tUS\t\tCA\t037\t\t\t3971883\t89\t115\tAmerica/Los_Angeles\t2019-09-05";
/// match normalize_row(row, &RegionMap::new()).unwrap() {
///     Normalized::Place(place) => {
///         assert_eq!(place.region.as_deref(), Some("CA"));
///         assert_eq!(place.population, 3_971_883);
///     }
///     Normalized::Skip => unreachable!(),
/// }
/// ```
pub fn normalize_row(row: &str, regions: &RegionMap) -> Result<Normalized, RowError> {
    let fields: Vec<&str> = row.split('\t').collect();
    if fields.len() < REQUIRED_FIELDS {
        return Err(RowError::MissingFields {
            expected: REQUIRED_FIELDS,
            found: fields.len(),
        });
    }

    let id: u64 = parse_field(fields[0], "id")?;
    let latitude: f64 = parse_field(fields[4], "latitude")?;
    let longitude: f64 = parse_field(fields[5], "longitude")?;
    let population: u64 = parse_field(fields[14], "population")?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(RowError::CoordinateOutOfRange { field: "latitude", value: latitude });
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(RowError::CoordinateOutOfRange { field: "longitude", value: longitude });
    }

    if fields[6] != POPULATED_PLACE_CLASS {
        return Ok(Normalized::Skip);
    }

    let feature_code = fields[7];
    let country = fields[8];
    let name = if fields[2].trim().is_empty() { fields[1] } else { fields[2] };

    Ok(Normalized::Place(PlaceRecord {
        id,
        name: name.to_string(),
        region: resolve_region(country, fields[10], fields[11], regions),
        country: country.to_string(),
        population,
        capital: CAPITAL_FEATURE_CODES.contains(&feature_code),
        latitude,
        longitude,
        feature_code: feature_code.to_string(),
        state: PlaceState::Active,
    }))
}

/// Resolve the short region code of a place.
///
/// US places use their admin1 code (already a state abbreviation). Other
/// countries try the admin2 code, then the admin1 code, against the region
/// map. Blank results become `None`.
pub fn resolve_region(country: &str, admin1: &str, admin2: &str, regions: &RegionMap) -> Option<String> {
    let region = if country == "US" {
        Some(admin1.to_string())
    } else {
        let by_admin2 = if admin2.trim().is_empty() {
            None
        } else {
            regions.lookup(&format!("{}.{}", country, admin2))
        };
        by_admin2
            .or_else(|| {
                if admin1.trim().is_empty() {
                    None
                } else {
                    regions.lookup(&format!("{}.{}", country, admin1))
                }
            })
            .map(str::to_string)
    };

    region.filter(|r| !r.trim().is_empty())
}

fn parse_field<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, RowError> {
    value.trim().parse().map_err(|_| RowError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
