//! # Geographic Utilities
//!
//! Great-circle math shared by the spatial index, the resolver and the
//! nearest-metro lookup.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two points |
//! | [`unit_vector`] | Position of a point on the unit sphere |
//! | [`chord_distance_2`] | Squared unit-sphere chord for a surface distance |
//!
//! ## Example
//!
//! ```rust
//! use geo::Point;
//! use world_metros::geo_utils;
//!
//! let los_angeles = Point::new(-118.24, 34.05);
//! let fresno = Point::new(-119.77, 36.75);
//!
//! let dist = geo_utils::haversine_distance(&los_angeles, &fresno);
//! assert!(dist > 300_000.0 && dist < 340_000.0);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances are computed on a sphere with the mean Earth radius of
//! 6,371,000 m. `geo::Haversine` uses 6,371,008.8 m, so the formula is
//! written out here to keep metro radii on the 6,371,000 m sphere. Points
//! are `geo::Point`s with `x` = longitude and `y` = latitude, both in degrees.
//!
//! ### Chord Distances
//!
//! The spatial index stores places as 3D points on the unit sphere. For two
//! points on the sphere the straight-line (chord) distance grows strictly
//! with the great-circle distance, so a chord radius is an exact pre-filter
//! for a surface radius and needs no special cases at the poles or the
//! antimeridian.

use geo::Point;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface.
///
/// # Example
///
/// ```rust
/// use geo::Point;
/// use world_metros::geo_utils;
///
/// let london = Point::new(-0.1278, 51.5074);
/// let paris = Point::new(2.3522, 48.8566);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_500.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &Point, p2: &Point) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let dlat = lat2 - lat1;
    let dlng = (p2.x() - p1.x()).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Clamp guards against a > 1.0 from rounding on antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

// =============================================================================
// Unit Sphere Functions
// =============================================================================

/// Project a point onto the unit sphere as `[x, y, z]`.
#[inline]
pub fn unit_vector(p: &Point) -> [f64; 3] {
    let lat = p.y().to_radians();
    let lng = p.x().to_radians();
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

/// Squared unit-sphere chord length spanned by a surface distance in meters.
///
/// Distances of half the circumference or more span the whole sphere and
/// return the maximum squared chord (4.0). Negative distances return 0.0.
#[inline]
pub fn chord_distance_2(meters: f64) -> f64 {
    if meters <= 0.0 {
        return 0.0;
    }
    let angle = meters / EARTH_RADIUS_METERS;
    if angle >= std::f64::consts::PI {
        return 4.0;
    }
    let chord = 2.0 * (angle / 2.0).sin();
    chord * chord
}

/// Squared Euclidean distance between two unit-sphere vectors.
#[inline]
pub fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

// =============================================================================
// Unit Tests
// =============================================================================
