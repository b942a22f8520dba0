//! Nearest-metro lookup over a resolved metro table.
//!
//! Chord distance on the unit sphere orders points exactly like great-circle
//! distance, so the R-tree nearest neighbour is also the nearest metro on
//! the Earth's surface.

use geo::Point;
use rstar::RTree;

use crate::geo_utils::{haversine_distance, unit_vector};
use crate::spatial::IndexedPlace;
use crate::PlaceRecord;

/// Read-only spatial lookup over metros.
pub struct MetroLookup {
    metros: Vec<PlaceRecord>,
    tree: RTree<IndexedPlace>,
}

impl MetroLookup {
    /// Build a lookup from metro records (e.g. read from a [`MetroTable`](crate::MetroTable)).
    ///
    /// # Example
    /// ```
    /// use world_metros::{MetroLookup, PlaceRecord};
    ///
    /// let lookup = MetroLookup::new(vec![
    ///     PlaceRecord::new(1, "Los Angeles", Some("CA"), "US", 4_000_000, 34.05, -118.24),
    ///     PlaceRecord::new(3, "Fresno", Some("CA"), "US", 530_000, 36.75, -119.77),
    /// ]);
    ///
    /// let (metro, _meters) = lookup.nearest(33.77, -118.19).unwrap();
    /// assert_eq!(metro.name, "Los Angeles");
    /// ```
    pub fn new(metros: Vec<PlaceRecord>) -> Self {
        let indexed: Vec<IndexedPlace> = metros
            .iter()
            .enumerate()
            .map(|(idx, m)| IndexedPlace::new(idx, &m.point()))
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
            metros,
        }
    }

    /// Nearest metro to a coordinate, with its great-circle distance in meters.
    pub fn nearest(&self, latitude: f64, longitude: f64) -> Option<(&PlaceRecord, f64)> {
        let point = Point::new(longitude, latitude);
        let entry = self.tree.nearest_neighbor(&unit_vector(&point))?;
        let metro = &self.metros[entry.idx];
        Some((metro, haversine_distance(&point, &metro.point())))
    }

    pub fn len(&self) -> usize {
        self.metros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metros.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lookup() {
        let lookup = MetroLookup::new(vec![]);
        assert!(lookup.is_empty());
        assert!(lookup.nearest(0.0, 0.0).is_none());
    }

    #[test]
    fn test_nearest_across_antimeridian() {
        let lookup = MetroLookup::new(vec![
            PlaceRecord::new(1, "Suva", None, "FJ", 93_000, -18.14, 178.44),
            PlaceRecord::new(2, "Apia", None, "WS", 37_000, -13.83, -171.77),
        ]);
        // Just east of the antimeridian, but closer to Suva than Apia
        let (metro, meters) = lookup.nearest(-17.5, -179.9).unwrap();
        assert_eq!(metro.name, "Suva");
        assert!(meters < 250_000.0);
    }

    #[test]
    fn test_nearest_reports_distance() {
        let lookup = MetroLookup::new(vec![PlaceRecord::new(1, "A", None, "XX", 1, 0.0, 0.0)]);
        let (_, meters) = lookup.nearest(0.0, 1.0).unwrap();
        assert!((meters - 111_195.0).abs() < 10.0);
    }
}
