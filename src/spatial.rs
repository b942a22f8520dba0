//! # Spatial Index
//!
//! Working set of a resolution run. Places live in an arena (`Vec<PlaceRecord>`)
//! and every other structure refers to them by arena index:
//!
//! - an R-tree of unit-sphere positions answers radius queries
//! - a max-heap keyed by (population, smallest id) yields the next metro candidate
//! - hash maps resolve ids and exact (name, region, country) keys
//!
//! Deactivating a place only flips its state. Stale tree and heap entries are
//! filtered at query time, so no structure is rebuilt during resolution.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use geo::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geo_utils::{chord_distance_2, haversine_distance, squared_distance, unit_vector};
use crate::{PlaceRecord, PlaceState, RowError};

/// Relative slack on the chord pre-filter so rounding never drops a candidate
/// that the exact haversine check would accept.
const CHORD_SLACK: f64 = 1e-9;

// =============================================================================
// R-tree Indexed Place
// =============================================================================

/// A place position on the unit sphere with its index into the owning `Vec`.
///
/// Also used by [`MetroLookup`](crate::MetroLookup).
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexedPlace {
    pub(crate) idx: usize,
    xyz: [f64; 3],
}

impl IndexedPlace {
    pub(crate) fn new(idx: usize, point: &Point) -> Self {
        Self { idx, xyz: unit_vector(point) }
    }
}

impl RTreeObject for IndexedPlace {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xyz)
    }
}

impl PointDistance for IndexedPlace {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        squared_distance(&self.xyz, point)
    }
}

/// Heap entry ordering: larger population first, then smaller id.
type PopulationRank = (u64, Reverse<u64>, usize);

/// Exact-match key: (name, region, country).
type PlaceKey = (String, Option<String>, String);

// =============================================================================
// Spatial Index
// =============================================================================

/// Arena-backed spatial index over the places of one resolution run.
pub struct SpatialIndex {
    places: Vec<PlaceRecord>,
    ids: HashMap<u64, usize>,
    keys: HashMap<PlaceKey, usize>,
    tree: RTree<IndexedPlace>,
    by_population: BinaryHeap<PopulationRank>,
    active: usize,
}

impl SpatialIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            places: Vec::new(),
            ids: HashMap::new(),
            keys: HashMap::new(),
            tree: RTree::new(),
            by_population: BinaryHeap::new(),
            active: 0,
        }
    }

    /// Build an index from records, failing on the first duplicate id.
    pub fn from_records<I>(records: I) -> Result<Self, RowError>
    where
        I: IntoIterator<Item = PlaceRecord>,
    {
        let mut index = Self::new();
        for record in records {
            index.insert(record)?;
        }
        Ok(index)
    }

    /// Add a record as `Active` and return its arena index.
    ///
    /// Fails with [`RowError::DuplicateId`] if a record with the same id is
    /// already indexed; the index is left unchanged in that case.
    pub fn insert(&mut self, mut record: PlaceRecord) -> Result<usize, RowError> {
        if self.ids.contains_key(&record.id) {
            return Err(RowError::DuplicateId(record.id));
        }

        let idx = self.places.len();
        record.state = PlaceState::Active;

        self.ids.insert(record.id, idx);
        self.keys
            .entry((record.name.clone(), record.region.clone(), record.country.clone()))
            .or_insert(idx);
        self.tree.insert(IndexedPlace::new(idx, &record.point()));
        self.by_population.push((record.population, Reverse(record.id), idx));
        self.places.push(record);
        self.active += 1;

        Ok(idx)
    }

    /// Active places strictly closer than `radius_meters` to `point`.
    ///
    /// Candidates are pre-filtered by the R-tree using the equivalent
    /// unit-sphere chord, then checked with the exact haversine distance.
    pub fn query(&self, point: Point, radius_meters: f64) -> impl Iterator<Item = usize> + '_ {
        let xyz = unit_vector(&point);
        let max_chord_2 = chord_distance_2(radius_meters) * (1.0 + CHORD_SLACK) + f64::EPSILON;

        self.tree
            .locate_within_distance(xyz, max_chord_2)
            .map(|entry| entry.idx)
            .filter(move |&idx| {
                let place = &self.places[idx];
                place.is_active() && haversine_distance(&point, &place.point()) < radius_meters
            })
    }

    /// Active places strictly closer than `radius_meters` to the place at
    /// `idx`, excluding that place itself.
    pub fn within(&self, idx: usize, radius_meters: f64) -> impl Iterator<Item = usize> + '_ {
        let center = self.places.get(idx).map(PlaceRecord::point);
        center
            .into_iter()
            .flat_map(move |point| self.query(point, radius_meters))
            .filter(move |&other| other != idx)
    }

    /// Move an active place to a terminal state.
    ///
    /// Returns `false` (and changes nothing) if the place is not active, or if
    /// `state` is [`PlaceState::Active`].
    pub fn deactivate(&mut self, idx: usize, state: PlaceState) -> bool {
        if state == PlaceState::Active {
            return false;
        }
        match self.places.get_mut(idx) {
            Some(place) if place.is_active() => {
                place.state = state;
                self.active -= 1;
                true
            }
            _ => false,
        }
    }

    /// Arena index of the active place with the largest population, ties
    /// broken by smallest id.
    ///
    /// Heap entries of places that are no longer active are discarded on the
    /// way, which is why this takes `&mut self`.
    pub fn peek_max_population_active(&mut self) -> Option<usize> {
        while let Some(&(_, _, idx)) = self.by_population.peek() {
            if self.places[idx].is_active() {
                return Some(idx);
            }
            self.by_population.pop();
        }
        None
    }

    /// First inserted place (in any state) with exactly this name, region and country.
    pub fn find_exact(&self, name: &str, region: Option<&str>, country: &str) -> Option<usize> {
        let key = (name.to_string(), region.map(str::to_string), country.to_string());
        self.keys.get(&key).copied()
    }

    /// Arena index of the place with the given id.
    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.ids.get(&id).copied()
    }

    pub fn get(&self, idx: usize) -> Option<&PlaceRecord> {
        self.places.get(idx)
    }

    /// All places in insertion order.
    pub fn places(&self) -> &[PlaceRecord] {
        &self.places
    }

    /// Metro places in insertion order.
    pub fn metros(&self) -> impl Iterator<Item = &PlaceRecord> {
        self.places.iter().filter(|p| p.is_metro())
    }

    /// Consume the index, returning the metro places.
    pub fn into_metros(self) -> Vec<PlaceRecord> {
        self.places.into_iter().filter(PlaceRecord::is_metro).collect()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Number of places still `Active`.
    pub fn active_count(&self) -> usize {
        self.active
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("places", &self.places.len())
            .field("active", &self.active)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: u64, name: &str, population: u64, lat: f64, lng: f64) -> PlaceRecord {
        PlaceRecord::new(id, name, Some("CA"), "US", population, lat, lng)
    }

    fn california() -> SpatialIndex {
        SpatialIndex::from_records(vec![
            place(1, "Los Angeles", 4_000_000, 34.05, -118.24),
            place(2, "Long Beach", 466_000, 33.77, -118.19),
            place(3, "Fresno", 530_000, 36.75, -119.77),
        ])
        .unwrap()
    }

    fn sorted(iter: impl Iterator<Item = usize>) -> Vec<usize> {
        let mut v: Vec<usize> = iter.collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_indexed_place_distance_is_chord() {
        let la = Point::new(-118.24, 34.05);
        let fresno = Point::new(-119.77, 36.75);
        let entry = IndexedPlace::new(7, &la);
        let expected = chord_distance_2(haversine_distance(&la, &fresno));
        assert_eq!(entry.idx, 7);
        assert!((entry.distance_2(&unit_vector(&fresno)) - expected).abs() < 1e-12);
        assert_eq!(entry.envelope(), AABB::from_point(unit_vector(&la)));
    }

    #[test]
    fn test_insert_assigns_arena_indices() {
        let index = california();
        assert_eq!(index.len(), 3);
        assert_eq!(index.active_count(), 3);
        assert_eq!(index.index_of(3), Some(2));
        assert_eq!(index.get(2).unwrap().name, "Fresno");
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut index = california();
        let result = index.insert(place(2, "Other", 10, 0.0, 0.0));
        assert_eq!(result, Err(RowError::DuplicateId(2)));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_insert_resets_state() {
        let mut index = SpatialIndex::new();
        let mut record = place(1, "A", 10, 0.0, 0.0);
        record.state = PlaceState::Cleared;
        let idx = index.insert(record).unwrap();
        assert!(index.get(idx).unwrap().is_active());
    }

    #[test]
    fn test_within_excludes_self_and_far_places() {
        let index = california();
        assert_eq!(sorted(index.within(0, 100_000.0)), vec![1]);
        assert_eq!(sorted(index.within(2, 100_000.0)), Vec::<usize>::new());
        assert_eq!(sorted(index.within(0, 400_000.0)), vec![1, 2]);
    }

    #[test]
    fn test_query_skips_inactive_places() {
        let mut index = california();
        assert!(index.deactivate(1, PlaceState::Cleared));
        assert_eq!(sorted(index.within(0, 100_000.0)), Vec::<usize>::new());
    }

    #[test]
    fn test_query_radius_is_exclusive() {
        let index = california();
        let la = index.get(0).unwrap().point();
        let lb = index.get(1).unwrap().point();
        let exact = haversine_distance(&la, &lb);
        assert_eq!(sorted(index.within(0, exact)), Vec::<usize>::new());
        assert_eq!(sorted(index.within(0, exact + 1.0)), vec![1]);
    }

    #[test]
    fn test_zero_radius_matches_nothing() {
        let mut index = california();
        index.insert(place(4, "Los Angeles Twin", 10, 34.05, -118.24)).unwrap();
        assert_eq!(sorted(index.within(0, 0.0)), Vec::<usize>::new());
    }

    #[test]
    fn test_query_across_antimeridian() {
        let index = SpatialIndex::from_records(vec![
            place(1, "West", 100, -17.0, 179.95),
            place(2, "East", 50, -17.0, -179.95),
        ])
        .unwrap();
        // ~10.6 km apart across the antimeridian
        assert_eq!(sorted(index.within(0, 20_000.0)), vec![1]);
    }

    #[test]
    fn test_query_near_pole() {
        let index = SpatialIndex::from_records(vec![
            place(1, "A", 100, 89.9, 0.0),
            place(2, "B", 50, 89.9, 180.0),
        ])
        .unwrap();
        // ~22 km apart over the pole
        assert_eq!(sorted(index.within(0, 30_000.0)), vec![1]);
    }

    #[test]
    fn test_query_matches_brute_force() {
        let mut records = Vec::new();
        let mut id = 0;
        for lat in (-80..=80).step_by(4) {
            for lng in (-180..180).step_by(6) {
                id += 1;
                records.push(place(id, &format!("p{}", id), id, lat as f64 + 0.3, lng as f64 + 0.7));
            }
        }
        let index = SpatialIndex::from_records(records).unwrap();

        for radius in [50_000.0, 500_000.0, 2_500_000.0] {
            for probe in [0, 17, 400, index.len() - 1] {
                let center = index.get(probe).unwrap().point();
                let expected: Vec<usize> = (0..index.len())
                    .filter(|&i| i != probe && haversine_distance(&center, &index.get(i).unwrap().point()) < radius)
                    .collect();
                assert_eq!(sorted(index.within(probe, radius)), expected);
            }
        }
    }

    #[test]
    fn test_peek_max_population_skips_inactive() {
        let mut index = california();
        assert_eq!(index.peek_max_population_active(), Some(0));
        // Peeking does not consume
        assert_eq!(index.peek_max_population_active(), Some(0));
        index.deactivate(0, PlaceState::Metro);
        assert_eq!(index.peek_max_population_active(), Some(2));
        index.deactivate(2, PlaceState::Metro);
        index.deactivate(1, PlaceState::Cleared);
        assert_eq!(index.peek_max_population_active(), None);
    }

    #[test]
    fn test_peek_ties_break_on_smallest_id() {
        let index_records = vec![
            place(9, "Nine", 1000, 10.0, 10.0),
            place(4, "Four", 1000, 20.0, 20.0),
            place(7, "Seven", 1000, 30.0, 30.0),
        ];
        let mut index = SpatialIndex::from_records(index_records).unwrap();
        let idx = index.peek_max_population_active().unwrap();
        assert_eq!(index.get(idx).unwrap().id, 4);
    }

    #[test]
    fn test_deactivate_only_from_active() {
        let mut index = california();
        assert!(!index.deactivate(0, PlaceState::Active));
        assert!(index.deactivate(0, PlaceState::Metro));
        assert!(!index.deactivate(0, PlaceState::Cleared));
        assert!(!index.deactivate(99, PlaceState::Cleared));
        assert_eq!(index.get(0).unwrap().state, PlaceState::Metro);
        assert_eq!(index.active_count(), 2);
    }

    #[test]
    fn test_find_exact_first_insertion_wins() {
        let mut index = california();
        index.insert(place(10, "Springfield", 100, 39.8, -89.6)).unwrap();
        index.insert(place(11, "Springfield", 200, 42.1, -72.6)).unwrap();
        assert_eq!(index.find_exact("Springfield", Some("CA"), "US"), Some(3));
        assert_eq!(index.find_exact("Fresno", Some("CA"), "US"), Some(2));
        assert_eq!(index.find_exact("Fresno", None, "US"), None);
        assert_eq!(index.find_exact("Fresno", Some("CA"), "MX"), None);
    }

    #[test]
    fn test_find_exact_with_null_region() {
        let mut index = SpatialIndex::new();
        index.insert(PlaceRecord::new(1, "Singapore", None, "SG", 5_000_000, 1.29, 103.85)).unwrap();
        assert_eq!(index.find_exact("Singapore", None, "SG"), Some(0));
    }

    #[test]
    fn test_find_exact_returns_inactive_places() {
        let mut index = california();
        index.deactivate(1, PlaceState::Cleared);
        assert_eq!(index.find_exact("Long Beach", Some("CA"), "US"), Some(1));
    }

    #[test]
    fn test_metros_in_insertion_order() {
        let mut index = california();
        index.deactivate(2, PlaceState::Metro);
        index.deactivate(0, PlaceState::Metro);
        let names: Vec<&str> = index.metros().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Los Angeles", "Fresno"]);
        assert_eq!(index.into_metros().len(), 2);
    }
}
