//! # Metro Resolution
//!
//! Greedy clustering of an ingested [`SpatialIndex`] into metros.
//!
//! ## Algorithm
//! 1. Forced phase: match every [`ForcedMetro`], promote all matches, and only
//!    then clear the surroundings of each one, in order. Forced metros can
//!    therefore never clear each other.
//! 2. Discovery phase: repeatedly promote the most populous active place and
//!    clear every active place closer than the minimum distance.
//!
//! Every iteration removes at least the promoted place from the active set,
//! so discovery ends after at most N iterations for N places.

use log::{debug, info, warn};

use crate::{ForcedMetro, MetroConfig, PlaceState, SpatialIndex};

/// Outcome of a resolution run, as arena indices into the [`SpatialIndex`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Forced metros in configuration order (duplicates removed)
    pub forced: Vec<usize>,
    /// Discovered metros in promotion order
    pub discovered: Vec<usize>,
    /// Forced metro specs that matched no place
    pub unmatched: Vec<ForcedMetro>,
    /// Places cleared by a clear-step
    pub cleared: usize,
}

impl Resolution {
    /// Total number of metros.
    pub fn metro_count(&self) -> usize {
        self.forced.len() + self.discovered.len()
    }
}

/// Greedy metro resolver over a fully ingested index.
///
/// The resolver is the only writer of place states; it borrows the index
/// mutably for its whole lifetime.
pub struct MetroResolver<'a> {
    index: &'a mut SpatialIndex,
    minimum_distance_meters: f64,
    resolution: Resolution,
}

impl<'a> MetroResolver<'a> {
    pub fn new(index: &'a mut SpatialIndex, minimum_distance_meters: f64) -> Self {
        Self {
            index,
            minimum_distance_meters,
            resolution: Resolution::default(),
        }
    }

    /// Run the forced phase followed by discovery.
    pub fn run(mut self, forced_metros: &[ForcedMetro]) -> Resolution {
        self.apply_forced(forced_metros);
        self.discover();
        self.resolution
    }

    /// Promote the forced metros, then clear around each of them.
    ///
    /// Unmatched specs are logged and recorded; they never fail the run.
    pub fn apply_forced(&mut self, forced_metros: &[ForcedMetro]) {
        let matches = match_forced(&*self.index, forced_metros);

        let mut promoted = Vec::new();
        for (spec, found) in forced_metros.iter().zip(matches) {
            match found {
                Some(idx) => {
                    if self.promote(idx) {
                        promoted.push(idx);
                    }
                }
                None => {
                    warn!("Could not find the forced metro: {}", spec);
                    self.resolution.unmatched.push(spec.clone());
                }
            }
        }

        // Every forced metro is already a Metro here, so clear-steps skip them
        for &idx in &promoted {
            self.clear_around(idx);
        }

        self.resolution.forced.extend(promoted);
    }

    /// Promote active places in (population desc, id asc) order until none remain.
    pub fn discover(&mut self) {
        while let Some(idx) = self.index.peek_max_population_active() {
            self.promote(idx);
            self.clear_around(idx);
            self.resolution.discovered.push(idx);
        }
    }

    fn promote(&mut self, idx: usize) -> bool {
        if !self.index.deactivate(idx, PlaceState::Metro) {
            return false;
        }
        if let Some(place) = self.index.get(idx) {
            debug!("Found metro: {}, {}", place.name, place.country);
        }
        true
    }

    /// Clear every active place closer than the minimum distance to `idx`.
    fn clear_around(&mut self, idx: usize) -> usize {
        let nearby: Vec<usize> = self.index.within(idx, self.minimum_distance_meters).collect();
        let mut cleared = 0;
        for other in nearby {
            if self.index.deactivate(other, PlaceState::Cleared) {
                cleared += 1;
            }
        }
        self.resolution.cleared += cleared;
        cleared
    }
}

/// Resolve metros with the distance and forced metros of `config`.
///
/// The index must be fully populated; resolution mutates place states only.
pub fn resolve_metros(index: &mut SpatialIndex, config: &MetroConfig) -> Resolution {
    info!(
        "[Metros] Resolving {} places (minimum distance {:.0}m, {} forced)",
        index.active_count(),
        config.minimum_distance_meters,
        config.forced_metros.len()
    );

    let resolution = MetroResolver::new(index, config.minimum_distance_meters).run(&config.forced_metros);

    info!(
        "[Metros] Found {} metros ({} forced, {} cleared)",
        resolution.metro_count(),
        resolution.forced.len(),
        resolution.cleared
    );
    resolution
}

/// Look up each forced metro. Read-only, so it may run in parallel.
#[cfg(feature = "parallel")]
fn match_forced(index: &SpatialIndex, forced_metros: &[ForcedMetro]) -> Vec<Option<usize>> {
    use rayon::prelude::*;

    forced_metros
        .par_iter()
        .map(|spec| index.find_exact(&spec.city, spec.region.as_deref(), &spec.country))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn match_forced(index: &SpatialIndex, forced_metros: &[ForcedMetro]) -> Vec<Option<usize>> {
    forced_metros
        .iter()
        .map(|spec| index.find_exact(&spec.city, spec.region.as_deref(), &spec.country))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
