//! # Pipeline
//!
//! Wires raw feeds through normalization, the spatial index and the resolver:
//!
//! ```text
//! admin areas ──► RegionMap ─┐
//! place rows ──► normalize ──┴─► population filter ──► SpatialIndex ──► resolve ──► metros
//! ```
//!
//! Ingestion is a fold over the rows carrying [`ImportStats`]. Resolution only
//! starts once the fold has consumed the whole feed.

use std::fmt;
use std::io::BufRead;

use log::{info, warn};
use serde::Serialize;

use crate::resolver::resolve_metros;
use crate::{
    normalize_row, ForcedMetro, MetroConfig, MetroError, Normalized, PlaceRecord, RegionMap, Resolution, RowError,
    SpatialIndex,
};

/// Row counters of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Non-blank rows read
    pub scanned: usize,
    /// Places inserted into the working set
    pub imported: usize,
    /// Malformed or duplicate rows
    pub errors: usize,
    /// Rows that are not populated places
    pub non_populated: usize,
    /// Populated places below the minimum population
    pub below_population: usize,
    /// 1-based line number of the first rejected row, blank lines included
    pub first_error_line: Option<usize>,
}

impl ImportStats {
    fn record_error(&mut self, line: usize, error: &RowError, limit: usize) -> Result<(), MetroError> {
        self.errors += 1;
        self.first_error_line.get_or_insert(line);
        warn!("Skipping line {}: {}", line, error);
        if self.errors > limit {
            return Err(MetroError::TooManyImportErrors { errors: self.errors, limit });
        }
        Ok(())
    }
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} cities imported with {} error(s)",
            self.imported, self.scanned, self.errors
        )
    }
}

/// Summary of a full run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub import: ImportStats,
    /// Forced metros promoted
    pub forced: usize,
    /// Forced metros that matched no place
    pub unmatched_forced: Vec<ForcedMetro>,
    /// Total metros (forced and discovered)
    pub metros: usize,
}

/// Ingest place rows into a new [`SpatialIndex`].
///
/// Blank rows are ignored. Non-populated places and places below
/// `config.minimum_population` are counted and dropped. Malformed rows and
/// duplicate ids are counted as errors; once the error count exceeds
/// `config.max_import_errors` the import fails with
/// [`MetroError::TooManyImportErrors`].
pub fn import_places<I, S>(
    rows: I,
    regions: &RegionMap,
    config: &MetroConfig,
) -> Result<(SpatialIndex, ImportStats), MetroError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ingest(rows.into_iter().map(Ok), regions, config)
}

/// Ingest place rows from a reader.
///
/// IO errors abort the import. A row that is not valid UTF-8 is a row error
/// like any other malformed row.
pub fn import_places_from_reader<R: BufRead>(
    reader: R,
    regions: &RegionMap,
    config: &MetroConfig,
) -> Result<(SpatialIndex, ImportStats), MetroError> {
    let mut read_error = None;
    let rows = reader
        .split(b'\n')
        .map_while(|line| line.map_err(|e| read_error = Some(e)).ok())
        .map(decode_row);
    let imported = ingest(rows, regions, config);

    match read_error {
        Some(e) => Err(e.into()),
        None => imported,
    }
}

fn decode_row(mut bytes: Vec<u8>) -> Result<String, RowError> {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8(bytes).map_err(|e| RowError::InvalidEncoding {
        valid_up_to: e.utf8_error().valid_up_to(),
    })
}

fn ingest<I, S>(rows: I, regions: &RegionMap, config: &MetroConfig) -> Result<(SpatialIndex, ImportStats), MetroError>
where
    I: Iterator<Item = Result<S, RowError>>,
    S: AsRef<str>,
{
    let limit = config.max_import_errors;
    let (index, stats) = rows.enumerate().try_fold(
        (SpatialIndex::new(), ImportStats::default()),
        |(mut index, mut stats), (i, row)| -> Result<(SpatialIndex, ImportStats), MetroError> {
            let line = i + 1;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    stats.scanned += 1;
                    stats.record_error(line, &e, limit)?;
                    return Ok((index, stats));
                }
            };
            let row = row.as_ref();
            if row.trim().is_empty() {
                return Ok((index, stats));
            }
            stats.scanned += 1;

            match normalize_row(row, regions) {
                Ok(Normalized::Place(place)) if place.population < config.minimum_population => {
                    stats.below_population += 1;
                }
                Ok(Normalized::Place(place)) => match index.insert(place) {
                    Ok(_) => stats.imported += 1,
                    Err(e) => stats.record_error(line, &e, limit)?,
                },
                Ok(Normalized::Skip) => stats.non_populated += 1,
                Err(e) => stats.record_error(line, &e, limit)?,
            }

            Ok((index, stats))
        },
    )?;

    info!("[Import] {}", stats);
    Ok((index, stats))
}

/// Result of a full run: the resolved working set plus diagnostics.
#[derive(Debug)]
pub struct MetroRun {
    pub index: SpatialIndex,
    pub resolution: Resolution,
    pub diagnostics: Diagnostics,
}

impl MetroRun {
    /// Metros ordered by population descending, then id ascending.
    pub fn metros(&self) -> Vec<&PlaceRecord> {
        let mut metros: Vec<&PlaceRecord> = self.index.metros().collect();
        metros.sort_by(|a, b| b.population.cmp(&a.population).then(a.id.cmp(&b.id)));
        metros
    }

    /// Consume the run, returning metros ordered like [`MetroRun::metros`].
    pub fn into_metros(self) -> Vec<PlaceRecord> {
        let mut metros = self.index.into_metros();
        metros.sort_by(|a, b| b.population.cmp(&a.population).then(a.id.cmp(&b.id)));
        metros
    }
}

/// Build the region map, ingest the places and resolve metros.
pub fn generate_metros<P, A>(places: P, admin_areas: A, config: &MetroConfig) -> Result<MetroRun, MetroError>
where
    P: BufRead,
    A: BufRead,
{
    config.validate()?;

    let regions = RegionMap::from_reader(admin_areas)?;
    let (mut index, import) = import_places_from_reader(places, &regions, config)?;
    let resolution = resolve_metros(&mut index, config);

    let diagnostics = Diagnostics {
        import,
        forced: resolution.forced.len(),
        unmatched_forced: resolution.unmatched.clone(),
        metros: resolution.metro_count(),
    };
    info!(
        "[Run] {} metros ({} forced, {} forced unmatched); {}",
        diagnostics.metros,
        diagnostics.forced,
        diagnostics.unmatched_forced.len(),
        diagnostics.import
    );

    Ok(MetroRun { index, resolution, diagnostics })
}

// =============================================================================
// Unit Tests
// =============================================================================
