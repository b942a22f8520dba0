//! Region code resolution.
//!
//! Maps GeoNames admin codes (`"{country}.{adminId}"`, e.g. `"CA.08"`) to a
//! short region abbreviation (`"ON"`) by matching the admin-area names of
//! the `admin1CodesASCII.txt` feed against the static [province table](crate::provinces).

use std::collections::HashMap;
use std::io::BufRead;

use log::debug;

use crate::provinces::find_province;
use crate::MetroError;

/// Mapping from admin code to short region code.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    codes: HashMap<String, String>,
}

impl RegionMap {
    /// Create an empty region map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a region map from admin-area rows.
    ///
    /// Each row is tab-separated: `code, name, nameAscii, geonameId`. Rows
    /// without a matching province, or with too few fields, are omitted.
    ///
    /// # Example
    /// ```
    /// use world_metros::RegionMap;
    ///
    /// let rows = ["CA.08\tOntario\tOntario\t6093943", "XX.01\tNowhere\tNowhere\t1"];
    /// let regions = RegionMap::build(rows);
    /// assert_eq!(regions.lookup("CA.08"), Some("ON"));
    /// assert_eq!(regions.lookup("XX.01"), None);
    /// ```
    pub fn build<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut codes = HashMap::new();

        for row in rows {
            let mut fields = row.as_ref().split('\t');
            let (Some(code), Some(_name), Some(name_ascii)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            let country = code.split('.').next().unwrap_or_default();

            if let Some(province) = find_province(country, name_ascii.trim()) {
                codes.insert(code.to_string(), province.short.to_string());
            }
        }

        debug!("[Regions] Mapped {} admin codes to region abbreviations", codes.len());
        Self { codes }
    }

    /// Build a region map from a reader over the admin-area feed.
    ///
    /// Rows that are not valid UTF-8 are omitted; IO errors are fatal.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, MetroError> {
        let rows = reader.split(b'\n').collect::<Result<Vec<_>, _>>()?;
        let lines = rows.into_iter().filter_map(|row| match String::from_utf8(row) {
            Ok(line) => Some(line),
            Err(e) => {
                debug!("[Regions] Skipping admin area row: {}", e);
                None
            }
        });
        Ok(Self::build(lines))
    }

    /// Look up the short region code for an admin code.
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.codes.get(code).map(String::as_str)
    }

    /// Add or replace a mapping.
    pub fn insert(&mut self, code: impl Into<String>, short: impl Into<String>) {
        self.codes.insert(code.into(), short.into());
    }

    /// Number of mapped admin codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if no admin codes are mapped.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN_AREAS: &str = "\
AU.02\tNew South Wales\tNew South Wales\t2155400
CA.10\tQuébec\tQuebec\t6115047
MX.09\tCiudad de México\tMexico City\t3527646
DE.16\tBerlin\tBerlin\t2950157
broken-row
";

    #[test]
    fn test_build_matches_ascii_names() {
        let regions = RegionMap::build(ADMIN_AREAS.lines());
        assert_eq!(regions.lookup("AU.02"), Some("NSW"));
        assert_eq!(regions.lookup("CA.10"), Some("QC"));
        assert_eq!(regions.lookup("MX.09"), Some("CMX"));
        assert_eq!(regions.len(), 3);
    }

    #[test]
    fn test_unmatched_rows_are_omitted() {
        let regions = RegionMap::build(ADMIN_AREAS.lines());
        assert_eq!(regions.lookup("DE.16"), None);
        assert_eq!(regions.lookup("broken-row"), None);
    }

    #[test]
    fn test_from_reader() {
        let regions = RegionMap::from_reader(ADMIN_AREAS.as_bytes()).unwrap();
        assert_eq!(regions.len(), 3);
    }

    #[test]
    fn test_from_reader_skips_invalid_utf8() {
        let mut feed = b"XX.01\tNo\xffwhere\tNo\xffwhere\t1\n".to_vec();
        feed.extend_from_slice(ADMIN_AREAS.as_bytes());
        let regions = RegionMap::from_reader(&feed[..]).unwrap();
        assert_eq!(regions.len(), 3);
    }

    #[test]
    fn test_empty_feed() {
        let regions = RegionMap::build(Vec::<String>::new());
        assert!(regions.is_empty());
    }
}
