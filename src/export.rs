//! Metro export to JSON, JavaScript or TypeScript modules.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{MetroError, PlaceRecord};

/// Exported metro fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub city: String,
    pub region: Option<String>,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: u64,
}

impl From<&PlaceRecord> for ExportRecord {
    fn from(place: &PlaceRecord) -> Self {
        Self {
            city: place.name.clone(),
            region: place.region.clone(),
            country: place.country.clone(),
            latitude: place.latitude,
            longitude: place.longitude,
            population: place.population,
        }
    }
}

/// Target file format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    /// CommonJS module (`module.exports = [...]`)
    JavaScript,
    /// ES module with a default export
    TypeScript,
}

impl ExportFormat {
    /// `.js` and `.ts` map to modules; anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("js") => Self::JavaScript,
            Some("ts") => Self::TypeScript,
            _ => Self::Json,
        }
    }
}

/// Write metros to `writer`, ordered by population descending then id ascending.
pub fn write_metros<W: Write>(writer: &mut W, metros: &[PlaceRecord], format: ExportFormat) -> Result<(), MetroError> {
    let mut sorted: Vec<&PlaceRecord> = metros.iter().collect();
    sorted.sort_by(|a, b| b.population.cmp(&a.population).then(a.id.cmp(&b.id)));
    let records: Vec<ExportRecord> = sorted.into_iter().map(ExportRecord::from).collect();

    match format {
        ExportFormat::Json => {}
        ExportFormat::JavaScript => write!(writer, "module.exports = ")?,
        ExportFormat::TypeScript => write!(writer, "export default ")?,
    }
    serde_json::to_writer_pretty(&mut *writer, &records)?;
    match format {
        ExportFormat::Json => writeln!(writer)?,
        ExportFormat::JavaScript | ExportFormat::TypeScript => writeln!(writer, ";")?,
    }
    Ok(())
}

/// Export metros to `path`, picking the format from its extension.
///
/// Returns the number of metros written.
pub fn export_metros<P: AsRef<Path>>(metros: &[PlaceRecord], path: P) -> Result<usize, MetroError> {
    let path = path.as_ref();
    let format = ExportFormat::from_path(path);

    let mut writer = BufWriter::new(File::create(path)?);
    write_metros(&mut writer, metros, format)?;
    writer.flush()?;

    info!("All metros written to {}", path.display());
    Ok(metros.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metros() -> Vec<PlaceRecord> {
        vec![
            PlaceRecord::new(3, "Fresno", Some("CA"), "US", 530_000, 36.75, -119.77),
            PlaceRecord::new(1, "Los Angeles", Some("CA"), "US", 4_000_000, 34.05, -118.24),
            PlaceRecord::new(2, "Singapore", None, "SG", 530_000, 1.29, 103.85),
        ]
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("export.js")), ExportFormat::JavaScript);
        assert_eq!(ExportFormat::from_path(Path::new("out/metros.TS")), ExportFormat::TypeScript);
        assert_eq!(ExportFormat::from_path(Path::new("metros.json")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("metros")), ExportFormat::Json);
    }

    #[test]
    fn test_json_export_sorted_by_population_then_id() {
        let mut out = Vec::new();
        write_metros(&mut out, &metros(), ExportFormat::Json).unwrap();

        let records: Vec<ExportRecord> = serde_json::from_slice(&out).unwrap();
        let cities: Vec<&str> = records.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Los Angeles", "Singapore", "Fresno"]);
        assert_eq!(records[1].region, None);
    }

    #[test]
    fn test_module_wrappers() {
        let mut js = Vec::new();
        write_metros(&mut js, &metros(), ExportFormat::JavaScript).unwrap();
        let js = String::from_utf8(js).unwrap();
        assert!(js.starts_with("module.exports = ["));
        assert!(js.trim_end().ends_with("];"));

        let mut ts = Vec::new();
        write_metros(&mut ts, &[], ExportFormat::TypeScript).unwrap();
        assert_eq!(String::from_utf8(ts).unwrap(), "export default [];\n");
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metros.json");
        assert_eq!(export_metros(&metros(), &path).unwrap(), 3);

        let records: Vec<ExportRecord> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].population, 4_000_000);
    }
}
