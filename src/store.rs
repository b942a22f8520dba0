//! File-backed metro table.
//!
//! The table is a JSON array of [`PlaceRecord`]s holding the metros of the
//! last run. It is provisioned before ingestion so an existing table is
//! never clobbered by accident.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::{MetroError, PlaceRecord};

/// Handle to the metro table on disk.
#[derive(Debug, Clone)]
pub struct MetroTable {
    path: PathBuf,
}

impl MetroTable {
    /// Create (or truncate) the table at `path`.
    ///
    /// Fails with [`MetroError::StoreUnavailable`] if the table already exists
    /// and `overwrite` is false, or if it cannot be created.
    pub fn provision<P: AsRef<Path>>(path: P, overwrite: bool) -> Result<Self, MetroError> {
        let path = path.as_ref().to_path_buf();

        if path.exists() && !overwrite {
            return Err(MetroError::store(
                &path,
                "the table already exists, use the --overwrite-data option to overwrite it",
            ));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| MetroError::store(&path, e))?;
        }
        fs::write(&path, "[]").map_err(|e| MetroError::store(&path, e))?;

        info!("Created metro table: {}", path.display());
        Ok(Self { path })
    }

    /// Open an existing table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MetroError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(MetroError::store(&path, "no metro table found, run `generate` first"));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the table contents with `metros`.
    pub fn write(&self, metros: &[PlaceRecord]) -> Result<(), MetroError> {
        let file = File::create(&self.path).map_err(|e| MetroError::store(&self.path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, metros)?;
        writer.flush()?;

        info!("Wrote {} metros to {}", metros.len(), self.path.display());
        Ok(())
    }

    /// Load all metros from the table.
    pub fn read(&self) -> Result<Vec<PlaceRecord>, MetroError> {
        let file = File::open(&self.path).map_err(|e| MetroError::store(&self.path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlaceState;

    fn metro(id: u64, name: &str, population: u64) -> PlaceRecord {
        let mut place = PlaceRecord::new(id, name, Some("CA"), "US", population, 34.0, -118.0);
        place.state = PlaceState::Metro;
        place
    }

    #[test]
    fn test_provision_creates_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = MetroTable::provision(dir.path().join("nested/metros.json"), false).unwrap();
        assert!(table.read().unwrap().is_empty());
    }

    #[test]
    fn test_provision_refuses_existing_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metros.json");
        MetroTable::provision(&path, false).unwrap();

        let result = MetroTable::provision(&path, false);
        assert!(matches!(result, Err(MetroError::StoreUnavailable { .. })));
    }

    #[test]
    fn test_provision_overwrite_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metros.json");
        let table = MetroTable::provision(&path, false).unwrap();
        table.write(&[metro(1, "Los Angeles", 4_000_000)]).unwrap();

        let table = MetroTable::provision(&path, true).unwrap();
        assert!(table.read().unwrap().is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let table = MetroTable::provision(dir.path().join("metros.json"), false).unwrap();
        let metros = vec![metro(1, "Los Angeles", 4_000_000), metro(3, "Fresno", 530_000)];
        table.write(&metros).unwrap();

        let loaded = MetroTable::open(table.path()).unwrap().read().unwrap();
        assert_eq!(loaded, metros);
    }

    #[test]
    fn test_open_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let result = MetroTable::open(dir.path().join("missing.json"));
        assert!(matches!(result, Err(MetroError::StoreUnavailable { .. })));
    }
}
