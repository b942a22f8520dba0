//! HTTP retrieval of the GeoNames feeds.
//!
//! Downloads the city dump (usually a zip archive holding a single text
//! file) and the admin-area list concurrently, and returns both as raw bytes.
//! There is no retry: a failed download fails the run.

use std::io::{Cursor, Read};
use std::time::{Duration, Instant};

use log::{debug, info};
use reqwest::Client;

use crate::MetroError;

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Downloaded feed contents.
#[derive(Debug, Clone)]
pub struct Feeds {
    /// City rows (tab-separated GeoNames dump). Kept as bytes; rows are
    /// decoded one by one during import.
    pub places: Vec<u8>,
    /// Admin-area rows
    pub admin_areas: Vec<u8>,
}

/// Downloader for the GeoNames feeds.
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new() -> Result<Self, MetroError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| MetroError::Download(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Download both feeds concurrently.
    pub async fn fetch(&self, seed_url: &str, admin_areas_url: &str) -> Result<Feeds, MetroError> {
        let start = Instant::now();

        let (seed, admin_areas) = futures::try_join!(self.download(seed_url), self.download(admin_areas_url))?;

        let places = if seed_url.ends_with(".zip") {
            info!("Extracting city data");
            extract_first_entry(&seed)?
        } else {
            seed
        };

        info!(
            "[FeedFetcher] Fetched {:.1}KB of city rows and {:.1}KB of admin areas in {:.2}s",
            places.len() as f64 / 1024.0,
            admin_areas.len() as f64 / 1024.0,
            start.elapsed().as_secs_f64()
        );
        Ok(Feeds { places, admin_areas })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, MetroError> {
        info!("Downloading {}", url);
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MetroError::Download(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetroError::Download(format!("{}: HTTP {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MetroError::Download(format!("{}: body download error: {}", url, e)))?;

        debug!(
            "[Download] {} ({:.1}KB) in {:?}",
            url,
            bytes.len() as f64 / 1024.0,
            start.elapsed()
        );
        Ok(bytes.to_vec())
    }
}

/// Blocking wrapper - runs the async download on a tokio runtime.
pub fn fetch_feeds_blocking(seed_url: &str, admin_areas_url: &str) -> Result<Feeds, MetroError> {
    use tokio::runtime::Builder;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| MetroError::Download(format!("Failed to create tokio runtime: {}", e)))?;

    let fetcher = FeedFetcher::new()?;
    runtime.block_on(fetcher.fetch(seed_url, admin_areas_url))
}

/// Extract the first entry of a zip archive.
pub fn extract_first_entry(archive: &[u8]) -> Result<Vec<u8>, MetroError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| MetroError::Download(format!("invalid archive: {}", e)))?;
    if zip.is_empty() {
        return Err(MetroError::Download("archive has no entries".to_string()));
    }

    let mut entry = zip
        .by_index(0)
        .map_err(|e| MetroError::Download(format!("invalid archive entry: {}", e)))?;
    debug!("Extracting {} ({} bytes)", entry.name(), entry.size());

    let mut contents = Vec::new();
    entry.read_to_end(&mut contents)?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, body) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_first_entry() {
        let archive = zip_with(&[("cities15000.txt", "1\tA\n2\tB\n"), ("readme.txt", "ignored")]);
        assert_eq!(extract_first_entry(&archive).unwrap(), b"1\tA\n2\tB\n");
    }

    #[test]
    fn test_extract_empty_archive() {
        let archive = zip_with(&[]);
        assert!(matches!(extract_first_entry(&archive), Err(MetroError::Download(_))));
    }

    #[test]
    fn test_extract_garbage() {
        assert!(matches!(extract_first_entry(b"not a zip"), Err(MetroError::Download(_))));
    }
}
