use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use world_metros::{export_metros, generate_metros, MetroConfig, MetroLookup, MetroRun, MetroTable};

const DEFAULT_SEED_URL: &str = "http://download.geonames.org/export/dump/cities15000.zip";
const DEFAULT_ADMIN_AREAS_URL: &str = "http://download.geonames.org/export/dump/admin1CodesASCII.txt";

/// Reduce the GeoNames city catalog to a set of well-separated metros.
///
/// Examples:
///   world-metros generate
///   world-metros generate --config metros.config.json --overwrite-data
///   world-metros generate --cities cities15000.txt --admin-areas admin1CodesASCII.txt
///   world-metros export metros.ts
///   world-metros nearest --lat 33.77 --lon -118.19
#[derive(Parser)]
#[command(name = "world-metros", version, about, long_about = None)]
struct Cli {
    /// JSON settings file (resolution config, feed URLs, metro table path).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the metro table from the GeoNames feeds.
    Generate {
        /// Replace an existing metro table.
        #[arg(long)]
        overwrite_data: bool,

        /// Local city dump instead of downloading one.
        #[arg(long)]
        cities: Option<PathBuf>,

        /// Local admin-area list. Only used together with --cities.
        #[arg(long)]
        admin_areas: Option<PathBuf>,
    },

    /// Export the metro table as JSON, JavaScript or TypeScript.
    Export {
        /// Target file; the extension picks the format.
        #[arg(default_value = "export.js")]
        file: PathBuf,
    },

    /// Print the metro nearest to a coordinate.
    Nearest {
        /// Latitude (-90 to 90).
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude (-180 to 180).
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

/// Settings file contents. Every field is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct Settings {
    #[serde(flatten)]
    metro: MetroConfig,
    seed_url: String,
    admin_areas_url: String,
    metro_table: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metro: MetroConfig::default(),
            seed_url: DEFAULT_SEED_URL.to_string(),
            admin_areas_url: DEFAULT_ADMIN_AREAS_URL.to_string(),
            metro_table: PathBuf::from("metros.json"),
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading settings {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))?
        }
        None => Settings::default(),
    };
    settings.metro.validate()?;
    Ok(settings)
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(cli) {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Generate {
            overwrite_data,
            cities,
            admin_areas,
        } => generate(&settings, overwrite_data, cities.as_deref(), admin_areas.as_deref()),
        Command::Export { file } => export(&settings, &file),
        Command::Nearest { lat, lon } => nearest(&settings, lat, lon),
    }
}

// ── generate ────────────────────────────────────────────────────

fn generate(settings: &Settings, overwrite: bool, cities: Option<&Path>, admin_areas: Option<&Path>) -> Result<()> {
    let table = MetroTable::provision(&settings.metro_table, overwrite)?;

    let run = match cities {
        Some(cities) => {
            let admin_areas: Box<dyn BufRead> = match admin_areas {
                Some(path) => Box::new(open(path)?),
                None => Box::new(io::empty()),
            };
            generate_metros(open(cities)?, admin_areas, &settings.metro)?
        }
        None => generate_from_feeds(settings)?,
    };

    let metros: Vec<_> = run.metros().into_iter().cloned().collect();
    table.write(&metros)?;
    print_summary(&run, table.path());
    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(BufReader::new(file))
}

#[cfg(feature = "http")]
fn generate_from_feeds(settings: &Settings) -> Result<MetroRun> {
    let feeds = world_metros::http::fetch_feeds_blocking(&settings.seed_url, &settings.admin_areas_url)?;
    Ok(generate_metros(&feeds.places[..], &feeds.admin_areas[..], &settings.metro)?)
}

#[cfg(not(feature = "http"))]
fn generate_from_feeds(settings: &Settings) -> Result<MetroRun> {
    bail!(
        "built without the `http` feature, cannot download {}; pass --cities instead",
        settings.seed_url
    )
}

fn print_summary(run: &MetroRun, table: &Path) {
    let diagnostics = &run.diagnostics;
    println!("{}", diagnostics.import);
    println!(
        "  skipped: {} non-populated, {} below population",
        diagnostics.import.non_populated, diagnostics.import.below_population
    );
    println!("{} metros ({} forced) written to {}", diagnostics.metros, diagnostics.forced, table.display());
    for spec in &diagnostics.unmatched_forced {
        println!("  forced metro not found: {}", spec);
    }
}

// ── export ──────────────────────────────────────────────────────

fn export(settings: &Settings, file: &Path) -> Result<()> {
    let metros = MetroTable::open(&settings.metro_table)?.read()?;
    let written = export_metros(&metros, file).with_context(|| format!("exporting to {}", file.display()))?;
    println!("{} metros exported to {}", written, file.display());
    Ok(())
}

// ── nearest ─────────────────────────────────────────────────────

fn nearest(settings: &Settings, lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("coordinate out of range: {}, {}", lat, lon);
    }

    let lookup = MetroLookup::new(MetroTable::open(&settings.metro_table)?.read()?);
    match lookup.nearest(lat, lon) {
        Some((metro, meters)) => {
            let region = metro.region.as_deref().map(|r| format!(", {}", r)).unwrap_or_default();
            println!(
                "{}{}, {} ({:.1} km, population {})",
                metro.name,
                region,
                metro.country,
                meters / 1000.0,
                metro.population
            );
        }
        None => println!("The metro table is empty"),
    }
    Ok(())
}
