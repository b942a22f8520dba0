//! Resolve metros from a small GeoNames sample.
//!
//! Run with: cargo run --example resolve_sample

use world_metros::{generate_metros, ForcedMetro, MetroConfig, MetroLookup};

// id, name, latitude, longitude, country, admin1, population
const CITIES: &[(u64, &str, f64, f64, &str, &str, u64)] = &[
    (5368361, "Los Angeles", 34.0522, -118.2437, "US", "CA", 3_971_883),
    (5367929, "Long Beach", 33.7670, -118.1892, "US", "CA", 474_140),
    (5323810, "Anaheim", 33.8353, -117.9145, "US", "CA", 350_742),
    (5391811, "San Diego", 32.7157, -117.1647, "US", "CA", 1_394_928),
    (5336899, "Chula Vista", 32.6401, -117.0842, "US", "CA", 265_757),
    (5350937, "Fresno", 36.7477, -119.7724, "US", "CA", 520_052),
    (6167865, "Toronto", 43.7001, -79.4163, "CA", "08", 2_600_000),
    (6094817, "Ottawa", 45.4112, -75.6981, "CA", "08", 812_129),
];

const ADMIN_AREAS: &str = "CA.08\tOntario\tOntario\t6093943\n";

fn geonames_row(city: &(u64, &str, f64, f64, &str, &str, u64)) -> String {
    let (id, name, lat, lon, country, admin1, population) = city;
    format!(
        "{id}\t{name}\t{name}\t\t{lat}\t{lon}\tP\tPPL\t{country}\t\t{admin1}\t\t\t\t{population}\t\t0\tUTC\t2024-01-01"
    )
}

fn main() {
    let places: String = CITIES.iter().map(geonames_row).collect::<Vec<_>>().join("\n");

    println!("Metro Resolution Example\n");

    // 1. Default run: the most populous places win
    let config = MetroConfig::default();
    println!("1. Default ({:.0} km apart):", config.minimum_distance_meters / 1000.0);
    let run = generate_metros(places.as_bytes(), ADMIN_AREAS.as_bytes(), &config).unwrap();
    for metro in run.metros() {
        println!("   {} ({:?}, {}) pop {}", metro.name, metro.region, metro.country, metro.population);
    }
    println!("   {}\n", run.diagnostics.import);

    // 2. Forcing Long Beach clears Los Angeles
    let config = MetroConfig {
        forced_metros: vec![ForcedMetro::new("Long Beach", Some("CA"), "US")],
        ..MetroConfig::default()
    };
    println!("2. Forced metro {}:", config.forced_metros[0]);
    let run = generate_metros(places.as_bytes(), ADMIN_AREAS.as_bytes(), &config).unwrap();
    let names: Vec<&str> = run.metros().iter().map(|m| m.name.as_str()).collect();
    println!("   {}\n", names.join(", "));

    // 3. Nearest metro for an arbitrary point
    let lookup = MetroLookup::new(run.into_metros());
    println!("3. Nearest metro to Irvine (33.68, -117.83):");
    match lookup.nearest(33.6846, -117.8265) {
        Some((metro, meters)) => println!("   {} at {:.1} km", metro.name, meters / 1000.0),
        None => println!("   No metros"),
    }
}
