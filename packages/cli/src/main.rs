#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the region boundary toolchain.
//!
//! `build-catalog` runs the sequential boundary fetch/assembly batch
//! for a configured source and writes the resulting `GeoJSON` catalog;
//! `classify` answers point-in-region queries against a catalog file,
//! falling back to the legacy threshold heuristic when no catalog
//! exists yet.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use safety_map_boundary::build::build_catalog;
use safety_map_boundary::registry::{all_sources, source_by_id};
use safety_map_catalog::{load_catalog, write_catalog};
use safety_map_classify::{BoundaryRule, RegionIndex, heuristic};
use safety_map_cli_utils::IndicatifProgress;

#[derive(Parser)]
#[command(name = "safety_map_cli", about = "Region boundary catalog tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a region catalog from a configured boundary source
    BuildCatalog {
        /// Boundary source identifier (e.g., `"federal_district"`)
        #[arg(long, default_value = "federal_district")]
        source: String,
        /// Output catalog file. A rebuild should target a new path
        /// and swap it in; the file is only written once the whole
        /// batch has finished.
        #[arg(long, default_value = "regions.geojson")]
        output: PathBuf,
    },
    /// Classify a coordinate into an administrative region
    #[command(allow_negative_numbers = true)]
    Classify {
        /// Catalog file produced by `build-catalog`
        #[arg(long, default_value = "regions.geojson")]
        catalog: PathBuf,
        /// Latitude of the query point
        lat: f64,
        /// Longitude of the query point
        lon: f64,
        /// Count points lying exactly on a region border as inside
        #[arg(long)]
        include_boundary: bool,
    },
    /// List the regions with usable geometry in a catalog
    Regions {
        /// Catalog file produced by `build-catalog`
        #[arg(long, default_value = "regions.geojson")]
        catalog: PathBuf,
    },
    /// List configured boundary sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = safety_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::BuildCatalog { source, output } => {
            let Some(source) = source_by_id(&source) else {
                let sources = all_sources();
                let available: Vec<&str> =
                    sources.iter().map(|s| s.id.as_str()).collect();
                return Err(format!(
                    "Unknown boundary source '{source}'. Available: {}",
                    available.join(", ")
                )
                .into());
            };

            let client = reqwest::Client::new();
            let progress = IndicatifProgress::regions_bar(&multi);
            let (regions, report) = build_catalog(&client, &source, &progress).await;

            if regions.is_empty() {
                return Err("No regions could be assembled; catalog not written".into());
            }
            write_catalog(&output, &regions)?;

            println!(
                "{} region(s) written to {} ({} unverified, {} insufficient, {} invalid)",
                report.assembled,
                output.display(),
                report.unverified,
                report.insufficient,
                report.invalid,
            );
        }
        Commands::Classify {
            catalog,
            lat,
            lon,
            include_boundary,
        } => {
            if catalog.exists() {
                let rule = if include_boundary {
                    BoundaryRule::Inclusive
                } else {
                    BoundaryRule::Exclusive
                };
                let index = RegionIndex::new(&load_catalog(&catalog)?, rule);
                match index.classify(lat, lon) {
                    Some(name) => println!("{name}"),
                    None => println!("unclassified"),
                }
            } else {
                // No catalog yet: fall back to the legacy threshold
                // heuristic, which only approximates four regions.
                log::warn!(
                    "Catalog {} not found, using threshold heuristic",
                    catalog.display()
                );
                println!("{}", heuristic::approximate_region(lat, lon));
            }
        }
        Commands::Regions { catalog } => {
            let loaded = load_catalog(&catalog)?;
            for name in loaded.region_names() {
                println!("{name}");
            }
            if loaded.skipped() > 0 {
                log::warn!(
                    "{} feature(s) with null or invalid geometry were skipped",
                    loaded.skipped()
                );
            }
        }
        Commands::Sources => {
            for source in all_sources() {
                println!(
                    "{}: {} ({} regions, admin level {})",
                    source.id,
                    source.name,
                    source.regions.len(),
                    source.region_admin_level
                );
            }
        }
    }

    Ok(())
}
