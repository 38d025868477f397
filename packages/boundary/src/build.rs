//! Catalog build orchestration.
//!
//! Runs the sequential per-region batch for one boundary source:
//! fetch segments, assemble rings, validate polygons, collect regions.
//! Every failure is local to its region; the batch always continues
//! and reports counts at the end. Persistence is the caller's final
//! step, once, for the whole catalog.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use safety_map_boundary_models::{BoundarySource, BuildReport, Connectivity};
use safety_map_catalog::Region;

use crate::progress::ProgressCallback;
use crate::{BoundaryError, chain, overpass, polygon};

/// Builds regions for every name in the source's region list.
///
/// The source's configured delay is enforced between regions to pace
/// requests against the boundary service. Returns the assembled
/// regions in source order together with the build counters; the
/// caller persists the catalog.
pub async fn build_catalog(
    client: &reqwest::Client,
    source: &BoundarySource,
    progress: &Arc<dyn ProgressCallback>,
) -> (Vec<Region>, BuildReport) {
    let total = source.regions.len();
    progress.set_total(u64::try_from(total).unwrap_or(u64::MAX));
    log::info!(
        "Building catalog for source '{}': {total} region(s)",
        source.id
    );

    let mut regions: Vec<Region> = Vec::with_capacity(total);
    let mut seen_names = BTreeSet::new();
    let mut report = BuildReport::default();

    for (index, name) in source.regions.iter().enumerate() {
        progress.set_message(format!("Fetching {name}"));

        if !seen_names.insert(name.clone()) {
            log::warn!("{name}: duplicate region name in source, skipping");
            report.duplicates += 1;
            progress.inc(1);
            continue;
        }

        match build_region(client, source, name).await {
            Ok((region, components_dropped)) => {
                if region.connectivity == Connectivity::Unverified {
                    log::warn!("{name}: assembled with unverified connectivity");
                    report.unverified += 1;
                }
                report.assembled += 1;
                report.components_dropped += components_dropped;
                regions.push(region);
            }
            Err(BoundaryError::InsufficientGeometry { reason }) => {
                log::warn!("{name}: skipped, insufficient geometry ({reason})");
                report.insufficient += 1;
            }
            Err(BoundaryError::InvalidPolygon { reason }) => {
                log::warn!("{name}: dropped, invalid polygon ({reason})");
                report.invalid += 1;
            }
            Err(err) => {
                // Network and payload failures degrade to a missing
                // segment set for this region; the batch continues.
                log::warn!("{name}: fetch failed ({err}), skipping");
                report.insufficient += 1;
            }
        }

        progress.inc(1);
        if index + 1 < total {
            tokio::time::sleep(Duration::from_millis(source.request_delay_ms)).await;
        }
    }

    log::info!(
        "Catalog build for '{}' finished: {} assembled ({} unverified), \
         {} insufficient, {} invalid, {} duplicate(s), {} component(s) dropped",
        source.id,
        report.assembled,
        report.unverified,
        report.insufficient,
        report.invalid,
        report.duplicates,
        report.components_dropped,
    );
    progress.finish(format!(
        "{} of {total} region(s) assembled",
        report.assembled
    ));

    (regions, report)
}

/// Fetches and assembles a single region. Returns the region plus the
/// number of ring components dropped during validation.
async fn build_region(
    client: &reqwest::Client,
    source: &BoundarySource,
    name: &str,
) -> Result<(Region, usize), BoundaryError> {
    let store = overpass::fetch_region_segments(client, source, name).await?;
    log::debug!("{name}: fetched {} segment(s)", store.len());

    let rings = chain::assemble_rings(&store)?;
    let geometry = polygon::build_region_geometry(&rings)?;
    if geometry.dropped > 0 {
        log::warn!(
            "{name}: dropped {} invalid ring component(s)",
            geometry.dropped
        );
    }

    Ok((
        Region {
            name: name.to_string(),
            geometry: geometry.geometry,
            connectivity: geometry.connectivity,
        },
        geometry.dropped,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::null_progress;

    /// A source whose endpoint refuses connections, so every fetch
    /// fails immediately without leaving the machine.
    fn unreachable_source(regions: Vec<String>) -> BoundarySource {
        BoundarySource {
            id: "test".to_string(),
            name: "Test source".to_string(),
            endpoint: "http://127.0.0.1:1/api/interpreter".to_string(),
            parent_area: "Nowhere".to_string(),
            parent_admin_level: 4,
            region_admin_level: 8,
            request_delay_ms: 0,
            regions,
        }
    }

    #[tokio::test]
    async fn duplicate_region_names_are_counted() {
        let source = unreachable_source(vec!["Gama".to_string(), "Gama".to_string()]);
        let progress = null_progress();

        let (regions, report) =
            build_catalog(&reqwest::Client::new(), &source, &progress).await;

        assert!(regions.is_empty());
        // First occurrence failed its fetch, second never got one.
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.insufficient, 1);
        assert_eq!(report.assembled, 0);
    }

    #[tokio::test]
    async fn fetch_failures_never_abort_the_batch() {
        let source = unreachable_source(vec![
            "Gama".to_string(),
            "Taguatinga".to_string(),
            "Ceilândia".to_string(),
        ]);
        let progress = null_progress();

        let (regions, report) =
            build_catalog(&reqwest::Client::new(), &source, &progress).await;

        assert!(regions.is_empty());
        assert_eq!(report.insufficient, 3);
        assert_eq!(report.invalid, 0);
    }
}
