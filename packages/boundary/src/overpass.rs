//! Overpass API boundary fetcher.
//!
//! Resolves a region's administrative boundary relation inside the
//! source's parent area, then fetches the geometry of the relation's
//! `outer` way members. Two round-trips per region, mirroring the
//! boundary service's relation/way split.
//!
//! Network retries and timeouts are `reqwest`'s concern; this module
//! only maps non-success statuses and malformed payloads to
//! [`BoundaryError::Fetch`].

use safety_map_boundary_models::{BoundaryRole, BoundarySource, Segment, SegmentStore, Vertex, WayId};

use crate::BoundaryError;

/// Fetches the outer boundary segments for one named region.
///
/// An empty result is not an error here: the caller treats a store
/// with too few segments as insufficient geometry for that region.
///
/// # Errors
///
/// Returns [`BoundaryError`] if an HTTP request fails or a response
/// is not the expected Overpass JSON shape.
pub async fn fetch_region_segments(
    client: &reqwest::Client,
    source: &BoundarySource,
    region: &str,
) -> Result<SegmentStore, BoundaryError> {
    let way_ids = fetch_outer_way_ids(client, source, region).await?;
    if way_ids.is_empty() {
        log::warn!("{region}: no outer boundary ways found");
        return Ok(SegmentStore::new());
    }

    fetch_way_geometries(client, &source.endpoint, &way_ids).await
}

/// Queries the administrative relation for `region` and returns the
/// ids of its `outer` way members.
async fn fetch_outer_way_ids(
    client: &reqwest::Client,
    source: &BoundarySource,
    region: &str,
) -> Result<Vec<WayId>, BoundaryError> {
    let query = format!(
        "[out:json][timeout:60];\n\
         area[\"name\"=\"{parent}\"][admin_level={parent_level}]->.parent;\n\
         rel[\"boundary\"=\"administrative\"][\"admin_level\"=\"{region_level}\"][\"name\"=\"{region}\"](area.parent);\n\
         out body;",
        parent = source.parent_area,
        parent_level = source.parent_admin_level,
        region_level = source.region_admin_level,
    );

    let json = post_query(client, &source.endpoint, &query).await?;
    let elements = json["elements"]
        .as_array()
        .ok_or_else(|| BoundaryError::Fetch {
            message: "no elements array in relation response".to_string(),
        })?;

    let mut way_ids = Vec::new();
    for element in elements {
        if element["type"].as_str() != Some("relation") {
            continue;
        }
        let Some(members) = element["members"].as_array() else {
            continue;
        };
        for member in members {
            if member["type"].as_str() != Some("way") {
                continue;
            }
            match member["role"].as_str() {
                Some("outer") => {
                    if let Some(way_id) = member["ref"].as_i64() {
                        way_ids.push(way_id);
                    }
                }
                role => {
                    log::debug!("{region}: ignoring member with role {role:?}");
                }
            }
        }
        // The first matching relation is the region's boundary.
        if !way_ids.is_empty() {
            break;
        }
    }

    Ok(way_ids)
}

/// Fetches vertex lists for the given ways and builds the segment
/// store. Ways with fewer than 2 vertices are skipped.
async fn fetch_way_geometries(
    client: &reqwest::Client,
    endpoint: &str,
    way_ids: &[WayId],
) -> Result<SegmentStore, BoundaryError> {
    let id_list = way_ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let query = format!("[out:json][timeout:60];\nway(id:{id_list});\nout geom;");

    let json = post_query(client, endpoint, &query).await?;
    let elements = json["elements"]
        .as_array()
        .ok_or_else(|| BoundaryError::Fetch {
            message: "no elements array in way geometry response".to_string(),
        })?;

    let mut store = SegmentStore::new();
    for element in elements {
        if element["type"].as_str() != Some("way") {
            continue;
        }
        let Some(id) = element["id"].as_i64() else {
            continue;
        };
        let Some(geometry) = element["geometry"].as_array() else {
            continue;
        };

        let vertices: Vec<Vertex> = geometry
            .iter()
            .filter_map(|point| {
                Some(Vertex::new(
                    point["lon"].as_f64()?,
                    point["lat"].as_f64()?,
                ))
            })
            .collect();

        if vertices.len() < 2 {
            log::debug!("Way {id}: skipping {}-vertex geometry", vertices.len());
            continue;
        }

        store.insert(
            id,
            Segment {
                id,
                role: BoundaryRole::Outer,
                vertices,
            },
        );
    }

    Ok(store)
}

/// Posts an Overpass QL query as form data and parses the JSON reply.
async fn post_query(
    client: &reqwest::Client,
    endpoint: &str,
    query: &str,
) -> Result<serde_json::Value, BoundaryError> {
    let resp = client
        .post(endpoint)
        .form(&[("data", query)])
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(BoundaryError::Fetch {
            message: format!("Overpass request failed with status {}", resp.status()),
        });
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| BoundaryError::Fetch {
        message: format!("Failed to parse Overpass response: {e}"),
    })
}
