//! Validates assembled rings into polygons.
//!
//! A ring only becomes catalog geometry if it is closed, passes the
//! `geo` validity predicate, and encloses a strictly positive area.
//! Exterior rings are normalized to counter-clockwise winding first,
//! so a valid polygon always carries a positive signed area.

use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, Coord, LineString, MultiPolygon, Polygon, Validation};
use safety_map_boundary_models::{Connectivity, Ring};

use crate::BoundaryError;

/// A region's validated geometry with its assembly quality.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGeometry {
    pub geometry: MultiPolygon<f64>,
    /// `Unverified` if any surviving component ring came from the
    /// fallback path.
    pub connectivity: Connectivity,
    /// Component rings dropped for failing validation.
    pub dropped: usize,
}

/// Builds a validated polygon from one closed ring.
///
/// # Errors
///
/// Returns [`BoundaryError::InvalidPolygon`] when the ring is not
/// closed, fails the `geo` validity predicate, or has no area.
pub fn build_polygon(ring: &Ring) -> Result<Polygon<f64>, BoundaryError> {
    if !ring.is_closed() {
        return Err(BoundaryError::InvalidPolygon {
            reason: "ring is not closed".to_string(),
        });
    }

    let exterior = LineString::new(
        ring.vertices
            .iter()
            .map(|v| Coord { x: v.lon, y: v.lat })
            .collect(),
    );
    let polygon = Polygon::new(exterior, vec![]).orient(Direction::Default);

    if !polygon.is_valid() {
        return Err(BoundaryError::InvalidPolygon {
            reason: "ring fails geometric validity".to_string(),
        });
    }
    if polygon.signed_area() <= 0.0 {
        return Err(BoundaryError::InvalidPolygon {
            reason: "ring encloses no area".to_string(),
        });
    }

    Ok(polygon)
}

/// Combines a region's component rings into a single geometry.
///
/// Components that individually fail validation are dropped and
/// counted; the rest form the region's `MultiPolygon`.
///
/// # Errors
///
/// Returns [`BoundaryError::InvalidPolygon`] when no component
/// survives validation; such a region is omitted from the catalog
/// rather than stored with corrupt geometry.
pub fn build_region_geometry(rings: &[Ring]) -> Result<RegionGeometry, BoundaryError> {
    let mut polygons = Vec::with_capacity(rings.len());
    let mut connectivity = Connectivity::Connected;
    let mut dropped = 0usize;

    for ring in rings {
        match build_polygon(ring) {
            Ok(polygon) => {
                polygons.push(polygon);
                if ring.connectivity == Connectivity::Unverified {
                    connectivity = Connectivity::Unverified;
                }
            }
            Err(err) => {
                log::debug!("Dropping ring component: {err}");
                dropped += 1;
            }
        }
    }

    if polygons.is_empty() {
        return Err(BoundaryError::InvalidPolygon {
            reason: format!("all {dropped} ring component(s) failed validation"),
        });
    }

    Ok(RegionGeometry {
        geometry: MultiPolygon(polygons),
        connectivity,
        dropped,
    })
}
