#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for region classification.
//!
//! Builds an R-tree over the catalog's region polygons and answers
//! point-in-region queries. This is the authoritative classifier for
//! the image labeling job; the hard-coded latitude/longitude
//! heuristic in [`heuristic`] survives only as a fallback for when no
//! catalog file exists yet.
//!
//! Queries are pure reads over the immutable index and safe to run
//! from any number of threads.

pub mod heuristic;

use geo::{Contains, Intersects, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};
use safety_map_catalog::RegionCatalog;

/// Containment semantics for points that lie exactly on a region
/// border.
///
/// The administrative source data never guarantees which side of a
/// shared border a boundary vertex belongs to, so the rule is a
/// construction-time choice rather than a hard-coded predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryRule {
    /// Strict interior: a point on the border matches no region.
    #[default]
    Exclusive,
    /// Interior or boundary: a point on the border matches the
    /// region(s) owning that border.
    Inclusive,
}

/// A region polygon stored in the R-tree with its metadata.
struct RegionEntry {
    name: String,
    /// Position in catalog order; classification ties break on the
    /// lowest value.
    order: usize,
    envelope: AABB<[f64; 2]>,
    geometry: MultiPolygon<f64>,
}

impl RTreeObject for RegionEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over a loaded region catalog.
///
/// Constructed once per catalog and shared across all consumers.
pub struct RegionIndex {
    tree: RTree<RegionEntry>,
    rule: BoundaryRule,
}

impl RegionIndex {
    /// Builds the index from a loaded catalog.
    #[must_use]
    pub fn new(catalog: &RegionCatalog, rule: BoundaryRule) -> Self {
        let entries: Vec<RegionEntry> = catalog
            .regions()
            .iter()
            .enumerate()
            .map(|(order, region)| RegionEntry {
                name: region.name.clone(),
                order,
                envelope: compute_envelope(&region.geometry),
                geometry: region.geometry.clone(),
            })
            .collect();

        log::info!("Built region index over {} region(s)", entries.len());

        Self {
            tree: RTree::bulk_load(entries),
            rule,
        }
    }

    /// Classifies a coordinate into a region name.
    ///
    /// Returns `None` ("unclassified") when no region contains the
    /// point; this is an expected outcome, never an error. When
    /// overlapping geometries both contain the point, the region
    /// earliest in catalog order wins.
    #[must_use]
    pub fn classify(&self, lat: f64, lon: f64) -> Option<&str> {
        let point = geo::Point::new(lon, lat);
        let query_env = AABB::from_point([lon, lat]);

        let mut best: Option<&RegionEntry> = None;
        for entry in self.tree.locate_in_envelope_intersecting(&query_env) {
            let inside = match self.rule {
                BoundaryRule::Exclusive => entry.geometry.contains(&point),
                BoundaryRule::Inclusive => entry.geometry.intersects(&point),
            };
            if !inside {
                continue;
            }
            match best {
                None => best = Some(entry),
                Some(current) if entry.order < current.order => best = Some(entry),
                _ => {}
            }
        }

        best.map(|entry| entry.name.as_str())
    }

    /// Number of indexed regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use safety_map_catalog::{Connectivity, Region};

    fn square(origin: (f64, f64), size: f64) -> MultiPolygon<f64> {
        let (x, y) = origin;
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + size, y),
                (x + size, y + size),
                (x, y + size),
                (x, y),
            ]),
            vec![],
        )])
    }

    fn region(name: &str, geometry: MultiPolygon<f64>) -> Region {
        Region {
            name: name.to_string(),
            geometry,
            connectivity: Connectivity::Connected,
        }
    }

    fn two_region_catalog() -> RegionCatalog {
        RegionCatalog::new(vec![
            region("A", square((0.0, 0.0), 1.0)),
            region("B", square((10.0, 10.0), 1.0)),
        ])
    }

    #[test]
    fn classifies_interior_points() {
        let index = RegionIndex::new(&two_region_catalog(), BoundaryRule::Exclusive);

        // classify(lat, lon); the squares are symmetric so the
        // center coordinates coincide either way.
        assert_eq!(index.classify(0.5, 0.5), Some("A"));
        assert_eq!(index.classify(10.5, 10.5), Some("B"));
    }

    #[test]
    fn unmatched_point_is_unclassified() {
        let index = RegionIndex::new(&two_region_catalog(), BoundaryRule::Exclusive);
        assert_eq!(index.classify(2.0, 2.0), None);
        assert_eq!(index.classify(5.0, 5.0), None);
    }

    #[test]
    fn overlap_resolves_to_catalog_order() {
        // Two identical squares: the first in catalog order wins.
        let catalog = RegionCatalog::new(vec![
            region("First", square((0.0, 0.0), 1.0)),
            region("Second", square((0.0, 0.0), 1.0)),
        ]);
        let index = RegionIndex::new(&catalog, BoundaryRule::Exclusive);

        assert_eq!(index.classify(0.5, 0.5), Some("First"));
    }

    #[test]
    fn boundary_rule_decides_edge_points() {
        let catalog = RegionCatalog::new(vec![region("A", square((0.0, 0.0), 1.0))]);

        let exclusive = RegionIndex::new(&catalog, BoundaryRule::Exclusive);
        let inclusive = RegionIndex::new(&catalog, BoundaryRule::Inclusive);

        // (lat 0.5, lon 0.0) lies exactly on the square's west edge.
        assert_eq!(exclusive.classify(0.5, 0.0), None);
        assert_eq!(inclusive.classify(0.5, 0.0), Some("A"));
    }

    #[test]
    fn empty_catalog_classifies_nothing() {
        let index = RegionIndex::new(&RegionCatalog::new(vec![]), BoundaryRule::Exclusive);
        assert!(index.is_empty());
        assert_eq!(index.classify(0.5, 0.5), None);
    }
}
