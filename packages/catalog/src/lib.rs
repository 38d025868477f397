#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region catalog persistence.
//!
//! A catalog is the set of (region name, polygon) pairs produced by a
//! boundary build run, serialized as a `GeoJSON` `FeatureCollection`
//! (one feature per region, `name` property, WGS84 lon/lat order).
//! Catalogs are written once, whole, at the end of a build and loaded
//! read-only for classification; a refresh writes a new file rather
//! than editing one in place.

use std::path::Path;

use geo::{Area, MultiPolygon, Validation};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use thiserror::Error;

pub use safety_map_boundary_models::Connectivity;

/// Errors that can occur reading or writing a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Filesystem read/write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    Geojson(#[from] geojson::Error),

    /// Structurally unexpected catalog content.
    #[error("Catalog format error: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },
}

/// A named administrative region with its exterior geometry.
///
/// Regions with several disjoint boundary components carry all of
/// them in one [`MultiPolygon`]; single-component regions are a
/// one-element multi-polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Administrative region label, unique within a catalog.
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    /// `Unverified` when any component ring came from the fallback
    /// concatenation path.
    pub connectivity: Connectivity,
}

/// An ordered, immutable collection of regions loaded from a catalog
/// file. Classification ties break on this order.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    skipped: usize,
}

impl RegionCatalog {
    /// Wraps freshly built regions (nothing filtered).
    #[must_use]
    pub const fn new(regions: Vec<Region>) -> Self {
        Self {
            regions,
            skipped: 0,
        }
    }

    /// Regions in catalog order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Number of features excluded at load time for null or invalid
    /// geometry.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Names of all regions with usable geometry, in catalog order.
    #[must_use]
    pub fn region_names(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Serializes regions to a `GeoJSON` `FeatureCollection` file.
///
/// One feature per region: `name` property, Polygon/`MultiPolygon`
/// geometry, and `unverified: true` on regions built from fallback
/// rings. The CRS is declared as EPSG:4326.
///
/// The file is written in a single call once the whole collection is
/// serialized; an interrupted build leaves no partial catalog.
///
/// # Errors
///
/// Returns [`CatalogError`] if serialization or the filesystem write
/// fails.
pub fn write_catalog(path: &Path, regions: &[Region]) -> Result<(), CatalogError> {
    let features = regions.iter().map(region_to_feature).collect();

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(crs_member()),
    };

    let body = serde_json::to_string(&GeoJson::FeatureCollection(collection))?;
    std::fs::write(path, body)?;

    log::info!("Wrote {} regions to {}", regions.len(), path.display());
    Ok(())
}

/// Loads a catalog file for classification.
///
/// Features with a missing/empty `name`, null geometry, a non-areal
/// geometry type, or a polygon that fails validation are filtered out
/// and counted, never surfaced as errors: a region that could not be
/// reconstructed is simply absent from classification.
///
/// # Errors
///
/// Returns [`CatalogError`] if the file cannot be read or is not a
/// `GeoJSON` `FeatureCollection`.
pub fn load_catalog(path: &Path) -> Result<RegionCatalog, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(CatalogError::Format {
            message: format!("{} is not a GeoJSON FeatureCollection", path.display()),
        });
    };

    let total = collection.features.len();
    let mut regions = Vec::with_capacity(total);
    let mut skipped = 0usize;

    for feature in collection.features {
        match feature_to_region(feature) {
            Some(region) => regions.push(region),
            None => skipped += 1,
        }
    }

    log::info!(
        "Loaded {} regions from {} ({skipped} feature(s) skipped)",
        regions.len(),
        path.display()
    );

    Ok(RegionCatalog { regions, skipped })
}

fn region_to_feature(region: &Region) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), JsonValue::from(region.name.clone()));
    if region.connectivity == Connectivity::Unverified {
        properties.insert("unverified".to_string(), JsonValue::from(true));
    }

    // Single-component regions serialize as a plain Polygon, matching
    // what the boundary sources publish themselves.
    let value = if region.geometry.0.len() == 1 {
        geojson::Value::from(&region.geometry.0[0])
    } else {
        geojson::Value::from(&region.geometry)
    };

    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn feature_to_region(feature: Feature) -> Option<Region> {
    let properties = feature.properties?;

    let name = properties
        .get("name")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    let unverified = properties
        .get("unverified")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);

    let geometry = feature.geometry?;
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    let multi_polygon = match geo_geom {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
        _ => {
            log::warn!("Region '{name}' has a non-areal geometry, skipping");
            return None;
        }
    };

    if !multi_polygon.is_valid() || multi_polygon.unsigned_area() <= 0.0 {
        log::warn!("Region '{name}' has invalid geometry, skipping");
        return None;
    }

    Some(Region {
        name,
        geometry: multi_polygon,
        connectivity: if unverified {
            Connectivity::Unverified
        } else {
            Connectivity::Connected
        },
    })
}

/// `crs` foreign member declaring EPSG:4326 (WGS84 lon/lat).
fn crs_member() -> JsonObject {
    let mut crs = JsonObject::new();
    crs.insert(
        "crs".to_string(),
        serde_json::json!({
            "type": "name",
            "properties": { "name": "urn:ogc:def:crs:EPSG::4326" },
        }),
    );
    crs
}
