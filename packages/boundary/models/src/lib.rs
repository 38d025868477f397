#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary data types.
//!
//! Defines the raw way-segment types returned by the boundary query
//! service, the ring type produced by chain assembly, and the TOML
//! schema for boundary source definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// OSM way identifier, unique within one fetch batch.
pub type WayId = i64;

/// A geographic vertex in EPSG:4326 (longitude, latitude) order.
///
/// Segment connection uses exact coordinate equality: the boundary
/// query service returns shared endpoints bit-identically, so no
/// tolerance is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub lon: f64,
    pub lat: f64,
}

impl Vertex {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Bit-level key for endpoint adjacency indexing. `f64` is not
    /// `Ord`/`Hash`, so the raw IEEE bits stand in.
    #[must_use]
    pub const fn key(self) -> (u64, u64) {
        (self.lon.to_bits(), self.lat.to_bits())
    }
}

/// Role of a way within a boundary relation.
///
/// Only `Outer` ways participate in ring assembly; the source data
/// never supplies inner rings, but the role is kept so unexpected
/// members can be reported instead of silently merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRole {
    Outer,
    Inner,
    Other,
}

/// An open polyline fragment of an administrative boundary, as
/// returned by the boundary query service. Immutable once fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: WayId,
    pub role: BoundaryRole,
    /// Ordered vertex list, length >= 2.
    pub vertices: Vec<Vertex>,
}

/// Raw segments for one region, keyed by way id.
///
/// `BTreeMap` iteration order gives the deterministic lowest-id start
/// and ascending-id scan that ring assembly relies on.
pub type SegmentStore = BTreeMap<WayId, Segment>;

/// Whether a ring's segment-to-segment connectivity was verified
/// during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Every segment chained endpoint-to-endpoint; the ring is the
    /// true boundary.
    Connected,
    /// Fallback concatenation without connectivity checks; the ring
    /// is a best-effort approximation and downstream consumers must
    /// treat it as lower confidence.
    Unverified,
}

/// One segment's contribution to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentUse {
    pub id: WayId,
    /// The segment's vertices were appended in reverse order.
    pub reversed: bool,
}

/// A closed exterior ring assembled from segments.
///
/// On success `vertices.first() == vertices.last()` and the ring has
/// at least 4 vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub vertices: Vec<Vertex>,
    pub connectivity: Connectivity,
    /// Which segments contributed, in chain order.
    pub provenance: Vec<SegmentUse>,
}

impl Ring {
    /// Whether the first and last vertices coincide.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => first == last,
            _ => false,
        }
    }
}

/// Counters accumulated over one catalog build run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Regions assembled into a valid geometry.
    pub assembled: usize,
    /// Regions skipped: no usable segments or every ring too short.
    pub insufficient: usize,
    /// Regions dropped: no ring survived polygon validation.
    pub invalid: usize,
    /// Assembled regions containing at least one unverified ring.
    pub unverified: usize,
    /// Region names listed more than once in the source; only the
    /// first occurrence is built.
    pub duplicates: usize,
    /// Individual ring components dropped during polygon validation
    /// for regions that were still assembled.
    pub components_dropped: usize,
}

/// A boundary data source, deserialized from TOML.
///
/// Each source defines how to fetch administrative region boundaries
/// for one parent area from an Overpass endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundarySource {
    /// Unique source identifier (e.g., `"federal_district"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Overpass API interpreter endpoint.
    pub endpoint: String,
    /// Name of the enclosing administrative area.
    pub parent_area: String,
    /// Admin level of the enclosing area (e.g., 4 for a state).
    pub parent_admin_level: u8,
    /// Admin level of the regions to fetch (e.g., 8).
    pub region_admin_level: u8,
    /// Pause between per-region requests, to respect the endpoint's
    /// rate limits. No retry/backoff beyond this pacing.
    pub request_delay_ms: u64,
    /// Ordered region names; catalog order follows this list.
    pub regions: Vec<String>,
}
