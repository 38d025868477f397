#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary assembly.
//!
//! Fetches fragmented boundary way segments from an Overpass endpoint,
//! chains them into closed rings, validates the rings into polygons,
//! and drives the per-source catalog build. Sources are defined as
//! TOML files embedded at compile time, following the same registry
//! pattern as the classification data sources.

pub mod build;
pub mod chain;
pub mod overpass;
pub mod polygon;
pub mod progress;
pub mod registry;

use thiserror::Error;

/// Errors that can occur during boundary assembly.
///
/// All variants are local to a single region; the catalog build loop
/// logs them and continues with the next region.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The boundary service answered with a non-success status or a
    /// payload missing the expected structure.
    #[error("Boundary fetch error: {message}")]
    Fetch {
        /// Description of what went wrong.
        message: String,
    },

    /// Fewer than two usable segments, or no ring long enough to
    /// form a polygon.
    #[error("Insufficient boundary geometry: {reason}")]
    InsufficientGeometry {
        /// Why the segments could not form a ring.
        reason: String,
    },

    /// A closed ring failed geometric validation.
    #[error("Invalid polygon: {reason}")]
    InvalidPolygon {
        /// Which validity check failed.
        reason: String,
    },
}
