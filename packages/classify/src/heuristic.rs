//! Legacy latitude/longitude threshold heuristic.
//!
//! Approximates four Federal District regions with hard-coded
//! bounding conditions. This predates the polygon catalog and is kept
//! only as a fallback for callers that have no catalog file; once a
//! catalog exists, [`crate::RegionIndex`] is authoritative.

/// Approximates a region name from raw thresholds.
///
/// The conditions are evaluated in order and always produce a name;
/// points far outside the Federal District still map to one of the
/// four regions, which is exactly why this is a fallback and not a
/// classifier.
#[must_use]
pub fn approximate_region(lat: f64, lon: f64) -> &'static str {
    if lat < -15.78 && lon < -47.9 {
        "Ceilândia"
    } else if lat < -15.75 && lon < -48.0 {
        "Samambaia"
    } else if lat > -15.7 {
        "Plano Piloto"
    } else {
        "Taguatinga"
    }
}
