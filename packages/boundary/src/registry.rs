//! Compile-time registry of boundary data sources.
//!
//! Each entry is a `(name, toml_content)` pair embedded via
//! `include_str!`. Adding a new area requires creating a TOML file in
//! `sources/` and adding a corresponding entry here.

use safety_map_boundary_models::BoundarySource;

/// Number of registered boundary sources. Updated when new sources
/// are added. Enforced by a test.
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 1;

/// Embedded TOML source definitions.
const SOURCE_TOMLS: &[(&str, &str)] = &[(
    "federal_district",
    include_str!("../sources/federal_district.toml"),
)];

/// Returns all registered boundary sources.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development
/// error and are caught during CI.
#[must_use]
pub fn all_sources() -> Vec<BoundarySource> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse boundary source '{name}': {e}"))
        })
        .collect()
}

/// Looks up a single source by its identifier.
#[must_use]
pub fn source_by_id(id: &str) -> Option<BoundarySource> {
    all_sources().into_iter().find(|source| source.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_sources() {
        let sources = all_sources();
        assert_eq!(
            sources.len(),
            EXPECTED_SOURCE_COUNT,
            "Expected {EXPECTED_SOURCE_COUNT} boundary sources, found {}. \
             Update EXPECTED_SOURCE_COUNT after adding/removing sources.",
            sources.len()
        );
    }

    #[test]
    fn source_ids_are_unique() {
        let sources = all_sources();
        let mut seen = BTreeSet::new();
        for source in &sources {
            assert!(
                seen.insert(&source.id),
                "Duplicate boundary source ID: {}",
                source.id
            );
        }
    }

    #[test]
    fn all_sources_have_required_fields() {
        for source in &all_sources() {
            assert!(!source.id.is_empty(), "Source has empty id");
            assert!(
                !source.endpoint.is_empty(),
                "Source {} has empty endpoint",
                source.id
            );
            assert!(
                !source.parent_area.is_empty(),
                "Source {} has empty parent area",
                source.id
            );
            assert!(
                !source.regions.is_empty(),
                "Source {} has no regions",
                source.id
            );
        }
    }

    #[test]
    fn region_names_are_unique_within_a_source() {
        for source in &all_sources() {
            let mut seen = BTreeSet::new();
            for region in &source.regions {
                assert!(
                    seen.insert(region),
                    "Source {} lists region '{region}' twice",
                    source.id
                );
            }
        }
    }

    #[test]
    fn federal_district_lists_26_regions() {
        let source = source_by_id("federal_district").unwrap();
        assert_eq!(source.regions.len(), 26);
        assert_eq!(source.regions[0], "Brasília");
    }
}
