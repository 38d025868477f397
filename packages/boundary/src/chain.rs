//! Chains boundary way segments into closed rings.
//!
//! The boundary service returns a region's exterior as an unordered
//! set of open polyline fragments. This module reconstructs closed
//! rings from them: an endpoint adjacency index splits the segments
//! into connected components, then each component is walked as a
//! deterministic greedy chain (lowest-id start, first-fit matching in
//! ascending id order).
//!
//! A component whose walk consumes every segment and ends where it
//! started yields a [`Connectivity::Connected`] ring. Anything else
//! degrades to a force-closed, explicitly [`Connectivity::Unverified`]
//! ring so downstream consumers can tell reconstructed geometry from
//! approximated geometry.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use safety_map_boundary_models::{
    BoundaryRole, Connectivity, Ring, Segment, SegmentStore, SegmentUse, Vertex, WayId,
};

use crate::BoundaryError;

/// A closed ring needs at least a triangle plus the repeated closing
/// vertex.
const MIN_RING_VERTICES: usize = 4;

/// Assembles closed rings from a region's segment store.
///
/// Produces one ring per connected component, ordered by each
/// component's lowest way id. Rings shorter than 4 vertices are
/// dropped.
///
/// # Errors
///
/// Returns [`BoundaryError::InsufficientGeometry`] when fewer than two
/// usable outer segments are supplied, or when every component ring is
/// too short to form a polygon.
pub fn assemble_rings(store: &SegmentStore) -> Result<Vec<Ring>, BoundaryError> {
    let outer: BTreeMap<WayId, &Segment> = store
        .iter()
        .filter(|(_, segment)| {
            segment.role == BoundaryRole::Outer && segment.vertices.len() >= 2
        })
        .map(|(id, segment)| (*id, segment))
        .collect();

    if outer.len() < 2 {
        return Err(BoundaryError::InsufficientGeometry {
            reason: format!("{} usable outer segment(s), need at least 2", outer.len()),
        });
    }

    let mut rings = Vec::new();
    let mut dropped = 0usize;

    for component in connected_components(&outer) {
        let ring = walk_component(&component, &outer);
        if ring.vertices.len() < MIN_RING_VERTICES {
            log::debug!(
                "Dropping {}-vertex ring from segments {:?}",
                ring.vertices.len(),
                component
            );
            dropped += 1;
        } else {
            rings.push(ring);
        }
    }

    if rings.is_empty() {
        return Err(BoundaryError::InsufficientGeometry {
            reason: format!("all {dropped} component ring(s) shorter than 4 vertices"),
        });
    }

    Ok(rings)
}

/// Groups segments into connected components by shared endpoints.
///
/// Components come out ordered by their lowest way id, with ids
/// sorted ascending inside each component.
fn connected_components(segments: &BTreeMap<WayId, &Segment>) -> Vec<Vec<WayId>> {
    // Endpoint -> ids of segments touching it.
    let mut touching: BTreeMap<(u64, u64), Vec<WayId>> = BTreeMap::new();
    for (&id, segment) in segments {
        for vertex in endpoint_pair(segment) {
            touching.entry(vertex.key()).or_default().push(id);
        }
    }

    let mut unassigned: BTreeSet<WayId> = segments.keys().copied().collect();
    let mut components = Vec::new();

    while let Some(&seed) = unassigned.iter().next() {
        unassigned.remove(&seed);
        let mut component = vec![seed];
        let mut queue = VecDeque::from([seed]);

        while let Some(id) = queue.pop_front() {
            let Some(segment) = segments.get(&id) else {
                continue;
            };
            for vertex in endpoint_pair(segment) {
                let Some(neighbors) = touching.get(&vertex.key()) else {
                    continue;
                };
                for &neighbor in neighbors {
                    if unassigned.remove(&neighbor) {
                        component.push(neighbor);
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        component.sort_unstable();
        components.push(component);
    }

    components
}

fn endpoint_pair(segment: &Segment) -> [Vertex; 2] {
    // Callers guarantee >= 2 vertices.
    [segment.vertices[0], segment.vertices[segment.vertices.len() - 1]]
}

/// Walks one component as a greedy chain.
///
/// First-fit: the scan stops at the first unused segment whose first
/// or last vertex matches the chain's tail, so identical input always
/// produces an identical ring.
fn walk_component(ids: &[WayId], segments: &BTreeMap<WayId, &Segment>) -> Ring {
    let start = ids[0];
    let Some(seed) = segments.get(&start) else {
        // ids came from `segments`' own keys.
        return fallback_ring(ids, segments);
    };

    let mut vertices = seed.vertices.clone();
    let mut provenance = vec![SegmentUse {
        id: start,
        reversed: false,
    }];
    let mut used = BTreeSet::from([start]);

    while used.len() < ids.len() {
        let Some(&tail) = vertices.last() else {
            break;
        };

        let mut matched = false;
        for &id in ids {
            if used.contains(&id) {
                continue;
            }
            let Some(segment) = segments.get(&id) else {
                continue;
            };
            let first = segment.vertices[0];
            let last = segment.vertices[segment.vertices.len() - 1];

            if first == tail {
                vertices.extend_from_slice(&segment.vertices[1..]);
                provenance.push(SegmentUse {
                    id,
                    reversed: false,
                });
            } else if last == tail {
                let len = segment.vertices.len();
                vertices.extend(segment.vertices[..len - 1].iter().rev().copied());
                provenance.push(SegmentUse { id, reversed: true });
            } else {
                continue;
            }

            used.insert(id);
            matched = true;
            break;
        }

        if !matched {
            // The walk stalled with segments left over: the component
            // branches or the chain picked a wrong turn. Approximate
            // instead of claiming connectivity.
            return fallback_ring(ids, segments);
        }
    }

    if vertices.first() == vertices.last() {
        return Ring {
            vertices,
            connectivity: Connectivity::Connected,
            provenance,
        };
    }

    // Every segment chained but the loop never closed (e.g. one
    // boundary way missing upstream). Force-close and flag it.
    if let Some(&first) = vertices.first() {
        vertices.push(first);
    }
    Ring {
        vertices,
        connectivity: Connectivity::Unverified,
        provenance,
    }
}

/// Best-effort ring for a component that would not chain: concatenate
/// the segment vertex lists in ascending id order, dropping each
/// segment's final vertex, then force-close.
fn fallback_ring(ids: &[WayId], segments: &BTreeMap<WayId, &Segment>) -> Ring {
    let mut vertices = Vec::new();
    let mut provenance = Vec::with_capacity(ids.len());

    for &id in ids {
        let Some(segment) = segments.get(&id) else {
            continue;
        };
        let len = segment.vertices.len();
        vertices.extend_from_slice(&segment.vertices[..len - 1]);
        provenance.push(SegmentUse {
            id,
            reversed: false,
        });
    }

    if let Some(&first) = vertices.first()
        && vertices.last() != Some(&first)
    {
        vertices.push(first);
    }

    Ring {
        vertices,
        connectivity: Connectivity::Unverified,
        provenance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: WayId, points: &[(f64, f64)]) -> (WayId, Segment) {
        (
            id,
            Segment {
                id,
                role: BoundaryRole::Outer,
                vertices: points.iter().map(|&(lon, lat)| Vertex::new(lon, lat)).collect(),
            },
        )
    }

    fn store(segments: Vec<(WayId, Segment)>) -> SegmentStore {
        segments.into_iter().collect()
    }

    /// Four segments forming a unit square, each sharing one endpoint
    /// with each neighbor.
    fn unit_square_store() -> SegmentStore {
        store(vec![
            segment(1, &[(0.0, 0.0), (1.0, 0.0)]),
            segment(2, &[(1.0, 0.0), (1.0, 1.0)]),
            segment(3, &[(1.0, 1.0), (0.0, 1.0)]),
            segment(4, &[(0.0, 1.0), (0.0, 0.0)]),
        ])
    }

    #[test]
    fn chains_square_into_connected_ring() {
        let rings = assemble_rings(&unit_square_store()).unwrap();

        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring.connectivity, Connectivity::Connected);
        assert_eq!(ring.vertices.len(), 5);
        assert!(ring.is_closed());
        // Every segment used exactly once.
        let mut ids: Vec<WayId> = ring.provenance.iter().map(|u| u.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn chains_reversed_segments() {
        // Segment 2 and 4 stored in the opposite direction.
        let rings = assemble_rings(&store(vec![
            segment(1, &[(0.0, 0.0), (1.0, 0.0)]),
            segment(2, &[(1.0, 1.0), (1.0, 0.0)]),
            segment(3, &[(1.0, 1.0), (0.0, 1.0)]),
            segment(4, &[(0.0, 0.0), (0.0, 1.0)]),
        ]))
        .unwrap();

        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring.connectivity, Connectivity::Connected);
        assert!(ring.is_closed());
        assert!(ring.provenance.iter().any(|u| u.reversed));
    }

    #[test]
    fn open_chain_is_unverified() {
        // Three sides of a square; the closing segment is missing.
        let rings = assemble_rings(&store(vec![
            segment(1, &[(0.0, 0.0), (1.0, 0.0)]),
            segment(2, &[(1.0, 0.0), (1.0, 1.0)]),
            segment(3, &[(1.0, 1.0), (0.0, 1.0)]),
        ]))
        .unwrap();

        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring.connectivity, Connectivity::Unverified);
        assert!(ring.is_closed(), "fallback rings must be force-closed");
    }

    #[test]
    fn stalled_walk_falls_back_to_concatenation() {
        // T-branch at (1, 0): the walk chains 1 then 2, after which
        // nothing connects to the tail at (1, 1) even though segment
        // 3 is still unused.
        let rings = assemble_rings(&store(vec![
            segment(1, &[(0.0, 0.0), (1.0, 0.0)]),
            segment(2, &[(1.0, 0.0), (1.0, 1.0)]),
            segment(3, &[(1.0, 0.0), (2.0, 0.0)]),
        ]))
        .unwrap();

        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring.connectivity, Connectivity::Unverified);
        assert!(ring.is_closed());
        // Ascending-id concatenation, each segment's last vertex
        // dropped, then force-closed on the first vertex.
        assert_eq!(
            ring.vertices,
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(1.0, 0.0),
                Vertex::new(1.0, 0.0),
                Vertex::new(0.0, 0.0),
            ]
        );
        assert_eq!(
            ring.provenance,
            vec![
                SegmentUse {
                    id: 1,
                    reversed: false
                },
                SegmentUse {
                    id: 2,
                    reversed: false
                },
                SegmentUse {
                    id: 3,
                    reversed: false
                },
            ]
        );
    }

    #[test]
    fn disjoint_loops_yield_one_ring_each() {
        let mut segments = unit_square_store();
        for (id, seg) in store(vec![
            segment(10, &[(10.0, 10.0), (11.0, 10.0)]),
            segment(11, &[(11.0, 10.0), (11.0, 11.0)]),
            segment(12, &[(11.0, 11.0), (10.0, 10.0)]),
        ]) {
            segments.insert(id, seg);
        }

        let rings = assemble_rings(&segments).unwrap();

        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(Ring::is_closed));
        assert!(
            rings
                .iter()
                .all(|r| r.connectivity == Connectivity::Connected)
        );
        // Component order follows the lowest way id.
        assert_eq!(rings[0].provenance[0].id, 1);
        assert_eq!(rings[1].provenance[0].id, 10);
    }

    #[test]
    fn empty_store_is_insufficient() {
        let result = assemble_rings(&SegmentStore::new());
        assert!(matches!(
            result,
            Err(BoundaryError::InsufficientGeometry { .. })
        ));
    }

    #[test]
    fn single_segment_is_insufficient() {
        let result = assemble_rings(&store(vec![segment(
            1,
            &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)],
        )]));
        assert!(matches!(
            result,
            Err(BoundaryError::InsufficientGeometry { .. })
        ));
    }

    #[test]
    fn inner_roles_are_ignored() {
        let mut segments = unit_square_store();
        segments.insert(
            99,
            Segment {
                id: 99,
                role: BoundaryRole::Inner,
                vertices: vec![Vertex::new(0.2, 0.2), Vertex::new(0.8, 0.8)],
            },
        );

        let rings = assemble_rings(&segments).unwrap();
        assert_eq!(rings.len(), 1);
        assert!(rings[0].provenance.iter().all(|u| u.id != 99));
    }

    #[test]
    fn degenerate_two_segment_loop_is_insufficient() {
        // Two segments bouncing between the same two vertices close
        // into a 3-vertex "ring", which cannot form a polygon.
        let result = assemble_rings(&store(vec![
            segment(1, &[(0.0, 0.0), (1.0, 0.0)]),
            segment(2, &[(1.0, 0.0), (0.0, 0.0)]),
        ]));
        assert!(matches!(
            result,
            Err(BoundaryError::InsufficientGeometry { .. })
        ));
    }

    #[test]
    fn assembly_is_deterministic() {
        let first = assemble_rings(&unit_square_store()).unwrap();
        let second = assemble_rings(&unit_square_store()).unwrap();
        assert_eq!(first, second);
    }
}
