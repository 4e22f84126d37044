// Shared fixtures and checks for the integration tests.

#![allow(dead_code)]

use std::{collections::HashSet, path::PathBuf};

use glam::DVec3;
use lembed::{Embedding, EmbeddingInput, primitive};

/// Square layout with side 4 on a 4x4 grid of unit cells. The layout corners
/// sit on the grid corners 0, 4, 24 and 20.
pub fn quad_on_grid() -> Embedding {
    let target = primitive::grid(4, 4, 1.0).expect("Cannot create grid");
    let layout = primitive::quad([
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(4.0, 0.0, 0.0),
        DVec3::new(4.0, 4.0, 0.0),
        DVec3::new(0.0, 4.0, 0.0),
    ])
    .expect("Cannot create quad");
    let input =
        EmbeddingInput::with_proximity_matching(layout, target).expect("Cannot match landmarks");
    Embedding::new(input)
}

/// Triangulated 2x2 layout grid with cells of size 2, on an 8x8 target grid
/// with cells of size 0.5. Every layout edge has a straight path along target
/// edges.
pub fn grid_on_grid() -> Embedding {
    let layout = primitive::grid(2, 2, 2.0).expect("Cannot create layout");
    let target = primitive::grid(8, 8, 0.5).expect("Cannot create target");
    let input =
        EmbeddingInput::with_proximity_matching(layout, target).expect("Cannot match landmarks");
    Embedding::new(input)
}

/// Sum of the straight line distances between the landmarks of every layout
/// edge. No embedding can be shorter.
pub fn lower_bound(em: &Embedding) -> f64 {
    let layout = em.layout_mesh();
    layout
        .edges()
        .map(|l_e| {
            let (a, b) = l_e.vertices(layout);
            em.target_mesh()
                .point(em.matching_target_vertex(a))
                .distance(em.target_mesh().point(em.matching_target_vertex(b)))
        })
        .sum()
}

/// Every claim is mirrored on the opposite halfedge.
pub fn assert_claims_symmetric(em: &Embedding) {
    for t_h in em.target_mesh().halfedges() {
        assert_eq!(
            em.matching_layout_halfedge(t_h).map(|l_h| l_h.opposite()),
            em.matching_layout_halfedge(t_h.opposite()),
            "Claim of {} is not mirrored",
            t_h
        );
    }
}

/// Paths of different layout edges only meet at landmarks.
pub fn assert_planar(em: &Embedding) {
    let mesh = em.target_mesh();
    for t_v in mesh.vertices() {
        let l_edges: HashSet<_> = mesh
            .voh_ccw_iter(t_v)
            .filter_map(|t_h| em.matching_layout_halfedge(t_h))
            .map(|l_h| l_h.edge())
            .collect();
        if l_edges.len() > 1 {
            assert!(
                em.matching_layout_vertex(t_v).is_some(),
                "Paths of {:?} meet at {}, which is not a landmark",
                l_edges,
                t_v
            );
        }
    }
    for l_he in em.layout_mesh().halfedges() {
        if !em.is_embedded(l_he) {
            continue;
        }
        let path = em.get_embedded_path(l_he);
        for t_v in &path[1..path.len() - 1] {
            assert!(em.matching_layout_vertex(*t_v).is_none());
        }
        assert_eq!(
            path.len() - 1,
            mesh.halfedges()
                .filter(|t_h| em.matching_layout_halfedge(*t_h) == Some(l_he))
                .count()
        );
    }
}

pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lembed-it-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).expect("Cannot create temporary directory");
    dir
}

/// Make sure the topology of the target mesh survived all the splits.
pub fn assert_target_valid(em: &Embedding) {
    em.target_mesh()
        .check_topology()
        .expect("Target topology is broken");
}
