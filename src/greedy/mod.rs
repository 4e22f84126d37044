/*!
Greedy insertion of layout edges.

Every iteration scores all layout edges that are not yet embedded by the length
of their shortest legal path, and embeds the best one. Until the embedded edges
form a spanning tree of the layout, only edges that connect two separate
components are considered. Optional heuristics penalize paths that are likely
to swirl, prefer paths that run through face interiors, and prioritize edges
between extremal layout vertices.
*/

mod swirl;

use crate::{
    element::{Handle, EH},
    embedding::{Embedding, ShortestPathMetric},
    error::Error,
    mesh::PolyMesh,
    property::VProperty,
    union_find::UnionFind,
    virtual_vertex::VirtualPath,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use swirl::{swirl_detection, swirl_detection_bidirectional};

macro_rules! maybe_par_iter {
    ($v:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $v.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $v.iter()
        }
    }};
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InsertionOrder {
    /// Embed the cheapest candidate in every iteration.
    #[default]
    BestFirst,
    /// Embed the first candidate that has a legal path.
    Arbitrary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GreedySettings {
    pub insertion_order: InsertionOrder,
    pub use_swirl_detection: bool,
    /// Cost multiplier for paths that fail the swirl test.
    pub swirl_penalty_factor: f64,
    pub use_vertex_repulsive_tracing: bool,
    pub prefer_extremal_vertices: bool,
    /// Fraction of the layout vertices treated as extremal.
    pub extremal_vertex_ratio: f64,
}

impl Default for GreedySettings {
    fn default() -> Self {
        GreedySettings {
            insertion_order: InsertionOrder::BestFirst,
            use_swirl_detection: false,
            swirl_penalty_factor: 2.0,
            use_vertex_repulsive_tracing: false,
            prefer_extremal_vertices: false,
            extremal_vertex_ratio: 0.1,
        }
    }
}

impl GreedySettings {
    fn metric(&self) -> ShortestPathMetric {
        if self.use_vertex_repulsive_tracing {
            ShortestPathMetric::VertexRepulsive
        } else {
            ShortestPathMetric::Geodesic
        }
    }

    /// The 8 combinations of the heuristics, with everything else copied from
    /// `self`.
    fn combinations(&self) -> Vec<GreedySettings> {
        let mut all = Vec::with_capacity(8);
        for use_swirl_detection in [false, true] {
            for use_vertex_repulsive_tracing in [false, true] {
                for prefer_extremal_vertices in [false, true] {
                    all.push(GreedySettings {
                        use_swirl_detection,
                        use_vertex_repulsive_tracing,
                        prefer_extremal_vertices,
                        ..self.clone()
                    });
                }
            }
        }
        all
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GreedyResult {
    /// Layout edges in the order they were embedded.
    pub insertion_sequence: Vec<EH>,
}

/// Number of connected components of the mesh graph, counting isolated
/// vertices.
fn count_components(mesh: &PolyMesh) -> usize {
    let mut sets = UnionFind::new(mesh.num_vertices());
    mesh.edges()
        .map(|e| e.vertices(mesh))
        .filter(|(a, b)| sets.merge(a.index() as usize, b.index() as usize))
        .fold(mesh.num_vertices(), |count, _| count - 1)
}

/// Layout vertices whose average path length to their neighbours is in the top
/// `ratio` fraction. Halfedges that are already embedded, or have no legal
/// path, are left out of the averages.
fn find_extremal_vertices(em: &Embedding, ratio: f64, metric: ShortestPathMetric) -> VProperty<bool> {
    let layout = em.layout_mesh();
    let mut avg = VProperty::new(layout.num_vertices(), 0.0f64);
    for l_v in layout.vertices() {
        let (total, count) = layout
            .voh_ccw_iter(l_v)
            .filter(|l_he| !em.is_embedded(*l_he))
            .map(|l_he| em.find_layout_path(l_he, metric))
            .filter(|path| !path.is_empty())
            .fold((0.0, 0usize), |(total, count), path| {
                (total + em.path_length(&path), count + 1)
            });
        avg[l_v] = if count > 0 { total / count as f64 } else { 0.0 };
    }
    let mut sorted: Vec<f64> = avg.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let mut extremal = VProperty::new(layout.num_vertices(), false);
    let index = (sorted.len() as f64 * ratio) as usize;
    if let Some(cutoff) = sorted.get(index).copied() {
        for l_v in layout.vertices() {
            extremal[l_v] = avg[l_v] > cutoff;
        }
    }
    log::debug!(
        "{} of {} layout vertices are extremal",
        extremal.iter().filter(|e| **e).count(),
        layout.num_vertices()
    );
    extremal
}

/// Embed every layout edge that isn't embedded yet, one at a time.
///
/// Returns [`Error::NoFeasiblePath`] if at some point none of the remaining
/// edges has a legal path. The edges embedded up to that point stay embedded.
pub fn embed_greedy(em: &mut Embedding, settings: &GreedySettings) -> Result<GreedyResult, Error> {
    let metric = settings.metric();
    let input = em.input().clone();
    let layout = input.layout();
    let nverts = layout.num_vertices();
    let nedges = layout.num_edges();
    let extremal = if settings.prefer_extremal_vertices {
        find_extremal_vertices(em, settings.extremal_vertex_ratio, metric)
    } else {
        VProperty::new(nverts, false)
    };
    let both_extremal = |l_e: EH| -> bool {
        let (a, b) = l_e.vertices(layout);
        extremal[a] && extremal[b]
    };
    let ncomponents = count_components(layout);
    let mut components = UnionFind::new(nverts);
    let mut nsets = nverts;
    let mut nembedded = 0usize;
    for l_e in layout.edges() {
        if em.is_edge_embedded(l_e) {
            let (a, b) = l_e.vertices(layout);
            if components.merge(a.index() as usize, b.index() as usize) {
                nsets -= 1;
            }
            nembedded += 1;
        }
    }
    let mut result = GreedyResult::default();
    while nembedded < nedges {
        // Until the embedded edges span every connected component of the
        // layout, only edges that join two sets are candidates.
        let is_spanning_tree = nsets == ncomponents;
        let mut best: Option<(EH, VirtualPath, f64)> = None;
        for l_e in layout.edges() {
            if em.is_edge_embedded(l_e) {
                continue;
            }
            let best_is_extremal = best.as_ref().is_some_and(|(b, _, _)| both_extremal(*b));
            let is_extremal = both_extremal(l_e);
            if best_is_extremal && !is_extremal {
                continue;
            }
            if !is_spanning_tree {
                let (a, b) = l_e.vertices(layout);
                if components.equivalent(a.index() as usize, b.index() as usize) {
                    continue;
                }
            }
            let path = em.find_layout_edge_path(l_e, metric);
            if path.is_empty() {
                log::warn!("No legal path for layout edge {}", l_e);
                continue;
            }
            let mut cost = em.path_length(&path);
            if settings.insertion_order == InsertionOrder::Arbitrary {
                best = Some((l_e, path, cost));
                break;
            }
            let best_cost = best.as_ref().map_or(f64::INFINITY, |(_, _, c)| *c);
            if settings.use_swirl_detection
                && cost < best_cost
                && swirl_detection_bidirectional(em, l_e.halfedge(false), &path)
            {
                log::debug!("Penalizing swirling path for layout edge {}", l_e);
                cost *= settings.swirl_penalty_factor;
            }
            let priority = (u8::from(!is_extremal), cost);
            let best_priority = (u8::from(!best_is_extremal), best_cost);
            if priority < best_priority {
                best = Some((l_e, path, cost));
            }
        }
        let Some((l_e, path, cost)) = best else {
            let l_e = layout
                .edges()
                .find(|l_e| !em.is_edge_embedded(*l_e))
                .expect("An edge must remain while the loop runs");
            return Err(Error::NoFeasiblePath(l_e));
        };
        log::debug!(
            "Embedding layout edge {} with cost {} ({} of {})",
            l_e,
            cost,
            nembedded + 1,
            nedges
        );
        em.embed_path(l_e.halfedge(false), &path);
        let (a, b) = l_e.vertices(layout);
        if components.merge(a.index() as usize, b.index() as usize) {
            nsets -= 1;
        }
        result.insertion_sequence.push(l_e);
        nembedded += 1;
    }
    Ok(result)
}

/// Run [`embed_greedy`] with all 8 combinations of the heuristics, and keep the
/// embedding with the smallest total path length. `em` is replaced with the
/// winning embedding, and the winning settings are returned along with its
/// result. Runs that fail count as infinitely expensive. If every run fails,
/// `em` is left untouched and the error of the first run is returned.
pub fn embed_greedy_brute_force(
    em: &mut Embedding,
    settings: &GreedySettings,
) -> Result<(GreedyResult, GreedySettings), Error> {
    let all_settings = settings.combinations();
    let base: &Embedding = em;
    let runs: Vec<_> = maybe_par_iter!(all_settings)
        .map(|settings| -> Result<(Embedding, GreedyResult, f64), Error> {
            let mut candidate = base.clone();
            let result = embed_greedy(&mut candidate, settings)?;
            let cost = candidate.total_embedded_path_length();
            log::info!("Embedding cost {} with {:?}", cost, settings);
            Ok((candidate, result, cost))
        })
        .collect();
    let mut best: Option<(usize, f64)> = None;
    for (i, run) in runs.iter().enumerate() {
        match run {
            Ok((_, _, cost)) => {
                if best.is_none_or(|(_, best_cost)| *cost < best_cost) {
                    best = Some((i, *cost));
                }
            }
            Err(e) => log::info!("Greedy embedding failed with {:?}: {}", all_settings[i], e),
        }
    }
    let Some((index, cost)) = best else {
        return Err(runs
            .into_iter()
            .find_map(Result::err)
            .expect("Every failed run has an error"));
    };
    let best_settings = all_settings[index].clone();
    log::info!("Best cost {} with {:?}", cost, best_settings);
    let (winner, result, _) = runs
        .into_iter()
        .nth(index)
        .expect("Index of the best run is in range")
        .expect("Best run succeeded");
    *em = winner;
    Ok((result, best_settings))
}

#[cfg(test)]
mod test {
    use glam::DVec3;

    use crate::{
        embedding::{test::assert_claims_symmetric, Embedding},
        input::{test::grid_quad_input, EmbeddingInput},
        macros::assert_f64_eq,
        mesh::PolyMesh,
        primitive,
    };

    use super::{
        count_components, embed_greedy, embed_greedy_brute_force, GreedySettings, InsertionOrder,
    };

    /// Two separate layout triangles side by side on an 8 x 3 grid.
    fn two_triangles_input() -> EmbeddingInput {
        let mut layout = PolyMesh::default();
        let vs = layout.add_vertices(&[
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(3.0, 0.0, 0.0),
            DVec3::new(3.0, 3.0, 0.0),
            DVec3::new(5.0, 0.0, 0.0),
            DVec3::new(8.0, 0.0, 0.0),
            DVec3::new(8.0, 3.0, 0.0),
        ]);
        layout
            .add_tri_face(vs[0], vs[1], vs[2])
            .expect("Cannot add face");
        layout
            .add_tri_face(vs[3], vs[4], vs[5])
            .expect("Cannot add face");
        let target = primitive::grid(8, 3, 1.0).expect("Cannot create grid");
        EmbeddingInput::with_proximity_matching(layout, target).expect("Cannot match landmarks")
    }

    #[test]
    fn t_settings_combinations() {
        let settings = GreedySettings {
            swirl_penalty_factor: 3.0,
            ..Default::default()
        };
        let all = settings.combinations();
        assert_eq!(all.len(), 8);
        for (i, a) in all.iter().enumerate() {
            assert_eq!(a.swirl_penalty_factor, 3.0);
            for b in &all[(i + 1)..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn t_grid_quad_best_first() {
        let mut em = Embedding::new(grid_quad_input());
        let result = embed_greedy(&mut em, &GreedySettings::default()).expect("Greedy failed");
        assert_eq!(result.insertion_sequence.len(), 4);
        assert!(em.is_complete());
        assert_f64_eq!(em.total_embedded_path_length(), 16.0);
        assert_claims_symmetric(&em);
        // Straight boundary paths need no splits.
        assert_eq!(em.target_mesh().num_vertices(), 25);
    }

    #[test]
    fn t_grid_quad_arbitrary_order() {
        let mut em = Embedding::new(grid_quad_input());
        let settings = GreedySettings {
            insertion_order: InsertionOrder::Arbitrary,
            ..Default::default()
        };
        let result = embed_greedy(&mut em, &settings).expect("Greedy failed");
        // The first three edges connect all four corners, and come in the
        // order of the layout edges.
        let mut sorted = result.insertion_sequence[..3].to_vec();
        sorted.sort();
        assert_eq!(sorted, result.insertion_sequence[..3]);
        assert!(em.is_complete());
        assert_f64_eq!(em.total_embedded_path_length(), 16.0);
    }

    #[test]
    fn t_grid_quad_all_heuristics() {
        let mut em = Embedding::new(grid_quad_input());
        let settings = GreedySettings {
            use_swirl_detection: true,
            prefer_extremal_vertices: true,
            ..Default::default()
        };
        embed_greedy(&mut em, &settings).expect("Greedy failed");
        assert!(em.is_complete());
        assert_f64_eq!(em.total_embedded_path_length(), 16.0);
    }

    #[test]
    fn t_greedy_resumes_partial_embedding() {
        let mut em = Embedding::new(grid_quad_input());
        let settings = GreedySettings::default();
        let first = embed_greedy(&mut em, &settings).expect("Greedy failed");
        let l_e = first.insertion_sequence[2];
        em.unembed_edge(l_e);
        let second = embed_greedy(&mut em, &settings).expect("Greedy failed");
        assert_eq!(second.insertion_sequence, vec![l_e]);
        assert!(em.is_complete());
    }

    #[test]
    fn t_brute_force_picks_cheapest() {
        let mut em = Embedding::new(grid_quad_input());
        let (result, settings) =
            embed_greedy_brute_force(&mut em, &GreedySettings::default()).expect("Greedy failed");
        assert_eq!(result.insertion_sequence.len(), 4);
        assert!(em.is_complete());
        assert_f64_eq!(em.total_embedded_path_length(), 16.0);
        // Repulsive tracing makes longer paths on this input, and the first
        // of the cheapest runs wins.
        assert!(!settings.use_vertex_repulsive_tracing);
        assert!(!settings.use_swirl_detection);
        assert!(!settings.prefer_extremal_vertices);
    }

    #[test]
    fn t_count_components() {
        let input = two_triangles_input();
        assert_eq!(count_components(input.layout()), 2);
        assert_eq!(count_components(grid_quad_input().layout()), 1);
        let mut mesh = primitive::grid(1, 1, 1.0).expect("Cannot create grid");
        mesh.add_vertex(DVec3::new(5.0, 5.0, 0.0));
        assert_eq!(count_components(&mesh), 2);
    }

    #[test]
    fn t_disconnected_layout() {
        let mut em = Embedding::new(two_triangles_input());
        let result = embed_greedy(&mut em, &GreedySettings::default()).expect("Greedy failed");
        assert_eq!(result.insertion_sequence.len(), 6);
        assert!(em.is_complete());
        assert_claims_symmetric(&em);
        assert_f64_eq!(
            em.total_embedded_path_length(),
            2.0 * (6.0 + 3.0 * 2f64.sqrt())
        );
    }
}
