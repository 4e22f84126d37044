use std::{cmp::Ordering, collections::BinaryHeap};

use glam::DVec3;

use crate::{
    element::{EH, HH},
    virtual_vertex::{VirtualPath, VirtualVertex, VirtualVertexProperty},
};

use super::Embedding;

/// Weight applied to every path segment that ends on a real vertex which is
/// not the goal, by [`ShortestPathMetric::VertexRepulsive`].
pub const VERTEX_REPULSION_FACTOR: f64 = 2.0;

/// How path segments are weighted during the search.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShortestPathMetric {
    /// Euclidean length of the segments.
    #[default]
    Geodesic,
    /// Euclidean length, with segments arriving at real vertices scaled by
    /// [`VERTEX_REPULSION_FACTOR`]. Paths prefer crossing edges over running
    /// through existing vertices.
    VertexRepulsive,
}

#[derive(Copy, Clone, Debug)]
struct Distance {
    edges_crossed: usize,
    geodesic: f64,
    remaining: f64,
}

impl Distance {
    fn priority(&self) -> f64 {
        self.geodesic + self.remaining
    }
}

struct Candidate {
    vv: VirtualVertex,
    pos: DVec3,
    dist: Distance,
}

// Reversed, so the max-heap pops the lowest priority first.
impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.dist.priority() == other.dist.priority()
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .priority()
            .partial_cmp(&self.dist.priority())
            .unwrap_or(Ordering::Equal)
    }
}

impl Embedding {
    /// Virtual vertices a path may use to leave the tail of `t_h`, without
    /// crossing an embedded path. The sector is widened from `t_h` in both
    /// directions until blocked edges are hit on both sides.
    fn sector_virtual_vertices(&self, t_h: HH) -> Vec<VirtualVertex> {
        let mesh = &self.t_mesh;
        let mut start = t_h;
        let mut end = t_h.rotate_ccw(mesh);
        while start != end {
            if !self.is_edge_blocked(start.edge()) {
                start = start.rotate_cw(mesh);
            } else if !self.is_edge_blocked(end.edge()) {
                end = end.rotate_ccw(mesh);
            } else {
                break;
            }
        }
        let mut vvs = Vec::new();
        let mut h = start;
        loop {
            if h.face(mesh).is_some() {
                vvs.push(VirtualVertex::Edge(h.next(mesh).edge()));
            }
            if !self.is_edge_blocked(h.edge()) {
                vvs.push(VirtualVertex::Vertex(h.head(mesh)));
            }
            h = h.rotate_ccw(mesh);
            if h == end {
                break;
            }
        }
        vvs
    }

    /// Append the neighbours of `vv` in the search graph to `out`.
    fn virtual_neighbors(&self, vv: VirtualVertex, out: &mut Vec<VirtualVertex>) {
        let mesh = &self.t_mesh;
        match vv {
            VirtualVertex::Vertex(t_v) => {
                for t_h in mesh.voh_ccw_iter(t_v) {
                    out.push(VirtualVertex::Vertex(t_h.head(mesh)));
                    if t_h.face(mesh).is_some() {
                        out.push(VirtualVertex::Edge(t_h.next(mesh).edge()));
                    }
                }
            }
            VirtualVertex::Edge(t_e) => {
                let (h0, h1) = t_e.halfedges();
                for t_h in [h0, h1] {
                    if t_h.face(mesh).is_none() {
                        continue;
                    }
                    if let Some(t_v) = mesh.opposite_vertex(t_h) {
                        out.push(VirtualVertex::Vertex(t_v));
                    }
                    out.push(VirtualVertex::Edge(t_h.next(mesh).edge()));
                    out.push(VirtualVertex::Edge(t_h.prev(mesh).edge()));
                }
            }
        }
    }

    /// A* search for the shortest path from the tail of `sector_start` to the
    /// tail of `sector_end`. The path leaves and enters the landmarks through
    /// the sectors bounded by the given halfedges, and avoids all blocked
    /// elements. Returns an empty path if there is no legal path.
    pub fn find_shortest_path(
        &self,
        sector_start: HH,
        sector_end: HH,
        metric: ShortestPathMetric,
    ) -> VirtualPath {
        let mesh = &self.t_mesh;
        let t_v_start = sector_start.tail(mesh);
        let t_v_end = sector_end.tail(mesh);
        let vv_start = VirtualVertex::Vertex(t_v_start);
        let vv_end = VirtualVertex::Vertex(t_v_end);
        let p_end = mesh.point(t_v_end);
        let legal_first = self.sector_virtual_vertices(sector_start);
        let legal_last = self.sector_virtual_vertices(sector_end);
        let legal_step = |from: VirtualVertex, to: VirtualVertex| -> bool {
            if from == vv_start && !legal_first.contains(&to) {
                return false;
            }
            if to == vv_end {
                legal_last.contains(&from)
            } else {
                !self.is_blocked(to)
            }
        };
        let mut prev: VirtualVertexProperty<Option<VirtualVertex>> =
            VirtualVertexProperty::new(mesh, None);
        let mut distance = VirtualVertexProperty::new(mesh, f64::INFINITY);
        distance[vv_start] = 0.0;
        let mut queue = BinaryHeap::new();
        queue.push(Candidate {
            vv: vv_start,
            pos: mesh.point(t_v_start),
            dist: Distance {
                edges_crossed: 0,
                geodesic: 0.0,
                remaining: f64::MAX,
            },
        });
        let mut neighbors = Vec::new();
        let mut found: Option<Distance> = None;
        while let Some(c) = queue.pop() {
            if c.dist.geodesic > distance[c.vv] {
                continue; // Stale.
            }
            if c.vv == vv_end {
                found = Some(c.dist);
                break;
            }
            neighbors.clear();
            self.virtual_neighbors(c.vv, &mut neighbors);
            for &vv in &neighbors {
                if !legal_step(c.vv, vv) {
                    continue;
                }
                let pos = self.element_pos(vv);
                let mut step = c.pos.distance(pos);
                if metric == ShortestPathMetric::VertexRepulsive
                    && vv.is_real_vertex()
                    && vv != vv_end
                {
                    step *= VERTEX_REPULSION_FACTOR;
                }
                let geodesic = c.dist.geodesic + step;
                if geodesic < distance[vv] {
                    distance[vv] = geodesic;
                    prev[vv] = Some(c.vv);
                    queue.push(Candidate {
                        vv,
                        pos,
                        dist: Distance {
                            edges_crossed: c.dist.edges_crossed + usize::from(vv.is_real_edge()),
                            geodesic,
                            remaining: pos.distance(p_end),
                        },
                    });
                }
            }
        }
        let Some(dist) = found else {
            return VirtualPath::new();
        };
        let mut path = vec![vv_end];
        let mut vv = vv_end;
        while let Some(p) = prev[vv] {
            path.push(p);
            vv = p;
        }
        path.reverse();
        log::trace!(
            "Path from {} to {} with {} nodes crosses {} edges",
            t_v_start,
            t_v_end,
            path.len(),
            dist.edges_crossed
        );
        path
    }

    /// Shortest legal path for a layout halfedge that isn't embedded yet.
    pub fn find_layout_path(&self, l_he: HH, metric: ShortestPathMetric) -> VirtualPath {
        assert!(
            !self.is_embedded(l_he),
            "Layout halfedge {} is already embedded",
            l_he
        );
        let sector_start = self.get_embeddable_sector(l_he);
        let sector_end = self.get_embeddable_sector(l_he.opposite());
        self.find_shortest_path(sector_start, sector_end, metric)
    }

    pub fn find_layout_edge_path(&self, l_e: EH, metric: ShortestPathMetric) -> VirtualPath {
        self.find_layout_path(l_e.halfedge(false), metric)
    }

    /// Euclidean length of `path`, raised to the path length norm.
    pub fn path_length(&self, path: &[VirtualVertex]) -> f64 {
        assert!(path.len() >= 2, "A path needs at least two vertices");
        let length: f64 = path
            .windows(2)
            .map(|pair| self.element_pos(pair[0]).distance(self.element_pos(pair[1])))
            .sum();
        length.powf(self.path_length_norm)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        embedding::{
            test::{layout_halfedge, triangle_embedding},
            Embedding,
        },
        input::test::grid_quad_input,
        macros::assert_f64_eq,
        virtual_vertex::VirtualVertex,
    };

    use super::ShortestPathMetric;

    fn vertices(indices: &[u32]) -> Vec<VirtualVertex> {
        indices
            .iter()
            .map(|i| VirtualVertex::Vertex((*i).into()))
            .collect()
    }

    #[test]
    fn t_straight_path_along_boundary() {
        let em = Embedding::new(grid_quad_input());
        let l_he = layout_halfedge(&em, 0, 1);
        let path = em.find_layout_path(l_he, ShortestPathMetric::Geodesic);
        assert_eq!(path, vertices(&[0, 1, 2, 3, 4]));
        assert_f64_eq!(em.path_length(&path), 4.0);
        // Same path, found from the edge.
        assert_eq!(
            em.find_layout_edge_path(l_he.edge(), ShortestPathMetric::Geodesic),
            path
        );
    }

    #[test]
    fn t_path_length_norm() {
        let mut em = triangle_embedding();
        let path = vertices(&[0, 1, 2]);
        assert_f64_eq!(em.path_length(&path), 1.0 + 2f64.sqrt());
        em.set_path_length_norm(2.0);
        assert_f64_eq!(em.path_length(&path), (1.0 + 2f64.sqrt()).powi(2));
    }

    #[test]
    fn t_sector_at_boundary_corner() {
        let em = Embedding::new(grid_quad_input());
        let mesh = &em.t_mesh;
        let boundary = mesh
            .find_halfedge(0u32.into(), 5u32.into())
            .expect("Missing halfedge");
        assert!(boundary.face(mesh).is_none());
        let sector = em.sector_virtual_vertices(boundary);
        // Three neighbours, and only the two faces have a far edge.
        assert_eq!(sector.len(), 5);
        for v in [1u32, 5, 6] {
            assert!(sector.contains(&VirtualVertex::Vertex(v.into())));
        }
        let edge = |a: u32, b: u32| {
            VirtualVertex::Edge(
                mesh.find_halfedge(a.into(), b.into())
                    .expect("Missing halfedge")
                    .edge(),
            )
        };
        let midpoints: Vec<_> = sector.iter().filter(|vv| vv.is_real_edge()).collect();
        assert_eq!(midpoints.len(), 2);
        assert!(sector.contains(&edge(1, 6)));
        assert!(sector.contains(&edge(6, 5)));
    }

    #[test]
    fn t_vertex_repulsive_crosses_edges() {
        let em = Embedding::new(grid_quad_input());
        let l_he = layout_halfedge(&em, 0, 1);
        let path = em.find_layout_path(l_he, ShortestPathMetric::VertexRepulsive);
        assert_eq!(path.first(), Some(&VirtualVertex::Vertex(0u32.into())));
        assert_eq!(path.last(), Some(&VirtualVertex::Vertex(4u32.into())));
        assert!(path.iter().any(|vv| vv.is_real_edge()));
        assert!(em.path_length(&path) > 4.0);
        // Consecutive nodes are neighbours in the search graph.
        for pair in path.windows(2) {
            let mut neighbors = Vec::new();
            em.virtual_neighbors(pair[0], &mut neighbors);
            assert!(neighbors.contains(&pair[1]));
        }
    }

    #[test]
    fn t_path_avoids_blocked_elements() {
        let mut em = Embedding::new(grid_quad_input());
        let l01 = layout_halfedge(&em, 0, 1);
        let path = em.find_layout_path(l01, ShortestPathMetric::Geodesic);
        em.embed_path(l01, &path);
        let l12 = layout_halfedge(&em, 1, 2);
        let path = em.find_layout_path(l12, ShortestPathMetric::Geodesic);
        assert_eq!(path, vertices(&[4, 9, 14, 19, 24]));
        em.embed_path(l12, &path);
        // The diagonal is free, but the remaining sides must still run along
        // the boundary.
        let l23 = layout_halfedge(&em, 2, 3);
        let path = em.find_layout_path(l23, ShortestPathMetric::Geodesic);
        assert_eq!(path, vertices(&[24, 23, 22, 21, 20]));
        for vv in &path[1..path.len() - 1] {
            assert!(!em.is_blocked(*vv));
        }
    }

    #[test]
    fn t_enclosed_landmark_has_no_path() {
        let mut em = Embedding::new(grid_quad_input());
        let l01 = layout_halfedge(&em, 0, 1);
        // Wall off the bottom row from the rest of the grid.
        em.embed_path(l01, &vertices(&[0, 6, 7, 8, 9, 4]));
        let l12 = layout_halfedge(&em, 1, 2);
        assert!(em
            .find_layout_path(l12, ShortestPathMetric::Geodesic)
            .is_empty());
        assert!(em
            .find_layout_path(l12, ShortestPathMetric::VertexRepulsive)
            .is_empty());
    }
}
