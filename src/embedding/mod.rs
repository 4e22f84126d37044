/*!
Embedding of a layout mesh onto a target mesh.

Each layout vertex is pinned to a target vertex (its landmark), and each
embedded layout edge is a chain of target edges connecting the landmarks of
its end points. The chain is recorded as a claim on every target halfedge along
it: the target halfedge is claimed by the layout halfedge running in the same
direction, and its opposite by the opposite layout halfedge. Claimed edges
and landmarks block the search for later paths, so no two embedded paths ever
cross or touch away from their shared landmarks.
*/

mod io;
mod search;

use std::sync::Arc;

use glam::DVec3;

use crate::{
    element::{EH, HH, VH},
    input::EmbeddingInput,
    mesh::PolyMesh,
    property::{HProperty, VProperty},
    virtual_vertex::VirtualVertex,
};

pub use search::{ShortestPathMetric, VERTEX_REPULSION_FACTOR};

#[derive(Clone)]
pub struct Embedding {
    input: Arc<EmbeddingInput>,
    t_mesh: PolyMesh,
    /// Landmark of every layout vertex.
    l_matching_vertex: VProperty<VH>,
    /// Inverse of the landmark matching.
    t_matching_vertex: VProperty<Option<VH>>,
    /// Layout halfedge claiming each target halfedge.
    t_matching_halfedge: HProperty<Option<HH>>,
    path_length_norm: f64,
}

impl Embedding {
    /// Create an empty embedding, i.e. no layout edge is embedded yet. The
    /// embedding works on its own copy of the target mesh.
    pub fn new(input: impl Into<Arc<EmbeddingInput>>) -> Self {
        let input: Arc<EmbeddingInput> = input.into();
        let t_mesh = input.target().clone();
        let l_matching_vertex = input.matching_vertices().clone();
        Self::from_parts(input, t_mesh, l_matching_vertex)
    }

    fn from_parts(
        input: Arc<EmbeddingInput>,
        t_mesh: PolyMesh,
        l_matching_vertex: VProperty<VH>,
    ) -> Self {
        let mut t_matching_vertex = VProperty::new(t_mesh.num_vertices(), None);
        for l_v in input.layout().vertices() {
            t_matching_vertex[l_matching_vertex[l_v]] = Some(l_v);
        }
        let t_matching_halfedge = HProperty::new(t_mesh.num_halfedges(), None);
        Embedding {
            input,
            t_mesh,
            l_matching_vertex,
            t_matching_vertex,
            t_matching_halfedge,
            path_length_norm: 1.0,
        }
    }

    pub fn input(&self) -> &Arc<EmbeddingInput> {
        &self.input
    }

    pub fn layout_mesh(&self) -> &PolyMesh {
        self.input.layout()
    }

    pub fn layout_pos(&self) -> &VProperty<DVec3> {
        self.input.layout().points()
    }

    pub fn target_mesh(&self) -> &PolyMesh {
        &self.t_mesh
    }

    pub fn target_pos(&self) -> &VProperty<DVec3> {
        self.t_mesh.points()
    }

    pub fn matching_target_vertex(&self, l_v: VH) -> VH {
        self.l_matching_vertex[l_v]
    }

    pub fn matching_layout_vertex(&self, t_v: VH) -> Option<VH> {
        self.t_matching_vertex[t_v]
    }

    pub fn matching_layout_halfedge(&self, t_h: HH) -> Option<HH> {
        self.t_matching_halfedge[t_h]
    }

    pub fn path_length_norm(&self) -> f64 {
        self.path_length_norm
    }

    /// Exponent applied to path lengths. The default of 1 measures plain
    /// lengths, larger values favour many short paths over a few long ones.
    pub fn set_path_length_norm(&mut self, norm: f64) {
        self.path_length_norm = norm;
    }

    /// Position of a vertex, or the midpoint of an edge of the target mesh.
    pub fn element_pos(&self, vv: VirtualVertex) -> DVec3 {
        vv.position(&self.t_mesh)
    }

    /// The first target halfedge of the embedded path of `l_he`, found among
    /// the outgoing halfedges of the landmark at its tail.
    pub fn get_embedded_target_halfedge(&self, l_he: HH) -> Option<HH> {
        let l_v = l_he.tail(self.layout_mesh());
        let t_v = self.l_matching_vertex[l_v];
        self.t_mesh
            .voh_ccw_iter(t_v)
            .find(|t_h| self.t_matching_halfedge[*t_h] == Some(l_he))
    }

    pub fn is_embedded(&self, l_he: HH) -> bool {
        self.get_embedded_target_halfedge(l_he).is_some()
    }

    pub fn is_edge_embedded(&self, l_e: EH) -> bool {
        self.is_embedded(l_e.halfedge(false))
    }

    /// Target halfedge bounding the sector around the tail landmark of `l_he`
    /// through which its path must leave. This is the embedded path of the
    /// first embedded layout halfedge clockwise from `l_he`. If there is no
    /// such halfedge, any outgoing halfedge of the landmark is returned.
    pub fn get_embeddable_sector(&self, l_he: HH) -> HH {
        assert!(
            !self.is_embedded(l_he),
            "Layout halfedge {} is already embedded",
            l_he
        );
        let layout = self.layout_mesh();
        if let Some(t_h) = layout
            .hh_cw_iter(l_he)
            .skip(1)
            .find_map(|l_h| self.get_embedded_target_halfedge(l_h))
        {
            return t_h;
        }
        let t_v = self.l_matching_vertex[l_he.tail(layout)];
        t_v.halfedge(&self.t_mesh)
            .expect("Landmark has no incident edges")
    }

    pub fn is_edge_blocked(&self, t_e: EH) -> bool {
        let (h, oh) = t_e.halfedges();
        self.t_matching_halfedge[h].is_some() || self.t_matching_halfedge[oh].is_some()
    }

    /// Landmarks, and vertices on embedded paths, are blocked.
    pub fn is_vertex_blocked(&self, t_v: VH) -> bool {
        self.t_matching_vertex[t_v].is_some()
            || self
                .t_mesh
                .voh_ccw_iter(t_v)
                .any(|t_h| self.is_edge_blocked(t_h.edge()))
    }

    pub fn is_blocked(&self, vv: VirtualVertex) -> bool {
        match vv {
            VirtualVertex::Vertex(v) => self.is_vertex_blocked(v),
            VirtualVertex::Edge(e) => self.is_edge_blocked(e),
        }
    }

    /// Embed `l_he` along `path`. Edge midpoints on the path become real
    /// vertices by splitting their edges, and every target halfedge along the
    /// resulting vertex chain is claimed by `l_he`, its opposite by the
    /// opposite layout halfedge.
    ///
    /// The splits are permanent, they are not undone if the path is later
    /// unembedded.
    pub fn embed_path(&mut self, l_he: HH, path: &[VirtualVertex]) {
        assert!(
            !self.is_embedded(l_he),
            "Layout halfedge {} is already embedded",
            l_he
        );
        assert!(path.len() >= 2, "A path needs at least two vertices");
        let mut vertex_path = Vec::with_capacity(path.len());
        for vv in path {
            let t_v = match vv {
                VirtualVertex::Vertex(v) => *v,
                VirtualVertex::Edge(e) => self.split_target_edge(*e),
            };
            vertex_path.push(t_v);
        }
        for pair in vertex_path.windows(2) {
            let t_h = self
                .t_mesh
                .find_halfedge(pair[0], pair[1])
                .expect("Consecutive path vertices must be adjacent");
            self.t_matching_halfedge[t_h] = Some(l_he);
            self.t_matching_halfedge[t_h.opposite()] = Some(l_he.opposite());
        }
        log::debug!(
            "Embedded {} along {} target vertices",
            l_he,
            vertex_path.len()
        );
    }

    /// Split a target edge at its midpoint, and grow the attributes to cover
    /// the new elements.
    fn split_target_edge(&mut self, t_e: EH) -> VH {
        let t_v = self.t_mesh.split_edge_at_midpoint(t_e);
        self.t_matching_vertex.resize(self.t_mesh.num_vertices());
        self.t_matching_halfedge
            .resize(self.t_mesh.num_halfedges());
        t_v
    }

    /// Remove the claims along the embedded path of `l_he`. The target mesh
    /// is left as it is.
    pub fn unembed_path(&mut self, l_he: HH) {
        let path = self.get_embedded_path(l_he);
        for pair in path.windows(2) {
            let t_h = self
                .t_mesh
                .find_halfedge(pair[0], pair[1])
                .expect("Consecutive path vertices must be adjacent");
            assert_eq!(self.t_matching_halfedge[t_h], Some(l_he));
            assert_eq!(
                self.t_matching_halfedge[t_h.opposite()],
                Some(l_he.opposite())
            );
            self.t_matching_halfedge[t_h] = None;
            self.t_matching_halfedge[t_h.opposite()] = None;
        }
    }

    pub fn unembed_edge(&mut self, l_e: EH) {
        self.unembed_path(l_e.halfedge(false));
    }

    /// Target vertices along the embedded path of `l_he`, from the landmark at
    /// its tail to the landmark at its head.
    pub fn get_embedded_path(&self, l_he: HH) -> Vec<VH> {
        let t_h = self
            .get_embedded_target_halfedge(l_he)
            .unwrap_or_else(|| panic!("Layout halfedge {} is not embedded", l_he));
        let t_v_end = self.l_matching_vertex[l_he.head(self.layout_mesh())];
        let mut t_v = t_h.tail(&self.t_mesh);
        let mut path = Vec::new();
        while t_v != t_v_end {
            path.push(t_v);
            if path.len() > self.t_mesh.num_vertices() {
                panic!("Embedded path of {} does not terminate", l_he);
            }
            t_v = self
                .t_mesh
                .voh_ccw_iter(t_v)
                .find(|t_h| self.t_matching_halfedge[*t_h] == Some(l_he))
                .unwrap_or_else(|| panic!("Embedded path of {} is interrupted", l_he))
                .head(&self.t_mesh);
        }
        path.push(t_v_end);
        path
    }

    /// Length of the embedded path, raised to the path length norm.
    pub fn embedded_path_length(&self, l_he: HH) -> f64 {
        let path = self.get_embedded_path(l_he);
        let length: f64 = path
            .windows(2)
            .map(|pair| self.t_mesh.point(pair[0]).distance(self.t_mesh.point(pair[1])))
            .sum();
        length.powf(self.path_length_norm)
    }

    pub fn embedded_edge_path_length(&self, l_e: EH) -> f64 {
        self.embedded_path_length(l_e.halfedge(false))
    }

    /// Sum of the lengths of all embedded paths.
    pub fn total_embedded_path_length(&self) -> f64 {
        self.layout_mesh()
            .edges()
            .filter(|l_e| self.is_edge_embedded(*l_e))
            .map(|l_e| self.embedded_edge_path_length(l_e))
            .sum()
    }

    pub fn num_embedded_edges(&self) -> usize {
        self.layout_mesh()
            .edges()
            .filter(|l_e| self.is_edge_embedded(*l_e))
            .count()
    }

    /// Check if every layout edge is embedded.
    pub fn is_complete(&self) -> bool {
        self.layout_mesh()
            .edges()
            .all(|l_e| self.is_edge_embedded(l_e))
    }
}
