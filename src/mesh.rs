use glam::DVec3;

use crate::{
    element::{HasTopology, EH, FH, HH, VH},
    error::Error,
    iterator,
    property::VProperty,
    topol::{TopolCache, Topology},
};

/// Polygon mesh with `f64` vertex positions.
pub struct PolyMesh {
    topol: Topology,
    cache: TopolCache,
    points: VProperty<DVec3>,
}

impl Default for PolyMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PolyMesh {
    fn clone(&self) -> Self {
        PolyMesh {
            topol: self.topol.clone(),
            cache: TopolCache::default(),
            points: self.points.clone(),
        }
    }
}

impl HasTopology for PolyMesh {
    fn topology(&self) -> &Topology {
        &self.topol
    }
}

impl PolyMesh {
    pub fn new() -> Self {
        PolyMesh {
            topol: Topology::new(),
            cache: TopolCache::default(),
            points: VProperty::new(0, DVec3::ZERO),
        }
    }

    pub fn with_capacity(nverts: usize, nedges: usize, nfaces: usize) -> Self {
        PolyMesh {
            topol: Topology::with_capacity(nverts, nedges, nfaces),
            cache: TopolCache::default(),
            points: VProperty::new(0, DVec3::ZERO),
        }
    }

    pub(crate) fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topol
    }

    pub fn num_vertices(&self) -> usize {
        self.topol.num_vertices()
    }

    pub fn num_edges(&self) -> usize {
        self.topol.num_edges()
    }

    pub fn num_halfedges(&self) -> usize {
        self.topol.num_halfedges()
    }

    pub fn num_faces(&self) -> usize {
        self.topol.num_faces()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VH> + use<> {
        self.topol.vertices()
    }

    pub fn halfedges(&self) -> impl Iterator<Item = HH> + use<> {
        self.topol.halfedges()
    }

    pub fn edges(&self) -> impl Iterator<Item = EH> + use<> {
        self.topol.edges()
    }

    pub fn faces(&self) -> impl Iterator<Item = FH> + use<> {
        self.topol.faces()
    }

    pub fn is_boundary_edge(&self, e: EH) -> bool {
        self.topol.is_boundary_edge(e)
    }

    pub fn vertex_valence(&self, v: VH) -> usize {
        self.topol.vertex_valence(v)
    }

    pub fn face_valence(&self, f: FH) -> usize {
        self.topol.face_valence(f)
    }

    pub fn find_halfedge(&self, from: VH, to: VH) -> Option<HH> {
        self.topol.find_halfedge(from, to)
    }

    pub fn opposite_vertex(&self, h: HH) -> Option<VH> {
        self.topol.opposite_vertex(h)
    }

    pub fn point(&self, v: VH) -> DVec3 {
        self.points[v]
    }

    pub fn set_point(&mut self, v: VH, pos: DVec3) {
        self.points[v] = pos;
    }

    pub fn points(&self) -> &VProperty<DVec3> {
        &self.points
    }

    pub fn voh_ccw_iter(&self, v: VH) -> impl Iterator<Item = HH> + use<'_> {
        iterator::voh_ccw_iter(&self.topol, v)
    }

    pub fn voh_cw_iter(&self, v: VH) -> impl Iterator<Item = HH> + use<'_> {
        iterator::voh_cw_iter(&self.topol, v)
    }

    /// Outgoing halfedges around the tail of `h` in clockwise order, starting
    /// with `h` itself.
    pub fn hh_cw_iter(&self, h: HH) -> impl Iterator<Item = HH> + use<'_> {
        iterator::hh_cw_iter(&self.topol, h)
    }

    pub fn vih_ccw_iter(&self, v: VH) -> impl Iterator<Item = HH> + use<'_> {
        iterator::vih_ccw_iter(&self.topol, v)
    }

    pub fn vv_ccw_iter(&self, v: VH) -> impl Iterator<Item = VH> + use<'_> {
        iterator::vv_ccw_iter(&self.topol, v)
    }

    pub fn vv_cw_iter(&self, v: VH) -> impl Iterator<Item = VH> + use<'_> {
        iterator::vv_cw_iter(&self.topol, v)
    }

    pub fn vf_ccw_iter(&self, v: VH) -> impl Iterator<Item = FH> + use<'_> {
        iterator::vf_ccw_iter(&self.topol, v)
    }

    pub fn fh_ccw_iter(&self, f: FH) -> impl Iterator<Item = HH> + use<'_> {
        iterator::fh_ccw_iter(&self.topol, f)
    }

    pub fn fv_ccw_iter(&self, f: FH) -> impl Iterator<Item = VH> + use<'_> {
        iterator::fv_ccw_iter(&self.topol, f)
    }

    pub fn ff_ccw_iter(&self, f: FH) -> impl Iterator<Item = FH> + use<'_> {
        iterator::ff_ccw_iter(&self.topol, f)
    }

    pub fn add_vertex(&mut self, pos: DVec3) -> VH {
        let v = self.topol.add_vertex();
        self.points.resize(self.topol.num_vertices());
        self.points[v] = pos;
        v
    }

    pub fn add_vertices(&mut self, positions: &[DVec3]) -> Vec<VH> {
        positions.iter().map(|p| self.add_vertex(*p)).collect()
    }

    pub fn add_face(&mut self, verts: &[VH]) -> Result<FH, Error> {
        self.topol.add_face(verts, &mut self.cache)
    }

    pub fn add_tri_face(&mut self, v0: VH, v1: VH, v2: VH) -> Result<FH, Error> {
        self.add_face(&[v0, v1, v2])
    }

    pub fn add_quad_face(&mut self, v0: VH, v1: VH, v2: VH, v3: VH) -> Result<FH, Error> {
        self.add_face(&[v0, v1, v2, v3])
    }

    pub fn calc_halfedge_vector(&self, h: HH) -> DVec3 {
        self.point(self.topol.to_vertex(h)) - self.point(self.topol.from_vertex(h))
    }

    pub fn calc_halfedge_length(&self, h: HH) -> f64 {
        self.calc_halfedge_vector(h).length()
    }

    pub fn calc_edge_length(&self, e: EH) -> f64 {
        self.calc_halfedge_length(e.halfedge(false))
    }

    pub fn calc_edge_midpoint(&self, e: EH) -> DVec3 {
        let (a, b) = e.vertices(self);
        (self.point(a) + self.point(b)) * 0.5
    }

    pub fn calc_face_centroid(&self, f: FH) -> DVec3 {
        let (sum, count) = self
            .fv_ccw_iter(f)
            .fold((DVec3::ZERO, 0usize), |(sum, count), v| {
                (sum + self.point(v), count + 1)
            });
        sum / count as f64
    }

    /// Axis aligned bounding box of the vertices, as `(min, max)`.
    pub fn bounding_box(&self) -> (DVec3, DVec3) {
        self.points.iter().fold(
            (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        )
    }
}
