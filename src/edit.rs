use glam::DVec3;

use crate::{
    element::{EH, HH, VH},
    mesh::PolyMesh,
    topol::Topology,
};

impl Topology {
    /// Split the edge `e` by inserting the isolated vertex `v` in the middle
    /// of it.
    ///
    /// The halfedge `2e` keeps pointing at its old head, and now starts at
    /// `v`. The returned new edge connects the old tail to `v`. Faces are not
    /// retriangulated, so a triangle incident on `e` becomes a quad.
    pub fn split_edge(&mut self, e: EH, v: VH) -> EH {
        let (h0, h1) = e.halfedges();
        let vfrom = self.from_vertex(h0);
        let (ph0, nh1) = (self.prev_halfedge(h0), self.next_halfedge(h1));
        let (f0, f1) = (self.halfedge_face(h0), self.halfedge_face(h1));
        // Create a new edge and rewire topology.
        let enew = self.new_edge(vfrom, v, ph0, h0, h1, nh1);
        let (hnew, ohnew) = enew.halfedges();
        // Rewire halfedge -> vertex.
        self.halfedge_mut(h1).vertex = v;
        // Rewire halfedge -> halfedge.
        self.link_halfedges(hnew, h0);
        self.link_halfedges(h1, ohnew);
        self.link_halfedges(ph0, hnew);
        self.link_halfedges(ohnew, nh1);
        // Rewire halfedge -> face.
        self.halfedge_mut(hnew).face = f0;
        self.halfedge_mut(ohnew).face = f1;
        // Rewire vertex -> halfedge.
        self.vertex_mut(v).halfedge = Some(h0);
        self.adjust_outgoing_halfedge(v);
        if self.vertex_halfedge(vfrom) == Some(h0) {
            self.vertex_mut(vfrom).halfedge = Some(hnew);
            self.adjust_outgoing_halfedge(vfrom);
        }
        enew
    }

    /// Cut the quad containing `hv` with a diagonal from the tail of `hv` to
    /// the head of the halfedge after `hv`. The quad must be the result of
    /// splitting one side of a triangle, with the split vertex at the tail of
    /// `hv`.
    fn insert_diagonal(&mut self, hv: HH) {
        let f = self
            .halfedge_face(hv)
            .expect("Cannot insert a diagonal into a boundary loop");
        let h1 = self.next_halfedge(hv);
        let h2 = self.next_halfedge(h1);
        let h3 = self.next_halfedge(h2);
        debug_assert_eq!(self.next_halfedge(h3), hv, "Expecting a quad");
        let v = self.from_vertex(hv);
        let a = self.to_vertex(h1);
        let enew = self.new_edge(a, v, h1, hv, h3, h2);
        let (y, x) = enew.halfedges();
        self.link_halfedges(h1, y);
        self.link_halfedges(y, hv);
        self.link_halfedges(h3, x);
        self.link_halfedges(x, h2);
        // The triangle containing `hv` keeps the old face.
        self.halfedge_mut(y).face = Some(f);
        self.face_mut(f).halfedge = hv;
        let fnew = self.new_face(x);
        for h in [x, h2, h3] {
            self.halfedge_mut(h).face = Some(fnew);
        }
    }

    /// Split the edge `e` at the isolated vertex `v`, and connect `v` to the
    /// opposite vertex of every triangle incident on `e`. A triangle mesh
    /// stays a triangle mesh.
    pub fn split_edge_triangulated(&mut self, e: EH, v: VH) {
        let enew = self.split_edge(e, v);
        let (h0, _) = e.halfedges();
        let (_, ohnew) = enew.halfedges();
        for h in [h0, ohnew] {
            if !self.is_boundary_halfedge(h) {
                self.insert_diagonal(h);
            }
        }
    }
}

impl PolyMesh {
    /// Add a vertex at `pos` and split `e` with it. Returns the new vertex and
    /// the new edge.
    pub fn split_edge(&mut self, e: EH, pos: DVec3) -> (VH, EH) {
        let v = self.add_vertex(pos);
        let enew = self.topology_mut().split_edge(e, v);
        (v, enew)
    }

    /// Add a vertex at `pos`, split `e` with it and retriangulate the incident
    /// faces.
    pub fn split_edge_triangulated(&mut self, e: EH, pos: DVec3) -> VH {
        let v = self.add_vertex(pos);
        self.topology_mut().split_edge_triangulated(e, v);
        v
    }

    /// Split the edge at its midpoint and retriangulate the incident faces.
    pub fn split_edge_at_midpoint(&mut self, e: EH) -> VH {
        let pos = self.calc_edge_midpoint(e);
        self.split_edge_triangulated(e, pos)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        element::{HasTopology, VH},
        primitive,
        topol::test::{quad_box, two_triangles},
    };

    #[test]
    fn t_box_split_edge() {
        let mut qbox = quad_box();
        let e = qbox
            .find_halfedge(4u32.into(), 5u32.into())
            .expect("Cannot find halfedge")
            .edge();
        let (h, oh) = e.halfedges();
        let v = qbox.add_vertex();
        let enew = qbox.split_edge(e, v);
        let (hnew, ohnew) = enew.halfedges();
        assert_eq!(qbox.to_vertex(oh), qbox.from_vertex(ohnew));
        assert_eq!(qbox.to_vertex(oh), v);
        assert_eq!(qbox.to_vertex(hnew), qbox.from_vertex(h));
        assert_eq!(qbox.to_vertex(hnew), v);
        assert_eq!(
            qbox.next_halfedge(ohnew),
            qbox.find_halfedge(5u32.into(), 6u32.into())
                .expect("Cannot find halfedge")
        );
        assert_eq!(
            qbox.prev_halfedge(hnew),
            qbox.find_halfedge(1u32.into(), 5u32.into())
                .expect("Cannot find halfedge")
        );
        assert_eq!(qbox.prev_halfedge(h), hnew);
        assert_eq!(qbox.next_halfedge(oh), ohnew);
        assert_eq!(qbox.halfedge_face(h), qbox.halfedge_face(hnew));
        assert_eq!(qbox.halfedge_face(oh), qbox.halfedge_face(ohnew));
        qbox.check().expect("Topology is broken after split");
    }

    #[test]
    fn t_split_interior_edge_triangulated() {
        let mut topol = two_triangles();
        let e = topol
            .find_halfedge(0u32.into(), 2u32.into())
            .expect("Cannot find diagonal")
            .edge();
        let v = topol.add_vertex();
        topol.split_edge_triangulated(e, v);
        topol.check().expect("Topology is broken after split");
        assert_eq!(topol.num_vertices(), 5);
        assert_eq!(topol.num_edges(), 8);
        assert_eq!(topol.num_faces(), 4);
        assert!(topol.faces().all(|f| topol.face_valence(f) == 3));
        assert_eq!(topol.vertex_valence(v), 4);
        assert!(!topol.is_boundary_vertex(v));
        let mut nbs: Vec<VH> = crate::iterator::vv_ccw_iter(&topol, v).collect();
        nbs.sort();
        assert_eq!(nbs, (0u32..4).map(VH::from).collect::<Vec<_>>());
    }

    #[test]
    fn t_split_boundary_edge_triangulated() {
        let mut topol = two_triangles();
        let e = topol
            .find_halfedge(0u32.into(), 1u32.into())
            .expect("Cannot find halfedge")
            .edge();
        let v = topol.add_vertex();
        topol.split_edge_triangulated(e, v);
        topol.check().expect("Topology is broken after split");
        assert_eq!(topol.num_vertices(), 5);
        assert_eq!(topol.num_edges(), 7);
        assert_eq!(topol.num_faces(), 3);
        assert!(topol.faces().all(|f| topol.face_valence(f) == 3));
        assert_eq!(topol.vertex_valence(v), 3);
        assert!(topol.is_boundary_vertex(v));
        assert!(topol.find_halfedge(v, 2u32.into()).is_some());
    }

    #[test]
    fn t_split_at_midpoint_on_grid() {
        let mut mesh = primitive::grid(2, 2, 1.0).expect("Cannot create grid");
        let nfaces = mesh.num_faces();
        let mut splits = 0;
        // Split every original edge once.
        for e in mesh.edges().collect::<Vec<_>>() {
            let boundary = mesh.is_boundary_edge(e);
            let mid = mesh.calc_edge_midpoint(e);
            let v = mesh.split_edge_at_midpoint(e);
            assert_eq!(mesh.point(v), mid);
            assert_eq!(mesh.topology().is_boundary_vertex(v), boundary);
            splits += if boundary { 1 } else { 2 };
        }
        mesh.check_topology().expect("Topology is broken after splits");
        assert_eq!(mesh.num_faces(), nfaces + splits);
        assert!(mesh.faces().all(|f| mesh.face_valence(f) == 3));
    }
}
