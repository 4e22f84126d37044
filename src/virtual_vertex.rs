use std::ops::{Index, IndexMut};

use glam::DVec3;

use crate::{
    element::{EH, VH},
    mesh::PolyMesh,
    property::{EProperty, VProperty},
};

/// Node of the path search graph. Either a vertex of the target mesh, or the
/// midpoint of one of its edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VirtualVertex {
    Vertex(VH),
    Edge(EH),
}

/// Sequence of virtual vertices. The first and the last entries of a path are
/// always real vertices.
pub type VirtualPath = Vec<VirtualVertex>;

impl From<VH> for VirtualVertex {
    fn from(v: VH) -> Self {
        VirtualVertex::Vertex(v)
    }
}

impl From<EH> for VirtualVertex {
    fn from(e: EH) -> Self {
        VirtualVertex::Edge(e)
    }
}

impl VirtualVertex {
    pub fn is_real_vertex(&self) -> bool {
        matches!(self, VirtualVertex::Vertex(_))
    }

    pub fn is_real_edge(&self) -> bool {
        matches!(self, VirtualVertex::Edge(_))
    }

    pub fn real_vertex(&self) -> Option<VH> {
        match self {
            VirtualVertex::Vertex(v) => Some(*v),
            VirtualVertex::Edge(_) => None,
        }
    }

    pub fn real_edge(&self) -> Option<EH> {
        match self {
            VirtualVertex::Vertex(_) => None,
            VirtualVertex::Edge(e) => Some(*e),
        }
    }

    /// Position of the vertex, or the midpoint of the edge.
    pub fn position(&self, mesh: &PolyMesh) -> DVec3 {
        match self {
            VirtualVertex::Vertex(v) => mesh.point(*v),
            VirtualVertex::Edge(e) => mesh.calc_edge_midpoint(*e),
        }
    }
}

/// The virtual vertices surrounding `v` in clockwise order: every adjacent
/// vertex, followed by the far edge of the triangle between it and the next
/// adjacent vertex. Boundary gaps have no edge.
pub(crate) fn virtual_ring_cw(mesh: &PolyMesh, v: VH) -> Vec<VirtualVertex> {
    let mut ring = Vec::new();
    for h in mesh.voh_cw_iter(v) {
        ring.push(VirtualVertex::Vertex(h.head(mesh)));
        if h.opposite().face(mesh).is_some() {
            ring.push(VirtualVertex::Edge(h.rotate_cw(mesh).next(mesh).edge()));
        }
    }
    ring
}

/// Values for every vertex and every edge of a mesh, indexed by virtual
/// vertices.
#[derive(Clone, Debug)]
pub struct VirtualVertexProperty<T: Clone> {
    vertex: VProperty<T>,
    edge: EProperty<T>,
}

impl<T: Clone> VirtualVertexProperty<T> {
    pub fn new(mesh: &PolyMesh, default: T) -> Self {
        VirtualVertexProperty {
            vertex: VProperty::new(mesh.num_vertices(), default.clone()),
            edge: EProperty::new(mesh.num_edges(), default),
        }
    }
}

impl<T: Clone> Index<VirtualVertex> for VirtualVertexProperty<T> {
    type Output = T;

    fn index(&self, vv: VirtualVertex) -> &Self::Output {
        match vv {
            VirtualVertex::Vertex(v) => &self.vertex[v],
            VirtualVertex::Edge(e) => &self.edge[e],
        }
    }
}

impl<T: Clone> IndexMut<VirtualVertex> for VirtualVertexProperty<T> {
    fn index_mut(&mut self, vv: VirtualVertex) -> &mut Self::Output {
        match vv {
            VirtualVertex::Vertex(v) => &mut self.vertex[v],
            VirtualVertex::Edge(e) => &mut self.edge[e],
        }
    }
}
