/*!
Quadric error decimation, used to generate a layout from a target mesh.

The halfedge mesh only ever grows, so the collapses are done on a compact
triangle list and the surviving triangles are assembled into a new
[`PolyMesh`] at the end. Collapses are halfedge collapses: the surviving vertex
keeps its position, so every layout vertex sits exactly on a target vertex.
*/

use glam::DVec3;

use crate::{
    element::{Handle, VH},
    error::Error,
    mesh::PolyMesh,
};
use heap::Heap;
use quadric::Quadric;

mod heap;
mod quadric;

struct Triangles {
    points: Vec<DVec3>,
    faces: Vec<[usize; 3]>,
    face_alive: Vec<bool>,
    vertex_alive: Vec<bool>,
    // Incident faces, including the ones that were deleted since.
    vertex_faces: Vec<Vec<usize>>,
    quadrics: Vec<Quadric>,
}

fn face_normal(points: &[DVec3], [a, b, c]: [usize; 3]) -> DVec3 {
    (points[b] - points[a]).cross(points[c] - points[a])
}

impl Triangles {
    fn from_mesh(mesh: &PolyMesh) -> Result<Self, Error> {
        let points: Vec<DVec3> = mesh.vertices().map(|v| mesh.point(v)).collect();
        let mut faces = Vec::with_capacity(mesh.num_faces());
        let mut vertex_faces = vec![Vec::new(); mesh.num_vertices()];
        for f in mesh.faces() {
            let mut verts = mesh.fv_ccw_iter(f).map(|v| v.index() as usize);
            let tri = match (verts.next(), verts.next(), verts.next(), verts.next()) {
                (Some(a), Some(b), Some(c), None) => [a, b, c],
                _ => return Err(Error::NonTriangleFace(f)),
            };
            for v in tri {
                vertex_faces[v].push(faces.len());
            }
            faces.push(tri);
        }
        let quadrics = vertex_faces
            .iter()
            .enumerate()
            .map(|(v, vfaces)| {
                vfaces.iter().fold(Quadric::default(), |q, fi| {
                    q + Quadric::plane(
                        points[v],
                        face_normal(&points, faces[*fi]).normalize_or_zero(),
                    )
                })
            })
            .collect();
        Ok(Triangles {
            face_alive: vec![true; faces.len()],
            vertex_alive: vec![true; points.len()],
            points,
            faces,
            vertex_faces,
            quadrics,
        })
    }

    fn faces_of(&self, v: usize) -> impl Iterator<Item = usize> + use<'_> {
        self.vertex_faces[v]
            .iter()
            .copied()
            .filter(|fi| self.face_alive[*fi])
    }

    fn neighbours(&self, v: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .faces_of(v)
            .flat_map(|fi| self.faces[fi])
            .filter(|u| *u != v)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn num_edge_faces(&self, a: usize, b: usize) -> usize {
        self.faces_of(a)
            .filter(|fi| self.faces[*fi].contains(&b))
            .count()
    }

    fn is_boundary_vertex(&self, v: usize) -> bool {
        self.neighbours(v)
            .into_iter()
            .any(|u| self.num_edge_faces(v, u) == 1)
    }

    /// Whether `v0` can be merged into `v1` without changing the topology of
    /// the surface, or flipping any of the remaining triangles.
    fn is_collapse_legal(&self, v0: usize, v1: usize) -> bool {
        if self.faces_of(v0).take(2).count() < 2 {
            return false;
        }
        let nshared = self.num_edge_faces(v0, v1);
        if nshared == 0 || nshared > 2 {
            return false;
        }
        // Boundary vertices only slide along the boundary.
        if nshared == 2 && self.is_boundary_vertex(v0) {
            return false;
        }
        // Link condition.
        let n1 = self.neighbours(v1);
        let ncommon = self
            .neighbours(v0)
            .into_iter()
            .filter(|u| n1.binary_search(u).is_ok())
            .count();
        if ncommon != nshared {
            return false;
        }
        let p1 = self.points[v1];
        self.faces_of(v0)
            .filter(|fi| !self.faces[*fi].contains(&v1))
            .all(|fi| {
                let tri = self.faces[fi];
                let before = face_normal(&self.points, tri);
                let moved = tri.map(|v| if v == v0 { p1 } else { self.points[v] });
                let after = (moved[1] - moved[0]).cross(moved[2] - moved[0]);
                after.length_squared() > f64::EPSILON * before.length_squared()
                    && after.dot(before) > 0.0
            })
    }

    fn collapse_cost(&self, v0: usize, v1: usize) -> f64 {
        (self.quadrics[v0] + self.quadrics[v1]).residual(self.points[v1])
    }

    fn collapse(&mut self, v0: usize, v1: usize) {
        let faces: Vec<usize> = self.faces_of(v0).collect();
        for fi in faces {
            if self.faces[fi].contains(&v1) {
                self.face_alive[fi] = false;
            } else {
                for v in self.faces[fi].iter_mut().filter(|v| **v == v0) {
                    *v = v1;
                }
                self.vertex_faces[v1].push(fi);
            }
        }
        self.vertex_faces[v0].clear();
        self.vertex_alive[v0] = false;
        let q0 = self.quadrics[v0];
        self.quadrics[v1] += q0;
    }

    /// Queue the cheapest collapse out of `v`, or drop `v` from the queue if it
    /// has none.
    fn queue_vertex_collapse(&self, v: usize, heap: &mut Heap<(f64, usize)>) {
        match self
            .neighbours(v)
            .into_iter()
            .map(|u| (self.collapse_cost(v, u), u))
            .fold(None, |best: Option<(f64, usize)>, (cost, u)| match best {
                Some((bc, _)) if bc <= cost => best,
                _ => Some((cost, u)),
            }) {
            Some(entry) => heap.set(v, entry),
            None => heap.remove(v),
        }
    }

    fn into_mesh(self) -> Result<PolyMesh, Error> {
        let mut new_index: Vec<Option<VH>> = vec![None; self.points.len()];
        let mut mesh = PolyMesh::new();
        for (v, pos) in self.points.iter().enumerate() {
            if self.vertex_alive[v] && self.faces_of(v).next().is_some() {
                new_index[v] = Some(mesh.add_vertex(*pos));
            }
        }
        for (tri, _) in self
            .faces
            .iter()
            .zip(self.face_alive.iter())
            .filter(|(_, alive)| **alive)
        {
            let [a, b, c] = (*tri).map(|v| new_index[v]);
            if let (Some(a), Some(b), Some(c)) = (a, b, c) {
                mesh.add_tri_face(a, b, c)?;
            }
        }
        Ok(mesh)
    }
}

/// Decimate a copy of the triangle mesh `target` down to `n_vertices`
/// vertices, collapsing the halfedges with the smallest quadric error first.
///
/// The vertex count of the result can stay above `n_vertices` when no further
/// collapse is possible without changing the topology or folding triangles
/// over.
pub fn make_layout_by_decimation(target: &PolyMesh, n_vertices: usize) -> Result<PolyMesh, Error> {
    let mut tris = Triangles::from_mesh(target)?;
    let mut heap = Heap::new(tris.points.len());
    for v in 0..tris.points.len() {
        tris.queue_vertex_collapse(v, &mut heap);
    }
    let mut nv = tris.points.len();
    let mut ncollapses = 0usize;
    while nv > n_vertices {
        let Some((v0, (_, v1))) = heap.pop() else {
            break;
        };
        if !tris.is_collapse_legal(v0, v1) {
            continue;
        }
        tris.collapse(v0, v1);
        (nv, ncollapses) = (nv - 1, ncollapses + 1);
        tris.queue_vertex_collapse(v1, &mut heap);
        for u in tris.neighbours(v1) {
            tris.queue_vertex_collapse(u, &mut heap);
        }
    }
    log::debug!(
        "Decimated {} vertices down to {} with {} collapses",
        target.num_vertices(),
        nv,
        ncollapses
    );
    tris.into_mesh()
}

#[cfg(test)]
mod test {
    use glam::DVec3;

    use crate::{
        element::{Handle, VH},
        mesh::PolyMesh,
        primitive,
    };

    use super::make_layout_by_decimation;

    fn euler_characteristic(mesh: &PolyMesh) -> i64 {
        mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64
    }

    #[test]
    fn t_decimate_grid() {
        let target = primitive::grid(4, 4, 1.0).expect("Cannot create grid");
        let layout = make_layout_by_decimation(&target, 16).expect("Cannot decimate");
        assert_eq!(layout.num_vertices(), 16);
        layout.check_topology().expect("Topological errors found");
        assert_eq!(euler_characteristic(&layout), 1);
        assert!(layout.faces().all(|f| layout.face_valence(f) == 3));
        // Vertices keep their positions.
        for v in layout.vertices() {
            let p = layout.point(v);
            assert!(target.vertices().any(|t_v| target.point(t_v) == p));
        }
    }

    #[test]
    fn t_decimate_keeps_spike() {
        // A single raised vertex is expensive to remove, the flat ones are free.
        let mut target = primitive::grid(4, 2, 1.0).expect("Cannot create grid");
        let spike = VH::from(7u32);
        target.set_point(spike, DVec3::new(2.0, 1.0, 1.0));
        let layout = make_layout_by_decimation(&target, 12).expect("Cannot decimate");
        assert_eq!(layout.num_vertices(), 12);
        layout.check_topology().expect("Topological errors found");
        assert_eq!(euler_characteristic(&layout), 1);
        assert!(layout.vertices().any(|v| layout.point(v).z == 1.0));
    }

    #[test]
    fn t_decimate_closed_mesh() {
        let target = primitive::octahedron().expect("Cannot create octahedron");
        let layout = make_layout_by_decimation(&target, 100).expect("Cannot decimate");
        assert_eq!(layout.num_vertices(), 6);
        assert_eq!(layout.num_faces(), 8);
        assert_eq!(euler_characteristic(&layout), 2);
        assert!(
            layout
                .vertices()
                .all(|v| layout.point(v) == target.point(v.index().into()))
        );
    }

    #[test]
    fn t_decimate_rejects_polygons() {
        let quad = primitive::quad([DVec3::ZERO, DVec3::X, DVec3::ONE, DVec3::Y])
            .expect("Cannot create quad");
        assert!(matches!(
            make_layout_by_decimation(&quad, 3),
            Err(crate::error::Error::NonTriangleFace(_))
        ));
    }
}
