/*!
Small meshes used as layouts and as targets in tests and benchmarks.
*/

use glam::DVec3;

use crate::{element::VH, error::Error, mesh::PolyMesh};

/// Single triangle with the given corners, in counter-clockwise order.
pub fn triangle(corners: [DVec3; 3]) -> Result<PolyMesh, Error> {
    let mut mesh = PolyMesh::with_capacity(3, 3, 1);
    let vs = mesh.add_vertices(&corners);
    mesh.add_tri_face(vs[0], vs[1], vs[2])?;
    Ok(mesh)
}

/// Single quad with the given corners, in counter-clockwise order.
pub fn quad(corners: [DVec3; 4]) -> Result<PolyMesh, Error> {
    let mut mesh = PolyMesh::with_capacity(4, 4, 1);
    let vs = mesh.add_vertices(&corners);
    mesh.add_quad_face(vs[0], vs[1], vs[2], vs[3])?;
    Ok(mesh)
}

/// Regular triangulated grid in the XY plane with `nx` by `ny` cells, each of
/// them `size` wide.
///
/// The vertex at column `i` and row `j` is at `(i * size, j * size, 0)` and
/// has index `j * (nx + 1) + i`. Every cell is split along the diagonal from
/// its lower left to its upper right corner.
///
/// ```text
///   6----7----8
///   |  / |  / |
///   | /  | /  |
///   3----4----5
///   |  / |  / |
///   | /  | /  |
///   0----1----2
/// ```
pub fn grid(nx: usize, ny: usize, size: f64) -> Result<PolyMesh, Error> {
    let stride = nx + 1;
    let nverts = stride * (ny + 1);
    let nfaces = nx * ny * 2;
    let mut mesh = PolyMesh::with_capacity(nverts, nverts + nfaces, nfaces);
    for j in 0..=ny {
        for i in 0..=nx {
            mesh.add_vertex(DVec3::new(i as f64 * size, j as f64 * size, 0.0));
        }
    }
    let vh = |i: usize, j: usize| -> VH { (j * stride + i).into() };
    for j in 0..ny {
        for i in 0..nx {
            mesh.add_tri_face(vh(i, j), vh(i + 1, j), vh(i + 1, j + 1))?;
            mesh.add_tri_face(vh(i, j), vh(i + 1, j + 1), vh(i, j + 1))?;
        }
    }
    Ok(mesh)
}

/// Regular tetrahedron inscribed in the cube from `(-1, -1, -1)` to
/// `(1, 1, 1)`, with outward facing triangles.
pub fn tetrahedron() -> Result<PolyMesh, Error> {
    const FACES: [[u32; 3]; 4] = [[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]];
    let mut mesh = PolyMesh::with_capacity(4, 6, 4);
    mesh.add_vertices(&[
        DVec3::new(1.0, 1.0, 1.0),
        DVec3::new(1.0, -1.0, -1.0),
        DVec3::new(-1.0, 1.0, -1.0),
        DVec3::new(-1.0, -1.0, 1.0),
    ]);
    for [a, b, c] in FACES {
        mesh.add_tri_face(a.into(), b.into(), c.into())?;
    }
    Ok(mesh)
}

/// Octahedron with its vertices on the unit axes, with outward facing
/// triangles.
pub fn octahedron() -> Result<PolyMesh, Error> {
    const FACES: [[u32; 3]; 8] = [
        [0, 1, 4],
        [1, 2, 4],
        [2, 3, 4],
        [3, 0, 4],
        [1, 0, 5],
        [2, 1, 5],
        [3, 2, 5],
        [0, 3, 5],
    ];
    let mut mesh = PolyMesh::with_capacity(6, 12, 8);
    mesh.add_vertices(&[
        DVec3::X,
        DVec3::Y,
        DVec3::NEG_X,
        DVec3::NEG_Y,
        DVec3::Z,
        DVec3::NEG_Z,
    ]);
    for [a, b, c] in FACES {
        mesh.add_tri_face(a.into(), b.into(), c.into())?;
    }
    Ok(mesh)
}
