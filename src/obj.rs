use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use glam::DVec3;

use crate::{
    element::VH,
    error::Error,
    mesh::PolyMesh,
    property::VProperty,
};

impl PolyMesh {
    /// Load all models in the OBJ file into one mesh.
    pub fn load_obj(path: &Path) -> Result<Self, Error> {
        let options = tobj::LoadOptions::default();
        let (models, _) =
            tobj::load_obj(path, &options).map_err(|e| Error::ObjLoadFailed(format!("{}", e)))?;
        let (nverts, nfaces) = models
            .iter()
            .fold((0usize, 0usize), |(nverts, nfaces), model| {
                let msh = &model.mesh;
                let nf = if msh.face_arities.is_empty() {
                    msh.indices.len() / 3
                } else {
                    msh.face_arities.len()
                };
                (nverts + (msh.positions.len() / 3), nfaces + nf)
            });
        let nedges = nfaces * 3 / 2; // Estimate.
        let mut outmesh = PolyMesh::with_capacity(nverts, nedges, nfaces);
        let mut voffset = 0u32;
        let mut positions = Vec::new();
        let mut fvs = Vec::new();
        for model in models {
            let mesh = model.mesh;
            if mesh.positions.len() % 3 != 0 {
                return Err(Error::IncorrectNumberOfCoordinates(mesh.positions.len()));
            }
            let nverts = (mesh.positions.len() / 3) as u32;
            positions.clear();
            positions.extend(
                mesh.positions
                    .chunks(3)
                    .map(|triplet| DVec3::new(triplet[0], triplet[1], triplet[2])),
            );
            outmesh.add_vertices(&positions);
            // Arities are left empty when every face is a triangle.
            let arities: Vec<usize> = if mesh.face_arities.is_empty() {
                vec![3; mesh.indices.len() / 3]
            } else {
                mesh.face_arities.iter().map(|a| *a as usize).collect()
            };
            let mut start = 0usize;
            for size in arities {
                let indices = &mesh.indices[start..(start + size)];
                start += size;
                fvs.clear();
                fvs.extend(indices.iter().map(|i| -> VH { (i + voffset).into() }));
                outmesh.add_face(&fvs)?;
            }
            voffset += nverts;
        }
        log::debug!(
            "Loaded {} vertices and {} faces from {}",
            outmesh.num_vertices(),
            outmesh.num_faces(),
            path.display()
        );
        Ok(outmesh)
    }

    /// The order in which a reader meets the vertices when walking the faces
    /// written by [`PolyMesh::write_obj`], followed by the vertices that no
    /// face uses. OBJ loaders that number vertices by first use, such as
    /// [`PolyMesh::load_obj`], give `obj_vertex_order()[i]` the index `i`.
    pub fn obj_vertex_order(&self) -> Vec<VH> {
        let mut seen = VProperty::new(self.num_vertices(), false);
        let mut order = Vec::with_capacity(self.num_vertices());
        for f in self.faces() {
            for v in self.fv_ccw_iter(f) {
                if !std::mem::replace(&mut seen[v], true) {
                    order.push(v);
                }
            }
        }
        order.extend(self.vertices().filter(|v| !seen[*v]));
        order
    }

    /// Inverse of [`PolyMesh::obj_vertex_order`]: the zero based index of every
    /// vertex in the OBJ file.
    pub(crate) fn obj_vertex_indices(&self) -> VProperty<u32> {
        let mut indices = VProperty::new(self.num_vertices(), 0u32);
        for (i, v) in self.obj_vertex_order().into_iter().enumerate() {
            indices[v] = i as u32;
        }
        indices
    }

    /// Write the mesh as an OBJ file, with vertex positions and polygon faces.
    /// Vertices are written in [`PolyMesh::obj_vertex_order`], so that loading
    /// the file again numbers them in the same order.
    pub fn write_obj(&self, path: &Path) -> Result<(), Error> {
        let mut out = BufWriter::new(File::create(path)?);
        let order = self.obj_vertex_order();
        let indices = self.obj_vertex_indices();
        for v in order {
            let p = self.point(v);
            writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
        }
        for f in self.faces() {
            write!(out, "f")?;
            for v in self.fv_ccw_iter(f) {
                write!(out, " {}", indices[v] + 1)?;
            }
            writeln!(out)?;
        }
        out.flush()?;
        Ok(())
    }
}
